//! 播放器入口
//!
//! 宿主面对的外观：启动引导、分发解码后的资源、转发帧与尺寸回调。

use std::rc::Rc;

use bevy_ecs::entity::Entity;

use crate::assets::{AssetDispatcher, DecodedAsset, DispatchOutcome};
use crate::bootstrap::{
    BootstrapOrchestrator, CancelToken, ContentFactory, EnvironmentInfo, LibraryFlags,
};
use crate::config::BootstrapConfig;
use crate::display::{FrameTick, StageRef};
use crate::domain::{ContentSession, ModuleExecutor, SessionRef};
use crate::resources::ResourceFetcher;

use super::error::{BootstrapResult, DispatchResult};

/// 播放器
///
/// 一个 `Player` 对应一个内容会话：一次引导、一个执行域、至多一次根场景嫁接。
///
/// # 示例
///
/// ```no_run
/// use std::rc::Rc;
///
/// use player_runtime::bootstrap::{EnvironmentInfo, LibraryFlags};
/// use player_runtime::config::BootstrapConfig;
/// use player_runtime::core::Player;
/// use player_runtime::display::HeadlessSurface;
/// use player_runtime::resources::FileSystemFetcher;
/// use player_runtime::scripting::QuickJsExecutor;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let config = BootstrapConfig::default();
/// let fetcher = Rc::new(FileSystemFetcher::new(config.asset_root.clone()));
/// let mut player = Player::new(fetcher, config, Box::new(QuickJsExecutor::new()?));
///
/// let env = EnvironmentInfo {
///     url: "file:///movie.swf".to_string(),
///     content_version: 10,
///     surface: Rc::new(HeadlessSurface::new(550, 400)),
/// };
/// let _factory = player
///     .begin_bootstrap(env, LibraryFlags::BUILTIN | LibraryFlags::PLAYERGLOBAL)
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct Player {
    session: SessionRef,
    orchestrator: BootstrapOrchestrator,
    dispatcher: AssetDispatcher,
    factory: Option<ContentFactory>,
}

impl Player {
    pub fn new(
        fetcher: Rc<dyn ResourceFetcher>,
        config: BootstrapConfig,
        executor: Box<dyn ModuleExecutor>,
    ) -> Self {
        let session = ContentSession::shared();
        Self {
            orchestrator: BootstrapOrchestrator::new(fetcher, config, session.clone(), executor),
            dispatcher: AssetDispatcher::new(session.clone()),
            session,
            factory: None,
        }
    }

    pub fn with_cancel(self, cancel: CancelToken) -> Self {
        Self {
            orchestrator: self.orchestrator.with_cancel(cancel),
            ..self
        }
    }

    /// 引导执行域；成功且加载了平台 API 库时返回内容工厂
    pub async fn begin_bootstrap(
        &mut self,
        env: EnvironmentInfo,
        flags: LibraryFlags,
    ) -> BootstrapResult<Option<ContentFactory>> {
        let factory = self.orchestrator.begin_bootstrap(env, flags).await?;
        self.factory = factory.clone();
        Ok(factory)
    }

    /// 分发一个解码后的资源
    pub fn dispatch(
        &mut self,
        asset: DecodedAsset,
        is_root_candidate: bool,
    ) -> DispatchResult<DispatchOutcome> {
        self.dispatcher.dispatch(asset, is_root_candidate)
    }

    /// 帧回调；舞台不存在时不做任何事
    ///
    /// 返回的 `FrameTick` 带走舞台上积累的显示事件。
    pub fn on_frame_tick(&self) -> Option<FrameTick> {
        let stage = self.stage()?;
        let tick = stage.borrow_mut().enter_frame();
        Some(tick)
    }

    /// 尺寸回调；舞台不存在时不做任何事
    pub fn on_resize(&self) -> bool {
        match self.stage() {
            Some(stage) => stage.borrow_mut().resize_callback(),
            None => false,
        }
    }

    pub fn stage(&self) -> Option<StageRef> {
        self.session.borrow().stage.clone()
    }

    /// 已嫁接到舞台上的根内容
    pub fn content(&self) -> Option<Entity> {
        self.dispatcher.root_content()
    }

    pub fn factory(&self) -> Option<&ContentFactory> {
        self.factory.as_ref()
    }

    pub fn session(&self) -> &SessionRef {
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::DispatchError;
    use crate::display::HeadlessSurface;
    use crate::domain::RecordingExecutor;
    use crate::resources::MemoryFetcher;

    fn player() -> Player {
        let fetcher = MemoryFetcher::new().with_binary("builtins/builtin.abc", b"builtin".to_vec());
        Player::new(
            Rc::new(fetcher),
            BootstrapConfig::default(),
            Box::new(RecordingExecutor::new()),
        )
    }

    #[test]
    fn test_callbacks_are_noops_before_bootstrap() {
        let player = player();
        assert!(player.on_frame_tick().is_none());
        assert!(!player.on_resize());
        assert!(player.stage().is_none());
        assert!(player.content().is_none());
    }

    #[tokio::test]
    async fn test_builtin_only_bootstrap_keeps_dispatch_closed() {
        let mut player = player();
        let env = EnvironmentInfo {
            url: "file:///movie.swf".to_string(),
            content_version: 10,
            surface: Rc::new(HeadlessSurface::new(550, 400)),
        };
        let factory = player
            .begin_bootstrap(env, LibraryFlags::BUILTIN)
            .await
            .unwrap();
        assert!(factory.is_none());
        assert!(player.factory().is_none());

        let asset = DecodedAsset::root_scene(
            "Scene 1",
            crate::display::DisplayTemplate::new("Scene 1"),
        );
        assert_eq!(
            player.dispatch(asset, true).unwrap_err(),
            DispatchError::DomainNotReady("Scene 1".to_string())
        );
    }
}
