//! 引导编排器
//!
//! 按固定顺序创建执行域：基础模块 → 平台 API 目录 → 附加模块 → 发布。
//! 只有所有必需阶段都成功后，执行域、舞台和加载信息才会写入会话。

use std::cell::RefCell;
use std::ops::BitOr;
use std::rc::Rc;
use std::sync::Arc;

use futures::future::try_join;

use crate::config::BootstrapConfig;
use crate::core::error::{BootstrapError, BootstrapResult, BootstrapStage, FetchError};
use crate::display::{RenderSurface, Stage};
use crate::domain::{
    ApplicationDomain, Catalog, ExecutionDomain, LoaderContext, LoaderInfo, ModuleEnv,
    ModuleExecutor, SessionRef,
};
use crate::resources::{FetchedResource, LoadRequest, ResourceFetcher};

use super::cancel::CancelToken;
use super::factory::ContentFactory;

const BUILTIN_ORIGIN: &str = "builtin.abc";
const SHELL_ORIGIN: &str = "avmplus.abc";

/// 需要加载的系统库
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LibraryFlags(u8);

impl LibraryFlags {
    pub const NONE: LibraryFlags = LibraryFlags(0);
    /// 基础库（必需）
    pub const BUILTIN: LibraryFlags = LibraryFlags(1);
    /// 平台 API 库
    pub const PLAYERGLOBAL: LibraryFlags = LibraryFlags(1 << 1);

    pub fn contains(self, other: LibraryFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for LibraryFlags {
    type Output = LibraryFlags;

    fn bitor(self, rhs: LibraryFlags) -> LibraryFlags {
        LibraryFlags(self.0 | rhs.0)
    }
}

/// 宿主环境
#[derive(Clone)]
pub struct EnvironmentInfo {
    pub url: String,
    pub content_version: u8,
    pub surface: Rc<dyn RenderSurface>,
}

impl std::fmt::Debug for EnvironmentInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentInfo")
            .field("url", &self.url)
            .field("content_version", &self.content_version)
            .field("viewport", &self.surface.viewport())
            .finish()
    }
}

/// 引导编排器
///
/// 每个编排器只创建一个执行域；执行器在第一次引导时被取走。
pub struct BootstrapOrchestrator {
    fetcher: Rc<dyn ResourceFetcher>,
    config: BootstrapConfig,
    session: SessionRef,
    executor: RefCell<Option<Box<dyn ModuleExecutor>>>,
    cancel: CancelToken,
}

impl BootstrapOrchestrator {
    pub fn new(
        fetcher: Rc<dyn ResourceFetcher>,
        config: BootstrapConfig,
        session: SessionRef,
        executor: Box<dyn ModuleExecutor>,
    ) -> Self {
        Self {
            fetcher,
            config,
            session,
            executor: RefCell::new(Some(executor)),
            cancel: CancelToken::never(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn session(&self) -> &SessionRef {
        &self.session
    }

    pub async fn begin_bootstrap(
        &self,
        env: EnvironmentInfo,
        flags: LibraryFlags,
    ) -> BootstrapResult<Option<ContentFactory>> {
        if !flags.contains(LibraryFlags::BUILTIN) {
            return Err(BootstrapError::InvariantViolation(
                "the builtin library is mandatory".to_string(),
            ));
        }
        if self.session.borrow().is_ready() {
            return Err(BootstrapError::InvariantViolation(
                "session already has an execution domain".to_string(),
            ));
        }
        let executor = self.executor.borrow_mut().take().ok_or_else(|| {
            BootstrapError::InvariantViolation("bootstrap already started".to_string())
        })?;

        tracing::info!(
            target: "bootstrap",
            "Bootstrapping {} (content version {}, flags {:#04b})",
            env.url,
            env.content_version,
            flags.bits()
        );

        // baseline
        let stage = BootstrapStage::Baseline;
        let builtin = self
            .fetch(stage, LoadRequest::binary(&self.config.builtin))
            .await?
            .into_bytes(&self.config.builtin)
            .map_err(|e| BootstrapError::failed(stage, e))?;
        let mut domain = ExecutionDomain::new(executor, env.content_version);
        domain
            .load_and_execute(&builtin, ModuleEnv::system(BUILTIN_ORIGIN))
            .map_err(|e| BootstrapError::failed(stage, e))?;
        tracing::info!(target: "bootstrap", "Stage {} complete", stage);

        if !flags.contains(LibraryFlags::PLAYERGLOBAL) {
            tracing::info!(target: "bootstrap", "Platform library not requested, no content factory");
            return Ok(None);
        }

        // catalog
        let stage = BootstrapStage::Catalog;
        let (code, index) = try_join(
            self.fetch(stage, LoadRequest::binary(&self.config.catalog)),
            self.fetch(stage, LoadRequest::structured(&self.config.catalog_index)),
        )
        .await?;
        let code = code
            .into_bytes(&self.config.catalog)
            .map_err(|e| BootstrapError::failed(stage, e))?;
        let index = index
            .into_json(&self.config.catalog_index)
            .map_err(|e| BootstrapError::failed(stage, e))?;
        let catalog = Catalog::new(code, index).map_err(|e| BootstrapError::failed(stage, e))?;
        domain.register_catalog(catalog);
        tracing::info!(target: "bootstrap", "Stage {} complete", stage);

        // shell
        let stage = BootstrapStage::Shell;
        let shell = self
            .fetch(stage, LoadRequest::binary(&self.config.shell))
            .await?
            .into_bytes(&self.config.shell)
            .map_err(|e| BootstrapError::failed(stage, e))?;
        domain
            .load_and_execute(&shell, ModuleEnv::system(SHELL_ORIGIN))
            .map_err(|e| BootstrapError::failed(stage, e))?;
        tracing::info!(target: "bootstrap", "Stage {} complete", stage);

        // finalize
        if self.cancel.is_cancelled() {
            return Err(BootstrapError::Cancelled {
                stage: BootstrapStage::Finalize,
            });
        }
        Ok(Some(self.publish(domain, &env)))
    }

    fn publish(&self, domain: ExecutionDomain, env: &EnvironmentInfo) -> ContentFactory {
        let loader_info = Arc::new(LoaderInfo {
            url: env.url.clone(),
            content_version: env.content_version,
        });
        let domain = domain.shared();
        let application_domain = ApplicationDomain::new(domain.clone());
        let stage = Stage::attach(env.surface.clone());
        domain.borrow_mut().set_stage(stage.clone());

        let mut session = self.session.borrow_mut();
        session.active_loader_context =
            Some(LoaderContext::new(false, application_domain.clone()));
        session.application_domain = Some(application_domain);
        session.loader_info = Some(loader_info);
        session.domain = Some(domain.clone());
        session.stage = Some(stage);

        tracing::info!(target: "bootstrap", "Execution domain published for {}", env.url);
        ContentFactory::new(domain)
    }

    /// 获取单个资源：与取消令牌竞争，并受超时限制
    async fn fetch(
        &self,
        stage: BootstrapStage,
        request: LoadRequest,
    ) -> BootstrapResult<FetchedResource> {
        if self.cancel.is_cancelled() {
            return Err(BootstrapError::Cancelled { stage });
        }
        tracing::debug!(target: "bootstrap", "Fetching {} ({:?})", request.name, request.kind);

        let bounded = async {
            let fetch = self.fetcher.fetch(&request);
            match self.config.fetch_timeout() {
                Some(limit) => tokio::time::timeout(limit, fetch)
                    .await
                    .unwrap_or_else(|_| Err(FetchError::new(&request.name, "timeout"))),
                None => fetch.await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                tracing::info!(target: "bootstrap", "Bootstrap cancelled during stage {}", stage);
                Err(BootstrapError::Cancelled { stage })
            }
            result = bounded => result.map_err(|e| {
                tracing::error!(target: "bootstrap", "Failed to fetch {}: {}", e.name, e.status_text);
                BootstrapError::failed(stage, e)
            }),
        }
    }
}
