//! 根场景嫁接
//!
//! 把解码器标记的根场景实例化后挂到舞台根节点下。每个会话至多一次：
//! `Idle → Grafting → Grafted`。

use bevy_ecs::entity::Entity;

use crate::core::error::{DispatchError, DispatchResult};
use crate::display::{ConstructorReport, DisplayEventKind, DisplayTemplate};
use crate::domain::SessionRef;

/// 嫁接状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraftState {
    #[default]
    Idle,
    Grafting,
    Grafted { content: Entity },
}

/// 一次嫁接请求的结果
#[derive(Debug, Clone)]
pub enum GraftResult {
    Grafted {
        content: Entity,
        report: ConstructorReport,
    },
    /// 已经嫁接过根场景，本次请求没有任何挂载副作用
    Duplicate,
}

/// 根场景嫁接状态机
#[derive(Debug, Default)]
pub struct RootSceneGraft {
    state: GraftState,
}

impl RootSceneGraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GraftState {
        self.state
    }

    /// 已嫁接的根内容
    pub fn content(&self) -> Option<Entity> {
        match self.state {
            GraftState::Grafted { content } => Some(content),
            GraftState::Idle | GraftState::Grafting => None,
        }
    }

    pub fn graft(
        &mut self,
        template: &DisplayTemplate,
        session: &SessionRef,
    ) -> DispatchResult<GraftResult> {
        if self.state != GraftState::Idle {
            tracing::error!(
                target: "assets",
                "Root scene {} offered after the root was already grafted",
                template.name
            );
            return Ok(GraftResult::Duplicate);
        }

        let (stage, domain, loader_info) = {
            let session = session.borrow();
            match (&session.stage, &session.domain) {
                (Some(stage), Some(domain)) => {
                    (stage.clone(), domain.clone(), session.loader_info.clone())
                }
                _ => return Err(DispatchError::DomainNotReady(template.name.clone())),
            }
        };

        self.state = GraftState::Grafting;
        let mut stage = stage.borrow_mut();
        let stage_root = stage.root();
        let tree = stage.tree_mut();

        let content = tree.instantiate(template);
        if let Some(info) = loader_info {
            tree.stamp_loader_info(content, info);
        }
        tree.reset_subtree(content);
        if let Some(mut timeline) = tree.timeline_mut(content) {
            timeline.first_frame_on_start = true;
        }

        let constructors_allowed = {
            let mut session = session.borrow_mut();
            session.constructors_allowed = true;
            session.constructors_allowed
        };

        tree.add_child(stage_root, content);

        let report = if constructors_allowed {
            tree.run_constructors(content, |call| domain.borrow_mut().run_constructor(call))
        } else {
            ConstructorReport::default()
        };
        if !report.is_clean() {
            tracing::warn!(
                target: "assets",
                "{} of {} constructors failed while grafting {}",
                report.failures.len(),
                report.executed,
                template.name
            );
        }

        tree.dispatch_event(content, DisplayEventKind::Added);
        tree.dispatch_added_to_stage(content, true);

        self.state = GraftState::Grafted { content };
        tracing::info!(target: "assets", "Root scene {} grafted onto stage", template.name);
        Ok(GraftResult::Grafted { content, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use std::sync::Arc;

    use crate::display::{HeadlessSurface, Stage};
    use crate::domain::{ContentSession, ExecutionDomain, LoaderInfo, RecordingExecutor};

    fn ready_session() -> (SessionRef, RecordingExecutor) {
        let executor = RecordingExecutor::new();
        let domain = ExecutionDomain::new(Box::new(executor.clone()), 10).shared();
        let stage = Stage::attach(Rc::new(HeadlessSurface::new(550, 400)));
        domain.borrow_mut().set_stage(stage.clone());

        let session = ContentSession::shared();
        {
            let mut s = session.borrow_mut();
            s.loader_info = Some(Arc::new(LoaderInfo {
                url: "file:///movie.swf".to_string(),
                content_version: 10,
            }));
            s.domain = Some(domain);
            s.stage = Some(stage);
        }
        (session, executor)
    }

    fn scene() -> DisplayTemplate {
        DisplayTemplate::new("Scene 1")
            .with_frames(5)
            .with_constructor("root()")
            .with_child(DisplayTemplate::new("hero").with_constructor("hero()"))
    }

    #[test]
    fn test_graft_attaches_and_constructs() {
        let (session, executor) = ready_session();
        let mut graft = RootSceneGraft::new();

        let GraftResult::Grafted { content, report } = graft.graft(&scene(), &session).unwrap()
        else {
            panic!("expected graft");
        };
        assert_eq!(graft.state(), GraftState::Grafted { content });
        assert_eq!(report.executed, 2);
        assert_eq!(executor.log(), vec!["construct hero", "construct Scene 1"]);
        assert!(session.borrow().constructors_allowed);

        let session = session.borrow();
        let stage = session.stage.as_ref().unwrap().borrow();
        let tree = stage.tree();
        assert_eq!(tree.children(stage.root()), vec![content]);
        assert!(tree.timeline(content).unwrap().first_frame_on_start);
        assert_eq!(tree.loader_info(content).unwrap().url, "file:///movie.swf");

        let kinds: Vec<_> = tree.events().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DisplayEventKind::Added,
                DisplayEventKind::AddedToStage,
                DisplayEventKind::AddedToStage,
            ]
        );
    }

    #[test]
    fn test_second_graft_has_no_side_effects() {
        let (session, executor) = ready_session();
        let mut graft = RootSceneGraft::new();
        graft.graft(&scene(), &session).unwrap();
        let log_len = executor.log().len();

        assert!(matches!(
            graft.graft(&scene(), &session).unwrap(),
            GraftResult::Duplicate
        ));
        assert_eq!(executor.log().len(), log_len);

        let session = session.borrow();
        let stage = session.stage.as_ref().unwrap().borrow();
        assert_eq!(stage.tree().children(stage.root()).len(), 1);
    }

    #[test]
    fn test_graft_requires_published_domain() {
        let session = ContentSession::shared();
        let mut graft = RootSceneGraft::new();
        assert!(matches!(
            graft.graft(&scene(), &session),
            Err(DispatchError::DomainNotReady(_))
        ));
        assert_eq!(graft.state(), GraftState::Idle);
    }
}
