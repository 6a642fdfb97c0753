//! 显示树
//!
//! 显示对象是 ECS 世界中的实体：名称、父子关系、时间轴、待执行的构造函数
//! 和加载信息都以组件的形式挂在实体上。

use std::sync::Arc;

use bevy_ecs::prelude::*;

use crate::core::error::{ScriptError, ScriptResult};
use crate::domain::{ConstructorCall, LoaderInfo};

use super::events::{DisplayEvent, DisplayEventKind};
use super::template::DisplayTemplate;

/// 显示对象
#[derive(Component, Debug, Clone)]
pub struct DisplayNode {
    pub name: String,
}

/// 子节点（按添加顺序）
#[derive(Component, Debug, Clone, Default)]
pub struct Children(pub Vec<Entity>);

/// 父节点
#[derive(Component, Debug, Clone, Copy)]
pub struct Parent(pub Entity);

/// 尚未运行的用户构造函数
#[derive(Component, Debug, Clone)]
pub struct PendingConstructor(pub String);

/// 产生该对象的加载信息
#[derive(Component, Debug, Clone)]
pub struct LoaderInfoTag(pub Arc<LoaderInfo>);

/// 时间轴状态
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    pub current_frame: u32,
    pub total_frames: u32,
    pub playing: bool,
    /// 下一次渲染的帧是"开始帧"，不推进播放头
    pub first_frame_on_start: bool,
}

/// 一次推进的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    Start,
    Advanced(u32),
}

impl Timeline {
    pub fn new(total_frames: u32) -> Self {
        Self {
            current_frame: 0,
            total_frames: total_frames.max(1),
            playing: true,
            first_frame_on_start: false,
        }
    }

    /// 回到初始状态
    pub fn reset(&mut self) {
        self.current_frame = 0;
        self.playing = true;
        self.first_frame_on_start = false;
    }

    pub fn advance(&mut self) -> FramePhase {
        if self.first_frame_on_start {
            self.first_frame_on_start = false;
            return FramePhase::Start;
        }
        if self.playing && self.total_frames > 1 {
            self.current_frame = (self.current_frame + 1) % self.total_frames;
        }
        FramePhase::Advanced(self.current_frame)
    }
}

/// 单个构造函数的失败
#[derive(Debug, Clone)]
pub struct ConstructorFailure {
    pub target: String,
    pub error: ScriptError,
}

/// 一次递归构造的结果
#[derive(Debug, Clone, Default)]
pub struct ConstructorReport {
    pub executed: usize,
    pub failures: Vec<ConstructorFailure>,
}

impl ConstructorReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 显示树
#[derive(Debug, Default)]
pub struct DisplayTree {
    world: World,
    /// 尚未被帧回调取走的事件
    events: Vec<DisplayEvent>,
}

impl DisplayTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn_node(&mut self, name: impl Into<String>, frames: u32) -> Entity {
        self.world
            .spawn((
                DisplayNode { name: name.into() },
                Children::default(),
                Timeline::new(frames),
            ))
            .id()
    }

    /// 按模板生成一棵独立的子树，返回其根
    pub fn instantiate(&mut self, template: &DisplayTemplate) -> Entity {
        let entity = self.spawn_node(template.name.clone(), template.frames);
        if let Some(source) = &template.constructor {
            self.world
                .entity_mut(entity)
                .insert(PendingConstructor(source.clone()));
        }
        for child in &template.children {
            let child = self.instantiate(child);
            self.add_child(entity, child);
        }
        entity
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.world.get::<DisplayNode>(entity).is_some()
    }

    /// 把 `child` 挂到 `parent` 下（先从原父节点摘下）
    pub fn add_child(&mut self, parent: Entity, child: Entity) -> bool {
        if parent == child || !self.contains(parent) || !self.contains(child) {
            return false;
        }
        self.detach(child);
        if let Some(mut children) = self.world.get_mut::<Children>(parent) {
            children.0.push(child);
        }
        self.world.entity_mut(child).insert(Parent(parent));
        true
    }

    /// 从父节点摘下
    pub fn detach(&mut self, child: Entity) {
        let Some(Parent(parent)) = self.world.get::<Parent>(child).copied() else {
            return;
        };
        if let Some(mut children) = self.world.get_mut::<Children>(parent) {
            children.0.retain(|c| *c != child);
        }
        self.world.entity_mut(child).remove::<Parent>();
    }

    pub fn children(&self, entity: Entity) -> Vec<Entity> {
        self.world
            .get::<Children>(entity)
            .map(|c| c.0.clone())
            .unwrap_or_default()
    }

    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.world.get::<Parent>(entity).map(|p| p.0)
    }

    pub fn name(&self, entity: Entity) -> Option<&str> {
        self.world.get::<DisplayNode>(entity).map(|n| n.name.as_str())
    }

    /// 前序遍历（含根）
    pub fn pre_order(&self, root: Entity) -> Vec<Entity> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(entity) = stack.pop() {
            if !self.contains(entity) {
                continue;
            }
            out.push(entity);
            let children = self.children(entity);
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// 后序遍历（子节点先于父节点）
    pub fn post_order(&self, root: Entity) -> Vec<Entity> {
        let mut out = Vec::new();
        self.collect_post_order(root, &mut out);
        out
    }

    fn collect_post_order(&self, entity: Entity, out: &mut Vec<Entity>) {
        if !self.contains(entity) {
            return;
        }
        for child in self.children(entity) {
            self.collect_post_order(child, out);
        }
        out.push(entity);
    }

    pub fn stamp_loader_info(&mut self, entity: Entity, info: Arc<LoaderInfo>) {
        if self.contains(entity) {
            self.world.entity_mut(entity).insert(LoaderInfoTag(info));
        }
    }

    pub fn loader_info(&self, entity: Entity) -> Option<Arc<LoaderInfo>> {
        self.world.get::<LoaderInfoTag>(entity).map(|t| t.0.clone())
    }

    pub fn timeline(&self, entity: Entity) -> Option<&Timeline> {
        self.world.get::<Timeline>(entity)
    }

    pub fn timeline_mut(&mut self, entity: Entity) -> Option<Mut<'_, Timeline>> {
        self.world.get_mut::<Timeline>(entity)
    }

    /// 把整棵子树的时间轴恢复到初始状态
    pub fn reset_subtree(&mut self, root: Entity) {
        for entity in self.pre_order(root) {
            if let Some(mut timeline) = self.world.get_mut::<Timeline>(entity) {
                timeline.reset();
            }
        }
    }

    pub fn has_pending_constructor(&self, entity: Entity) -> bool {
        self.world.get::<PendingConstructor>(entity).is_some()
    }

    /// 递归运行子树上待执行的构造函数
    ///
    /// 每个构造函数只运行一次。单个失败会被记录，不会阻止其余构造函数。
    pub fn run_constructors<F>(&mut self, root: Entity, mut run: F) -> ConstructorReport
    where
        F: FnMut(&ConstructorCall<'_>) -> ScriptResult<()>,
    {
        let mut report = ConstructorReport::default();
        for entity in self.post_order(root) {
            let Some(PendingConstructor(source)) =
                self.world.entity_mut(entity).take::<PendingConstructor>()
            else {
                continue;
            };
            let target = self.name(entity).unwrap_or_default().to_string();
            let call = ConstructorCall {
                target: &target,
                source: &source,
            };
            report.executed += 1;
            if let Err(error) = run(&call) {
                tracing::warn!(target: "display", "Constructor of {} failed: {}", target, error);
                report.failures.push(ConstructorFailure { target, error });
            }
        }
        report
    }

    pub fn dispatch_event(&mut self, target: Entity, kind: DisplayEventKind) {
        tracing::trace!(target: "display", "{} -> {:?}", kind.as_str(), target);
        self.events.push(DisplayEvent { target, kind });
    }

    /// 派发 `AddedToStage`；`broadcast` 时同时派发给所有后代（前序）
    pub fn dispatch_added_to_stage(&mut self, target: Entity, broadcast: bool) {
        let targets = if broadcast {
            self.pre_order(target)
        } else {
            vec![target]
        };
        for entity in targets {
            self.dispatch_event(entity, DisplayEventKind::AddedToStage);
        }
    }

    pub fn events(&self) -> &[DisplayEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<DisplayEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn node_count(&self) -> usize {
        self.world.entities().len() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> DisplayTemplate {
        DisplayTemplate::new("Scene 1")
            .with_frames(3)
            .with_constructor("root()")
            .with_child(
                DisplayTemplate::new("hero")
                    .with_constructor("hero()")
                    .with_child(DisplayTemplate::new("hat").with_constructor("hat()")),
            )
            .with_child(DisplayTemplate::new("ground"))
    }

    #[test]
    fn test_instantiate_builds_independent_subtrees() {
        let mut tree = DisplayTree::new();
        let a = tree.instantiate(&scene());
        let b = tree.instantiate(&scene());
        assert_ne!(a, b);
        assert_eq!(tree.pre_order(a).len(), 4);
        assert_eq!(tree.node_count(), 8);

        let names: Vec<_> = tree
            .pre_order(a)
            .into_iter()
            .map(|e| tree.name(e).unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["Scene 1", "hero", "hat", "ground"]);
    }

    #[test]
    fn test_add_child_reparents() {
        let mut tree = DisplayTree::new();
        let a = tree.spawn_node("a", 1);
        let b = tree.spawn_node("b", 1);
        let c = tree.spawn_node("c", 1);

        assert!(tree.add_child(a, c));
        assert!(tree.add_child(b, c));
        assert!(tree.children(a).is_empty());
        assert_eq!(tree.children(b), vec![c]);
        assert_eq!(tree.parent(c), Some(b));
        assert!(!tree.add_child(c, c));
    }

    #[test]
    fn test_constructors_run_post_order_once() {
        let mut tree = DisplayTree::new();
        let root = tree.instantiate(&scene());
        let mut seen = Vec::new();

        let report = tree.run_constructors(root, |call| {
            seen.push(call.target.to_string());
            Ok(())
        });
        assert_eq!(report.executed, 3);
        assert!(report.is_clean());
        assert_eq!(seen, vec!["hat", "hero", "Scene 1"]);

        let again = tree.run_constructors(root, |_| Ok(()));
        assert_eq!(again.executed, 0);
    }

    #[test]
    fn test_constructor_failure_does_not_stop_others() {
        let mut tree = DisplayTree::new();
        let root = tree.instantiate(&scene());

        let report = tree.run_constructors(root, |call| {
            if call.target == "hero" {
                Err(ScriptError::Runtime("boom".to_string()))
            } else {
                Ok(())
            }
        });
        assert_eq!(report.executed, 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].target, "hero");
        assert!(!tree.has_pending_constructor(root));
    }

    #[test]
    fn test_timeline_start_frame_then_advance() {
        let mut timeline = Timeline::new(3);
        timeline.first_frame_on_start = true;
        assert_eq!(timeline.advance(), FramePhase::Start);
        assert_eq!(timeline.advance(), FramePhase::Advanced(1));
        assert_eq!(timeline.advance(), FramePhase::Advanced(2));
        assert_eq!(timeline.advance(), FramePhase::Advanced(0));

        timeline.current_frame = 2;
        timeline.reset();
        assert_eq!(timeline.current_frame, 0);
    }

    #[test]
    fn test_added_to_stage_broadcast() {
        let mut tree = DisplayTree::new();
        let root = tree.instantiate(&scene());
        tree.dispatch_added_to_stage(root, true);
        assert_eq!(tree.events().len(), 4);
        assert!(tree
            .drain_events()
            .iter()
            .all(|e| e.kind == DisplayEventKind::AddedToStage));
        assert!(tree.events().is_empty());
    }
}
