//! 显示对象事件

use bevy_ecs::entity::Entity;

/// 事件种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayEventKind {
    /// 对象被添加为某个容器的子节点
    Added,
    /// 对象进入舞台（可广播给后代）
    AddedToStage,
    /// 舞台尺寸变化
    Resize,
}

impl DisplayEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayEventKind::Added => "added",
            DisplayEventKind::AddedToStage => "addedToStage",
            DisplayEventKind::Resize => "resize",
        }
    }
}

/// 已派发的事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayEvent {
    pub target: Entity,
    pub kind: DisplayEventKind,
}
