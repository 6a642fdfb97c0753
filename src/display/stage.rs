//! 舞台
//!
//! 舞台是显示树的根，并与宿主提供的渲染表面双向关联：
//! 表面通过弱引用找到舞台（`adapter`），舞台持有表面（`adaptee`）。

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use bevy_ecs::entity::Entity;

use super::events::{DisplayEvent, DisplayEventKind};
use super::tree::{DisplayTree, FramePhase};

pub type StageRef = Rc<RefCell<Stage>>;

/// 渲染表面尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// 宿主渲染表面
pub trait RenderSurface {
    /// 表面一侧的链接：记住驱动它的舞台
    fn link_adapter(&self, stage: Weak<RefCell<Stage>>);

    fn viewport(&self) -> Viewport;
}

/// 一次帧推进的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameTick {
    pub frame: u64,
    /// 本帧作为"开始帧"处理的对象
    pub started: Vec<Entity>,
    /// 推进了播放头的对象数
    pub advanced: usize,
    /// 上一帧以来派发的显示事件，按派发顺序
    pub events: Vec<DisplayEvent>,
}

/// 舞台
pub struct Stage {
    tree: DisplayTree,
    root: Entity,
    adaptee: Rc<dyn RenderSurface>,
    viewport: Viewport,
    frame: u64,
}

impl Stage {
    pub fn new(adaptee: Rc<dyn RenderSurface>) -> Self {
        let mut tree = DisplayTree::new();
        let root = tree.spawn_node("stage", 1);
        let viewport = adaptee.viewport();
        Self {
            tree,
            root,
            adaptee,
            viewport,
            frame: 0,
        }
    }

    /// 创建舞台并与表面双向链接
    pub fn attach(surface: Rc<dyn RenderSurface>) -> StageRef {
        let stage = Rc::new(RefCell::new(Stage::new(surface.clone())));
        surface.link_adapter(Rc::downgrade(&stage));
        tracing::debug!(target: "display", "Stage linked to render surface");
        stage
    }

    pub fn root(&self) -> Entity {
        self.root
    }

    pub fn tree(&self) -> &DisplayTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut DisplayTree {
        &mut self.tree
    }

    pub fn adaptee(&self) -> &Rc<dyn RenderSurface> {
        &self.adaptee
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// 推进舞台上所有对象的时间轴，并取走上一帧以来积累的事件
    pub fn enter_frame(&mut self) -> FrameTick {
        self.frame += 1;
        let mut tick = FrameTick {
            frame: self.frame,
            events: self.tree.drain_events(),
            ..FrameTick::default()
        };
        for entity in self.tree.pre_order(self.root) {
            if entity == self.root {
                continue;
            }
            if let Some(mut timeline) = self.tree.timeline_mut(entity) {
                match timeline.advance() {
                    FramePhase::Start => tick.started.push(entity),
                    FramePhase::Advanced(_) => tick.advanced += 1,
                }
            }
        }
        tick
    }

    /// 从表面读取尺寸；变化时派发 `Resize`
    pub fn resize_callback(&mut self) -> bool {
        let viewport = self.adaptee.viewport();
        if viewport == self.viewport {
            return false;
        }
        tracing::debug!(
            target: "display",
            "Stage resized {}x{} -> {}x{}",
            self.viewport.width,
            self.viewport.height,
            viewport.width,
            viewport.height
        );
        self.viewport = viewport;
        self.tree.dispatch_event(self.root, DisplayEventKind::Resize);
        true
    }
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("root", &self.root)
            .field("viewport", &self.viewport)
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}

/// 无窗口的渲染表面
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    adapter: RefCell<Weak<RefCell<Stage>>>,
    viewport: Cell<Viewport>,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            adapter: RefCell::new(Weak::new()),
            viewport: Cell::new(Viewport::new(width, height)),
        }
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.viewport.set(viewport);
    }

    /// 与本表面链接的舞台（舞台已释放时为 `None`）
    pub fn adapter(&self) -> Option<StageRef> {
        self.adapter.borrow().upgrade()
    }
}

impl RenderSurface for HeadlessSurface {
    fn link_adapter(&self, stage: Weak<RefCell<Stage>>) {
        *self.adapter.borrow_mut() = stage;
    }

    fn viewport(&self) -> Viewport {
        self.viewport.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DisplayTemplate;

    #[test]
    fn test_attach_links_both_ways() {
        let surface = Rc::new(HeadlessSurface::new(550, 400));
        let stage = Stage::attach(surface.clone());

        let adapter = surface.adapter().unwrap();
        assert!(Rc::ptr_eq(&adapter, &stage));
        assert_eq!(stage.borrow().adaptee().viewport(), Viewport::new(550, 400));
    }

    #[test]
    fn test_resize_callback_only_on_change() {
        let surface = Rc::new(HeadlessSurface::new(550, 400));
        let stage = Stage::attach(surface.clone());

        assert!(!stage.borrow_mut().resize_callback());
        surface.set_viewport(Viewport::new(800, 600));
        assert!(stage.borrow_mut().resize_callback());
        assert_eq!(stage.borrow().viewport(), Viewport::new(800, 600));
        assert_eq!(
            stage.borrow().tree().events().last().map(|e| e.kind),
            Some(DisplayEventKind::Resize)
        );
    }

    #[test]
    fn test_enter_frame_skips_detached_objects() {
        let surface = Rc::new(HeadlessSurface::new(1, 1));
        let stage = Stage::attach(surface);
        let mut stage = stage.borrow_mut();

        let template = DisplayTemplate::new("clip").with_frames(4);
        let attached = stage.tree_mut().instantiate(&template);
        let detached = stage.tree_mut().instantiate(&template);
        let root = stage.root();
        stage.tree_mut().add_child(root, attached);

        let tick = stage.enter_frame();
        assert_eq!(tick.frame, 1);
        assert_eq!(tick.advanced, 1);
        assert_eq!(stage.tree().timeline(attached).unwrap().current_frame, 1);
        assert_eq!(stage.tree().timeline(detached).unwrap().current_frame, 0);
    }

    #[test]
    fn test_enter_frame_hands_over_pending_events() {
        let surface = Rc::new(HeadlessSurface::new(550, 400));
        let stage = Stage::attach(surface.clone());
        let mut stage = stage.borrow_mut();

        for i in 0..1000 {
            surface.set_viewport(Viewport::new(551 + i, 400));
            assert!(stage.resize_callback());
        }
        assert_eq!(stage.tree().events().len(), 1000);

        let tick = stage.enter_frame();
        assert_eq!(tick.events.len(), 1000);
        assert!(tick
            .events
            .iter()
            .all(|e| e.kind == DisplayEventKind::Resize && e.target == stage.root()));
        assert!(stage.tree().events().is_empty());

        let next = stage.enter_frame();
        assert!(next.events.is_empty());
    }
}
