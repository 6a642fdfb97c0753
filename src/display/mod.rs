//! 显示系统
//!
//! 显示树、舞台与宿主渲染表面之间的窄接口。渲染本身不在本 crate 内。

pub mod events;
pub mod stage;
pub mod template;
pub mod tree;

pub use events::{DisplayEvent, DisplayEventKind};
pub use stage::{FrameTick, HeadlessSurface, RenderSurface, Stage, StageRef, Viewport};
pub use template::DisplayTemplate;
pub use tree::{
    ConstructorFailure, ConstructorReport, DisplayNode, DisplayTree, FramePhase, Timeline,
};
