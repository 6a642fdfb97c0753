//! 核心模块
//!
//! 包含播放器的核心功能：
//! - `player` - 宿主入口
//! - `error` - 错误类型定义
//! - `logging` - 日志初始化

pub mod error;
pub mod logging;
pub mod player;
#[macro_use]
pub mod macros;

// 重新导出错误类型
pub use error::{
    BootstrapError, BootstrapResult, BootstrapStage, CatalogError, DispatchError, FactoryError,
    FetchError, ModuleError, ScriptError, StageFailure,
};

pub use player::Player;
