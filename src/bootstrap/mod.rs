//! 执行域引导
//!
//! 编排器、取消令牌，以及引导成功后交给宿主的内容工厂。

pub mod cancel;
pub mod factory;
pub mod orchestrator;

pub use cancel::{BootstrapCancel, CancelToken};
pub use factory::ContentFactory;
pub use orchestrator::{BootstrapOrchestrator, EnvironmentInfo, LibraryFlags};
