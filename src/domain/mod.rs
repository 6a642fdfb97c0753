//! 执行域
//!
//! 隔离的执行环境：拥有字节码模块、模块目录和命名的资源注册表，
//! 以及一次内容会话的上下文对象。

pub mod catalog;
pub mod execution;
pub mod module;
pub mod registry;
pub mod system;

pub use catalog::{Catalog, CatalogEntry};
pub use execution::{CatalogResolution, DomainRef, ExecutionDomain, RecordingExecutor};
pub use module::{BytecodeModule, ConstructorCall, DomainKind, ModuleEnv, ModuleExecutor, ModuleId};
pub use registry::{Definition, Registered, Registries, Registry, RegistryKind};
pub use system::{ApplicationDomain, ContentSession, LoaderContext, LoaderInfo, SessionRef};
