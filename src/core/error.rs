//! 统一错误处理模块
//!
//! 提供播放器运行时范围内的错误类型定义
//!
//! ## 错误类型分层
//!
//! - **I/O 层** (`FetchError`): 资源获取失败，可重试（由外部协作者决定）
//! - **字节码层** (`ModuleError`, `CatalogError`): 对引导过程是致命的
//! - **用户代码层** (`ScriptError`): 构造函数执行失败，只上报，不中断
//! - **引导层** (`BootstrapError`): 汇总某个阶段的失败原因
//!
//! 未知资源类型不是错误值：它只产生一条警告日志。

use std::fmt;
use thiserror::Error;

/// 资源获取错误
///
/// 传输失败或响应为空时产生。`status_text` 保留传输层给出的描述
/// （例如 `"404"`、`"timeout"`）。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unable to load {name}: {status_text}")]
pub struct FetchError {
    pub name: String,
    pub status_text: String,
}

impl FetchError {
    pub fn new(name: impl Into<String>, status_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status_text: status_text.into(),
        }
    }
}

/// 字节码模块错误
#[derive(Error, Debug, Clone)]
pub enum ModuleError {
    #[error("Failed to decode module {origin}: {reason}")]
    Decode { origin: String, reason: String },

    #[error("Module {origin} failed to execute: {reason}")]
    Execution { origin: String, reason: String },

    #[error("Unknown module id: {0}")]
    UnknownModule(u64),
}

/// 模块目录错误
#[derive(Error, Debug, Clone)]
pub enum CatalogError {
    #[error("Invalid catalog index: {0}")]
    InvalidIndex(String),

    #[error("Catalog entry {name} [{offset}..{offset}+{length}] exceeds catalog size {size}")]
    EntryOutOfBounds {
        name: String,
        offset: usize,
        length: usize,
        size: usize,
    },
}

/// 脚本系统错误
#[derive(Error, Debug, Clone)]
pub enum ScriptError {
    #[error("Script compilation error: {0}")]
    Compilation(String),

    #[error("Script runtime error: {0}")]
    Runtime(String),
}

/// 引导阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootstrapStage {
    /// 基础模块（builtin）
    Baseline,
    /// 平台 API 目录及其索引
    Catalog,
    /// 依赖目录的附加模块
    Shell,
    /// 域收尾（LoaderInfo / ApplicationDomain / Stage）
    Finalize,
}

impl BootstrapStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            BootstrapStage::Baseline => "baseline",
            BootstrapStage::Catalog => "catalog",
            BootstrapStage::Shell => "shell",
            BootstrapStage::Finalize => "finalize",
        }
    }
}

impl fmt::Display for BootstrapStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个阶段的失败原因
#[derive(Error, Debug, Clone)]
pub enum StageFailure {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Module(#[from] ModuleError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// 引导错误
#[derive(Error, Debug, Clone)]
pub enum BootstrapError {
    #[error("Bootstrap failed at stage {stage}: {cause}")]
    Failed {
        stage: BootstrapStage,
        cause: StageFailure,
    },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Bootstrap cancelled during stage {stage}")]
    Cancelled { stage: BootstrapStage },
}

impl BootstrapError {
    pub fn failed(stage: BootstrapStage, cause: impl Into<StageFailure>) -> Self {
        BootstrapError::Failed {
            stage,
            cause: cause.into(),
        }
    }

    /// 失败所在阶段（不变量违规没有阶段）
    pub fn stage(&self) -> Option<BootstrapStage> {
        match self {
            BootstrapError::Failed { stage, .. } | BootstrapError::Cancelled { stage } => {
                Some(*stage)
            }
            BootstrapError::InvariantViolation(_) => None,
        }
    }
}

/// 资源分发错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Execution domain not ready, dropped asset {0}")]
    DomainNotReady(String),
}

/// 内容工厂错误
#[derive(Error, Debug, Clone)]
pub enum FactoryError {
    #[error("Unknown definition: {0}")]
    UnknownDefinition(String),

    #[error("Definition {0} is not a display object")]
    NotInstantiable(String),

    #[error("Stage not attached to the execution domain")]
    NoStage,

    #[error("Module error while resolving definition: {0}")]
    Module(#[from] ModuleError),
}

pub type FetchResult<T> = Result<T, FetchError>;
pub type ModuleResult<T> = Result<T, ModuleError>;
pub type CatalogResult<T> = Result<T, CatalogError>;
pub type ScriptResult<T> = Result<T, ScriptError>;
pub type BootstrapResult<T> = Result<T, BootstrapError>;
pub type DispatchResult<T> = Result<T, DispatchError>;
pub type FactoryResult<T> = Result<T, FactoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let fetch_err = FetchError::new("builtin.abc", "404");
        let err = BootstrapError::failed(BootstrapStage::Baseline, fetch_err);
        assert!(matches!(
            err,
            BootstrapError::Failed {
                stage: BootstrapStage::Baseline,
                cause: StageFailure::Fetch(_),
            }
        ));
        assert_eq!(err.stage(), Some(BootstrapStage::Baseline));
    }

    #[test]
    fn test_error_display() {
        let err = BootstrapError::failed(
            BootstrapStage::Baseline,
            FetchError::new("builtins/builtin.abc", "404"),
        );
        assert_eq!(
            err.to_string(),
            "Bootstrap failed at stage baseline: Unable to load builtins/builtin.abc: 404"
        );
    }

    #[test]
    fn test_invariant_violation_has_no_stage() {
        let err = BootstrapError::InvariantViolation("missing builtin".to_string());
        assert_eq!(err.stage(), None);
    }
}
