//! 字节码模块与执行器接口
//!
//! 解释器本身是外部协作者：执行域只通过 [`ModuleExecutor`] 解析、执行
//! 模块以及运行显示对象上的构造函数。

use std::sync::Arc;

use crate::core::error::{ModuleResult, ScriptResult};

/// 模块ID（按加载顺序递增）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub u64);

/// 模块所属的域
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainKind {
    /// 系统域：builtin、平台 API 和 shell 模块
    System,
}

/// 模块环境描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleEnv {
    /// 来源名称（例如 `builtin.abc`）
    pub origin: String,
    /// 所属域
    pub domain: DomainKind,
}

impl ModuleEnv {
    pub fn system(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            domain: DomainKind::System,
        }
    }
}

/// 已解析的字节码模块
#[derive(Debug, Clone)]
pub struct BytecodeModule {
    pub id: ModuleId,
    pub env: ModuleEnv,
    pub code: Arc<[u8]>,
}

impl BytecodeModule {
    pub fn origin(&self) -> &str {
        &self.env.origin
    }
}

/// 待执行的构造函数
#[derive(Debug, Clone)]
pub struct ConstructorCall<'a> {
    /// 目标显示对象名称
    pub target: &'a str,
    /// 构造函数代码
    pub source: &'a str,
}

/// 模块执行器
///
/// `load_module` 只做解析/校验，`execute_module` 运行模块顶层代码。
pub trait ModuleExecutor {
    fn load_module(&mut self, id: ModuleId, bytes: &[u8], env: &ModuleEnv) -> ModuleResult<BytecodeModule>;

    fn execute_module(&mut self, module: &BytecodeModule) -> ModuleResult<()>;

    fn run_constructor(&mut self, call: &ConstructorCall<'_>) -> ScriptResult<()>;
}
