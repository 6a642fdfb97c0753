//! 执行域
//!
//! 拥有已加载的字节码模块（按加载顺序，执行成功后会话期间不移除）、三个定义注册表、
//! 已注册的模块目录，以及当前舞台的引用。

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

use crate::core::error::{ModuleError, ModuleResult, ScriptResult};
use crate::display::StageRef;

use super::catalog::Catalog;
use super::module::{BytecodeModule, ConstructorCall, ModuleEnv, ModuleExecutor, ModuleId};
use super::registry::Registries;

pub type DomainRef = Rc<RefCell<ExecutionDomain>>;

/// 按需解析定义的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogResolution {
    /// 定义已在注册表中
    Registered,
    /// 对应的目录条目之前已经执行过
    AlreadyLoaded { entry: String },
    /// 本次加载并执行了目录条目
    Executed { entry: String },
    /// 注册表和目录中都没有
    NotFound,
}

/// 执行域
pub struct ExecutionDomain {
    executor: Box<dyn ModuleExecutor>,
    modules: Vec<BytecodeModule>,
    /// 已执行的模块数；模块严格按加载顺序执行
    executed: usize,
    registries: Registries,
    catalog: Option<Catalog>,
    catalog_loaded: HashSet<usize>,
    content_version: u8,
    stage: Option<StageRef>,
}

impl ExecutionDomain {
    pub fn new(executor: Box<dyn ModuleExecutor>, content_version: u8) -> Self {
        Self {
            executor,
            modules: Vec::new(),
            executed: 0,
            registries: Registries::default(),
            catalog: None,
            catalog_loaded: HashSet::new(),
            content_version,
            stage: None,
        }
    }

    pub fn shared(self) -> DomainRef {
        Rc::new(RefCell::new(self))
    }

    /// 解析模块并追加到模块列表（不执行）
    pub fn load_module(&mut self, bytes: &[u8], env: ModuleEnv) -> ModuleResult<ModuleId> {
        let id = ModuleId(self.modules.len() as u64);
        let module = self.executor.load_module(id, bytes, &env)?;
        tracing::debug!(target: "domain", "Loaded module {} as {:?}", module.origin(), id);
        self.modules.push(module);
        Ok(id)
    }

    /// 执行模块顶层代码
    ///
    /// 只能执行加载顺序中的下一个未执行模块。
    pub fn execute_module(&mut self, id: ModuleId) -> ModuleResult<()> {
        let index = usize::try_from(id.0).map_err(|_| ModuleError::UnknownModule(id.0))?;
        let module = self
            .modules
            .get(index)
            .ok_or(ModuleError::UnknownModule(id.0))?;

        if index != self.executed {
            return Err(ModuleError::Execution {
                origin: module.origin().to_string(),
                reason: format!(
                    "modules execute in load order: expected module {}, got {}",
                    self.executed, index
                ),
            });
        }

        self.executor.execute_module(module)?;
        self.executed += 1;
        tracing::debug!(target: "domain", "Executed module {}", module.origin());
        Ok(())
    }

    /// 加载并立即执行；执行失败时撤回该模块，后续模块仍可按顺序执行
    pub fn load_and_execute(&mut self, bytes: &[u8], env: ModuleEnv) -> ModuleResult<ModuleId> {
        let id = self.load_module(bytes, env)?;
        if let Err(e) = self.execute_module(id) {
            if self.modules.len() == self.executed + 1 {
                if let Some(module) = self.modules.pop() {
                    tracing::warn!(target: "domain", "Dropped module {} after failed execution", module.origin());
                }
            }
            return Err(e);
        }
        Ok(id)
    }

    /// 注册模块目录；目录条目在第一次被引用时才执行
    pub fn register_catalog(&mut self, catalog: Catalog) {
        tracing::info!(target: "domain", "Registered catalog with {} entries", catalog.len());
        self.catalog = Some(catalog);
        self.catalog_loaded.clear();
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_ref()
    }

    /// 确保 `name` 可用：必要时加载并执行声明它的目录条目
    pub fn resolve_definition(&mut self, name: &str) -> ModuleResult<CatalogResolution> {
        if self.registries.definitions.contains(name) {
            return Ok(CatalogResolution::Registered);
        }

        let Some(catalog) = &self.catalog else {
            return Ok(CatalogResolution::NotFound);
        };
        let Some(index) = catalog.index_of(name) else {
            return Ok(CatalogResolution::NotFound);
        };
        let (entry, code) = match (catalog.entry(index), catalog.code(index)) {
            (Some(entry), Some(code)) => (entry.name.clone(), code.to_vec()),
            _ => return Ok(CatalogResolution::NotFound),
        };

        if self.catalog_loaded.contains(&index) {
            return Ok(CatalogResolution::AlreadyLoaded { entry });
        }

        self.load_and_execute(&code, ModuleEnv::system(entry.clone()))?;
        self.catalog_loaded.insert(index);
        Ok(CatalogResolution::Executed { entry })
    }

    pub fn run_constructor(&mut self, call: &ConstructorCall<'_>) -> ScriptResult<()> {
        self.executor.run_constructor(call)
    }

    pub fn modules(&self) -> &[BytecodeModule] {
        &self.modules
    }

    pub fn executed_count(&self) -> usize {
        self.executed
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    pub fn registries_mut(&mut self) -> &mut Registries {
        &mut self.registries
    }

    pub fn content_version(&self) -> u8 {
        self.content_version
    }

    pub fn stage(&self) -> Option<&StageRef> {
        self.stage.as_ref()
    }

    pub fn set_stage(&mut self, stage: StageRef) {
        self.stage = Some(stage);
    }
}

impl std::fmt::Debug for ExecutionDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionDomain")
            .field("modules", &self.modules.len())
            .field("executed", &self.executed)
            .field("catalog", &self.catalog.as_ref().map(Catalog::len))
            .field("content_version", &self.content_version)
            .finish_non_exhaustive()
    }
}

/// 记录调用顺序的执行器，用于测试与无解释器的嵌入
///
/// 代码以 `fail` 开头的模块/构造函数会执行失败。
#[derive(Debug, Clone, Default)]
pub struct RecordingExecutor {
    log: Rc<RefCell<Vec<String>>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 与其他组件共享的调用日志
    pub fn with_log(log: Rc<RefCell<Vec<String>>>) -> Self {
        Self { log }
    }

    pub fn log(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

impl ModuleExecutor for RecordingExecutor {
    fn load_module(&mut self, id: ModuleId, bytes: &[u8], env: &ModuleEnv) -> ModuleResult<BytecodeModule> {
        self.log.borrow_mut().push(format!("load {}", env.origin));
        Ok(BytecodeModule {
            id,
            env: env.clone(),
            code: Arc::from(bytes),
        })
    }

    fn execute_module(&mut self, module: &BytecodeModule) -> ModuleResult<()> {
        self.log.borrow_mut().push(format!("execute {}", module.origin()));
        if module.code.starts_with(b"fail") {
            return Err(ModuleError::Execution {
                origin: module.origin().to_string(),
                reason: "recorded failure".to_string(),
            });
        }
        Ok(())
    }

    fn run_constructor(&mut self, call: &ConstructorCall<'_>) -> ScriptResult<()> {
        self.log.borrow_mut().push(format!("construct {}", call.target));
        if call.source.starts_with("fail") {
            return Err(crate::core::error::ScriptError::Runtime(format!(
                "constructor of {} failed",
                call.target
            )));
        }
        Ok(())
    }
}
