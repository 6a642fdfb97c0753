// ============================================================================
// QuickJS 模块执行器
// 把模块字节当作脚本源码执行，所有系统模块共享同一个全局作用域
// ============================================================================

use std::sync::Arc;

use rquickjs::{Context, Function, Runtime};

use crate::core::error::{ModuleError, ModuleResult, ScriptError, ScriptResult};
use crate::domain::{BytecodeModule, ConstructorCall, ModuleEnv, ModuleExecutor, ModuleId};

/// `trace(...)` 的输出接收者（例如测试处理器）
pub trait TraceSink: Send + Sync {
    fn add_message(&self, line: &str);
}

const TRACE_PRELUDE: &str = r#"
globalThis.trace = function () {
    var parts = [];
    for (var i = 0; i < arguments.length; i++) {
        parts.push(String(arguments[i]));
    }
    __trace(parts.join(' '));
};
"#;

/// 基于 QuickJS 的执行器
pub struct QuickJsExecutor {
    // context 引用 runtime，两者同生命周期
    _runtime: Runtime,
    context: Context,
    trace_sink: Option<Arc<dyn TraceSink>>,
}

impl QuickJsExecutor {
    pub fn new() -> ScriptResult<Self> {
        Self::build(None)
    }

    pub fn with_trace_sink(sink: Arc<dyn TraceSink>) -> ScriptResult<Self> {
        Self::build(Some(sink))
    }

    fn build(trace_sink: Option<Arc<dyn TraceSink>>) -> ScriptResult<Self> {
        let runtime = Runtime::new()
            .map_err(|e| ScriptError::Compilation(format!("Failed to create JS runtime: {}", e)))?;
        let context = Context::full(&runtime)
            .map_err(|e| ScriptError::Compilation(format!("Failed to create context: {}", e)))?;

        let executor = Self {
            _runtime: runtime,
            context,
            trace_sink,
        };
        executor.bind_core_api()?;
        Ok(executor)
    }

    /// 安装 `trace`：参数以空格连接，按换行拆分后逐行输出
    fn bind_core_api(&self) -> ScriptResult<()> {
        let sink = self.trace_sink.clone();
        self.context
            .with(|ctx| -> rquickjs::Result<()> {
                let global = ctx.globals();
                let trace = Function::new(ctx.clone(), move |message: String| {
                    for line in message.split('\n') {
                        tracing::info!(target: "trace", "{}", line);
                        if let Some(sink) = &sink {
                            sink.add_message(line);
                        }
                    }
                })?;
                global.set("__trace", trace)?;
                ctx.eval::<(), _>(TRACE_PRELUDE)?;
                Ok(())
            })
            .map_err(|e| ScriptError::Compilation(e.to_string()))
    }

    /// 在共享全局作用域中执行一段源码
    pub fn eval(&self, source: &str) -> ScriptResult<()> {
        self.context
            .with(|ctx| ctx.eval::<(), _>(source))
            .map_err(|e| ScriptError::Runtime(e.to_string()))
    }
}

impl ModuleExecutor for QuickJsExecutor {
    fn load_module(&mut self, id: ModuleId, bytes: &[u8], env: &ModuleEnv) -> ModuleResult<BytecodeModule> {
        std::str::from_utf8(bytes).map_err(|e| ModuleError::Decode {
            origin: env.origin.clone(),
            reason: e.to_string(),
        })?;
        Ok(BytecodeModule {
            id,
            env: env.clone(),
            code: Arc::from(bytes),
        })
    }

    fn execute_module(&mut self, module: &BytecodeModule) -> ModuleResult<()> {
        let source = std::str::from_utf8(&module.code).map_err(|e| ModuleError::Decode {
            origin: module.origin().to_string(),
            reason: e.to_string(),
        })?;
        tracing::debug!(target: "script", "Executing module {}", module.origin());
        self.eval(source).map_err(|e| ModuleError::Execution {
            origin: module.origin().to_string(),
            reason: e.to_string(),
        })
    }

    fn run_constructor(&mut self, call: &ConstructorCall<'_>) -> ScriptResult<()> {
        let target = call.target.to_string();
        self.context
            .with(|ctx| -> rquickjs::Result<()> {
                ctx.globals().set("currentTarget", target)?;
                ctx.eval::<(), _>(call.source)
            })
            .map_err(|e| ScriptError::Runtime(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CollectingSink {
        lines: Mutex<Vec<String>>,
    }

    impl TraceSink for CollectingSink {
        fn add_message(&self, line: &str) {
            self.lines.lock().unwrap().push(line.to_string());
        }
    }

    fn module(executor: &mut QuickJsExecutor, id: u64, origin: &str, source: &str) -> BytecodeModule {
        executor
            .load_module(ModuleId(id), source.as_bytes(), &ModuleEnv::system(origin))
            .unwrap()
    }

    #[test]
    fn test_modules_share_global_scope() {
        let sink = Arc::new(CollectingSink::default());
        let mut executor = QuickJsExecutor::with_trace_sink(sink.clone()).unwrap();

        let builtin = module(&mut executor, 0, "builtin.abc", "var version = 10;");
        let shell = module(&mut executor, 1, "avmplus.abc", "trace('version', version);");
        executor.execute_module(&builtin).unwrap();
        executor.execute_module(&shell).unwrap();

        assert_eq!(*sink.lines.lock().unwrap(), vec!["version 10".to_string()]);
    }

    #[test]
    fn test_trace_splits_lines() {
        let sink = Arc::new(CollectingSink::default());
        let executor = QuickJsExecutor::with_trace_sink(sink.clone()).unwrap();
        executor.eval("trace('a\\nb');").unwrap();
        assert_eq!(
            *sink.lines.lock().unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_invalid_utf8_is_decode_error() {
        let mut executor = QuickJsExecutor::new().unwrap();
        let err = executor
            .load_module(ModuleId(0), &[0xff, 0xfe], &ModuleEnv::system("bad.abc"))
            .unwrap_err();
        assert!(matches!(err, ModuleError::Decode { .. }));
    }

    #[test]
    fn test_throwing_module_is_execution_error() {
        let mut executor = QuickJsExecutor::new().unwrap();
        let bad = module(&mut executor, 0, "bad.abc", "throw new Error('nope');");
        assert!(matches!(
            executor.execute_module(&bad),
            Err(ModuleError::Execution { .. })
        ));
    }

    #[test]
    fn test_constructor_sees_target() {
        let sink = Arc::new(CollectingSink::default());
        let mut executor = QuickJsExecutor::with_trace_sink(sink.clone()).unwrap();
        executor
            .run_constructor(&ConstructorCall {
                target: "hero",
                source: "trace('built ' + currentTarget);",
            })
            .unwrap();
        assert_eq!(*sink.lines.lock().unwrap(), vec!["built hero".to_string()]);
    }
}
