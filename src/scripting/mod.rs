pub mod engine;

pub use engine::{QuickJsExecutor, TraceSink};
