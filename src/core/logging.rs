//! 日志初始化
//!
//! 配置tracing日志框架。`RUST_LOG` 优先，未设置时使用配置中的级别。

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// 初始化日志系统
///
/// 重复调用是安全的：已经安装全局订阅者时直接返回。
pub fn init(config: &LoggingConfig) {
    if !config.log_to_console {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_filter()));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    tracing::info!(target: "player", "Player runtime starting");
}
