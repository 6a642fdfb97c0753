//! 统一配置系统
//!
//! 提供TOML/JSON配置文件、环境变量和运行时动态调整

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::impl_default;

/// 播放器配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取错误
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),
    /// 解析错误
    #[error("Config parse error: {0}")]
    ParseError(String),
    /// 验证错误
    #[error("Config validation error: {0}")]
    ValidationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 播放器主配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// 引导配置
    #[serde(default)]
    pub bootstrap: BootstrapConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PlayerConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 从TOML文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_toml_str(&content)
    }

    /// 从TOML字符串解析配置
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_json_str(&content)
    }

    /// 从JSON字符串解析配置
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 保存为TOML文件
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 从环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("PLAYER_ASSET_ROOT") {
            self.bootstrap.asset_root = PathBuf::from(val);
        }
        if let Ok(val) = env::var("PLAYER_FETCH_TIMEOUT_MS") {
            if let Ok(ms) = val.parse() {
                self.bootstrap.fetch_timeout_ms = ms;
            }
        }
        if let Ok(val) = env::var("PLAYER_LOG_LEVEL") {
            if let Some(level) = LogLevel::parse(&val) {
                self.logging.level = level;
            }
        }
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        self.bootstrap.validate()
    }

    /// 自动查找并加载配置文件
    ///
    /// 按以下顺序查找：
    /// 1. ./player.toml
    /// 2. ./player.json
    /// 3. 使用默认配置
    pub fn load_or_default() -> Self {
        if let Ok(config) = Self::from_toml_file("player.toml") {
            tracing::info!(target: "config", "Loaded config from player.toml");
            return config;
        }

        if let Ok(config) = Self::from_json_file("player.json") {
            tracing::info!(target: "config", "Loaded config from player.json");
            return config;
        }

        tracing::info!(target: "config", "Using default configuration");
        Self::default()
    }
}

/// 引导配置：系统资源的名称与获取限制
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// 资源根目录（文件系统获取器使用）
    pub asset_root: PathBuf,
    /// 基础模块
    pub builtin: String,
    /// 平台 API 目录（二进制）
    pub catalog: String,
    /// 平台 API 目录索引（JSON）
    pub catalog_index: String,
    /// 依赖目录的附加模块
    pub shell: String,
    /// 单次获取超时（毫秒），0 表示不限制
    pub fetch_timeout_ms: u64,
}

impl_default!(BootstrapConfig {
    asset_root: PathBuf::from("assets"),
    builtin: "builtins/builtin.abc".to_string(),
    catalog: "builtins/playerglobal.abcs".to_string(),
    catalog_index: "builtins/playerglobal.json".to_string(),
    shell: "builtins/avmplus.abc".to_string(),
    fetch_timeout_ms: 30_000,
});

impl BootstrapConfig {
    pub fn fetch_timeout(&self) -> Option<Duration> {
        (self.fetch_timeout_ms > 0).then(|| Duration::from_millis(self.fetch_timeout_ms))
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let names = [
            ("builtin", &self.builtin),
            ("catalog", &self.catalog),
            ("catalog_index", &self.catalog_index),
            ("shell", &self.shell),
        ];
        for (field, value) in names {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "bootstrap.{} must not be empty",
                    field
                )));
            }
        }
        Ok(())
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别（RUST_LOG 未设置时使用）
    pub level: LogLevel,

    /// 是否输出到控制台
    pub log_to_console: bool,
}

impl_default!(LoggingConfig {
    level: LogLevel::Info,
    log_to_console: true,
});

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    /// 跟踪
    Trace,
    /// 调试
    Debug,
    /// 信息
    Info,
    /// 警告
    Warn,
    /// 错误
    Error,
}

impl LogLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlayerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.bootstrap.fetch_timeout(),
            Some(Duration::from_millis(30_000))
        );
    }

    #[test]
    fn test_toml_partial_override() {
        let config = PlayerConfig::from_toml_str(
            r#"
            [bootstrap]
            asset_root = "/srv/player"
            fetch_timeout_ms = 0

            [logging]
            level = "Debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.bootstrap.asset_root, PathBuf::from("/srv/player"));
        assert_eq!(config.bootstrap.builtin, "builtins/builtin.abc");
        assert_eq!(config.bootstrap.fetch_timeout(), None);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_json_serialization() {
        let config = PlayerConfig::default();
        let json_str = serde_json::to_string(&config).unwrap();
        let parsed = PlayerConfig::from_json_str(&json_str).unwrap();
        assert_eq!(config.bootstrap.shell, parsed.bootstrap.shell);
    }

    #[test]
    fn test_validation_rejects_empty_names() {
        let mut config = PlayerConfig::default();
        config.bootstrap.catalog_index = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_toml_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("player.toml");
        let mut config = PlayerConfig::default();
        config.bootstrap.fetch_timeout_ms = 500;
        config.save_toml(&path).unwrap();

        let loaded = PlayerConfig::from_toml_file(&path).unwrap();
        assert_eq!(loaded.bootstrap.fetch_timeout_ms, 500);
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("WARN"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("verbose"), None);
    }
}
