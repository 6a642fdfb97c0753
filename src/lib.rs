//! # Player Runtime
//!
//! 内容播放器的执行域引导与资源接入。
//!
//! ## 功能
//!
//! - **引导**：严格按顺序加载 builtin 模块、注册平台 API 目录、执行 shell 模块，
//!   然后发布执行域
//! - **资源分发**：把解码后的资源路由到对应类型的注册表
//! - **根场景嫁接**：根场景只挂到舞台上一次
//! - **脚本**：基于 QuickJS 的模块执行器，带 `trace` 输出
//!
//! ## 模块
//!
//! - [`core`]：宿主外观、错误与日志
//! - [`bootstrap`]：引导编排与内容工厂
//! - [`domain`]：执行域、模块、目录与注册表
//! - [`assets`]：解码资源、分发器与根场景嫁接
//! - [`display`]：显示树与舞台
//! - [`resources`]：资源获取

/// 播放器核心：宿主外观、错误与日志
pub mod core;
/// 内置库的资源获取
pub mod resources;
/// 执行域、字节码模块与定义注册表
pub mod domain;
/// 执行域引导
pub mod bootstrap;
/// 解码资源及其分发
pub mod assets;
/// 显示树与舞台
pub mod display;
/// QuickJS 模块执行器
pub mod scripting;
/// 配置系统
pub mod config;

pub use crate::core::Player;
