//! 资源获取
//!
//! 按名称获取二进制或结构化（JSON）资源。获取器不理解资源内容，
//! 只负责 I/O；空响应视为失败。

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use futures::future::{FutureExt, LocalBoxFuture};

use crate::core::error::{FetchError, FetchResult};

/// 资源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// 原始字节
    Binary,
    /// JSON 文档
    Structured,
}

/// 加载请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// 资源名称（路径由宿主决定，这里是不透明字符串）
    pub name: String,
    /// 资源类型
    pub kind: ResourceKind,
}

impl LoadRequest {
    pub fn binary(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ResourceKind::Binary,
        }
    }

    pub fn structured(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ResourceKind::Structured,
        }
    }
}

/// 获取结果
#[derive(Debug, Clone, PartialEq)]
pub enum FetchedResource {
    Binary(Vec<u8>),
    Structured(serde_json::Value),
}

impl FetchedResource {
    /// 取出字节；类型不符时返回获取错误
    pub fn into_bytes(self, name: &str) -> FetchResult<Vec<u8>> {
        match self {
            FetchedResource::Binary(bytes) => Ok(bytes),
            FetchedResource::Structured(_) => {
                Err(FetchError::new(name, "expected binary response"))
            }
        }
    }

    /// 取出 JSON 文档；类型不符时返回获取错误
    pub fn into_json(self, name: &str) -> FetchResult<serde_json::Value> {
        match self {
            FetchedResource::Structured(value) => Ok(value),
            FetchedResource::Binary(_) => {
                Err(FetchError::new(name, "expected structured response"))
            }
        }
    }
}

/// 资源获取器
///
/// 运行在单线程事件循环上，因此返回的 future 不要求 `Send`。
pub trait ResourceFetcher {
    fn fetch<'a>(&'a self, request: &'a LoadRequest) -> LocalBoxFuture<'a, FetchResult<FetchedResource>>;
}

/// 从文件系统读取资源
#[derive(Debug, Clone)]
pub struct FileSystemFetcher {
    root: PathBuf,
}

impl FileSystemFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn read(&self, request: &LoadRequest) -> FetchResult<FetchedResource> {
        let path = self.root.join(&request.name);
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            let status = if e.kind() == std::io::ErrorKind::NotFound {
                "404".to_string()
            } else {
                e.to_string()
            };
            FetchError::new(&request.name, status)
        })?;

        if bytes.is_empty() {
            return Err(FetchError::new(&request.name, "empty response"));
        }

        match request.kind {
            ResourceKind::Binary => Ok(FetchedResource::Binary(bytes)),
            ResourceKind::Structured => serde_json::from_slice(&bytes)
                .map(FetchedResource::Structured)
                .map_err(|e| FetchError::new(&request.name, format!("invalid JSON: {}", e))),
        }
    }
}

impl ResourceFetcher for FileSystemFetcher {
    fn fetch<'a>(&'a self, request: &'a LoadRequest) -> LocalBoxFuture<'a, FetchResult<FetchedResource>> {
        tracing::debug!(target: "resources", "Fetching {} from {:?}", request.name, self.root);
        self.read(request).boxed_local()
    }
}

/// 内存中的资源表
///
/// 供嵌入方预先注入系统资源，也用于测试。每次获取都会记录请求名称。
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    resources: HashMap<String, FetchedResource>,
    requests: RefCell<Vec<String>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.resources
            .insert(name.into(), FetchedResource::Binary(bytes.into()));
        self
    }

    pub fn with_json(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.resources
            .insert(name.into(), FetchedResource::Structured(value));
        self
    }

    /// 已发出的请求（按发出顺序）
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl ResourceFetcher for MemoryFetcher {
    fn fetch<'a>(&'a self, request: &'a LoadRequest) -> LocalBoxFuture<'a, FetchResult<FetchedResource>> {
        self.requests.borrow_mut().push(request.name.clone());
        let result = match self.resources.get(&request.name) {
            Some(FetchedResource::Binary(bytes)) if bytes.is_empty() => {
                Err(FetchError::new(&request.name, "empty response"))
            }
            Some(resource) => Ok(resource.clone()),
            None => Err(FetchError::new(&request.name, "404")),
        };
        futures::future::ready(result).boxed_local()
    }
}
