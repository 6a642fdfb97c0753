//! 模块目录
//!
//! 平台 API 以一个打包的二进制文件加一个 JSON 索引的形式提供。注册目录
//! 不执行任何代码；某个条目在第一次被引用时才会加载执行。
//!
//! 索引格式：
//!
//! ```json
//! [
//!   { "name": "flash/display", "offset": 0, "length": 1024,
//!     "defs": ["flash.display.Sprite", "flash.display.MovieClip"] }
//! ]
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::error::{CatalogError, CatalogResult};

/// 目录条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// 条目名称，同时作为模块来源名
    pub name: String,
    pub offset: usize,
    pub length: usize,
    /// 条目声明的限定名
    #[serde(default)]
    pub defs: Vec<String>,
}

/// 已注册的模块目录
#[derive(Debug, Clone)]
pub struct Catalog {
    bytes: Vec<u8>,
    entries: Vec<CatalogEntry>,
    /// 限定名 -> 条目下标
    by_definition: HashMap<String, usize>,
}

impl Catalog {
    /// 根据二进制数据与索引构建目录，校验每个条目的字节范围
    pub fn new(bytes: Vec<u8>, index: serde_json::Value) -> CatalogResult<Self> {
        let entries: Vec<CatalogEntry> = serde_json::from_value(index)
            .map_err(|e| CatalogError::InvalidIndex(e.to_string()))?;

        let size = bytes.len();
        let mut by_definition = HashMap::new();
        for (i, entry) in entries.iter().enumerate() {
            let in_bounds = entry
                .offset
                .checked_add(entry.length)
                .is_some_and(|end| end <= size);
            if !in_bounds {
                return Err(CatalogError::EntryOutOfBounds {
                    name: entry.name.clone(),
                    offset: entry.offset,
                    length: entry.length,
                    size,
                });
            }
            for def in &entry.defs {
                by_definition.entry(def.clone()).or_insert(i);
            }
        }

        Ok(Self {
            bytes,
            entries,
            by_definition,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// 声明了 `definition` 的条目下标
    pub fn index_of(&self, definition: &str) -> Option<usize> {
        self.by_definition.get(definition).copied()
    }

    pub fn entry(&self, index: usize) -> Option<&CatalogEntry> {
        self.entries.get(index)
    }

    /// 条目的字节片段（构造时已校验范围）
    pub fn code(&self, index: usize) -> Option<&[u8]> {
        let entry = self.entries.get(index)?;
        self.bytes.get(entry.offset..entry.offset + entry.length)
    }
}
