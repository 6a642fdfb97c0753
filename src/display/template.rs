//! 显示对象模板
//!
//! 解码器产出的精灵/场景是一棵不可变的模板树；实例化会在显示树中生成
//! 一组全新的实体，模板本身保持不变，可以多次实例化。

use serde::{Deserialize, Serialize};

/// 显示对象模板
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayTemplate {
    pub name: String,
    /// 时间轴帧数（至少为 1）
    #[serde(default = "default_frames")]
    pub frames: u32,
    /// 挂在该对象上的用户构造函数
    #[serde(default)]
    pub constructor: Option<String>,
    #[serde(default)]
    pub children: Vec<DisplayTemplate>,
}

fn default_frames() -> u32 {
    1
}

impl DisplayTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frames: 1,
            constructor: None,
            children: Vec::new(),
        }
    }

    pub fn with_frames(mut self, frames: u32) -> Self {
        self.frames = frames.max(1);
        self
    }

    pub fn with_constructor(mut self, source: impl Into<String>) -> Self {
        self.constructor = Some(source.into());
        self
    }

    pub fn with_child(mut self, child: DisplayTemplate) -> Self {
        self.children.push(child);
        self
    }

    /// 模板树中的节点总数
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }
}
