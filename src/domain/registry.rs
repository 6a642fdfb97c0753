//! 定义注册表
//!
//! 执行域按命名空间保存内容资源：通用定义、音频定义与字体定义。
//! 每个条目都带有产生它的那次加载的 [`LoaderInfo`]。

use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::{AudioAsset, FontAsset, GenericAsset, ImageAsset, SceneAsset, TextAsset};
use crate::display::DisplayTemplate;

use super::system::LoaderInfo;

/// 通用定义注册表中的条目
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    Text(TextAsset),
    Image(ImageAsset),
    Sprite(DisplayTemplate),
    Scene(SceneAsset),
    Generic(GenericAsset),
}

impl Definition {
    /// 可实例化为显示对象的模板
    pub fn template(&self) -> Option<&DisplayTemplate> {
        match self {
            Definition::Sprite(template) => Some(template),
            Definition::Scene(scene) => Some(&scene.template),
            Definition::Text(_) | Definition::Image(_) | Definition::Generic(_) => None,
        }
    }
}

/// 注册表种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryKind {
    Definitions,
    Audio,
    Fonts,
}

/// 带加载来源的注册条目
#[derive(Debug, Clone, PartialEq)]
pub struct Registered<T> {
    pub value: T,
    pub loader_info: Option<Arc<LoaderInfo>>,
}

/// 单个命名空间
#[derive(Debug, Clone)]
pub struct Registry<T> {
    entries: HashMap<String, Registered<T>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> Registry<T> {
    /// 注册条目；同名条目被覆盖并返回旧值
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: T,
        loader_info: Option<Arc<LoaderInfo>>,
    ) -> Option<Registered<T>> {
        let name = name.into();
        let previous = self
            .entries
            .insert(name.clone(), Registered { value, loader_info });
        if previous.is_some() {
            tracing::debug!(target: "assets", "Definition {} replaced", name);
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<&Registered<T>> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// 执行域的三个注册表
#[derive(Debug, Clone, Default)]
pub struct Registries {
    pub definitions: Registry<Definition>,
    pub audio_definitions: Registry<AudioAsset>,
    pub font_definitions: Registry<FontAsset>,
}

impl Registries {
    pub fn len_of(&self, kind: RegistryKind) -> usize {
        match kind {
            RegistryKind::Definitions => self.definitions.len(),
            RegistryKind::Audio => self.audio_definitions.len(),
            RegistryKind::Fonts => self.font_definitions.len(),
        }
    }
}
