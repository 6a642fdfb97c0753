//! 解码后的内容资源
//!
//! 资源种类是一个封闭的和类型：新增种类会让所有分发点无法编译，
//! 直到它们处理了新的分支。

use serde::{Deserialize, Serialize};

use crate::display::DisplayTemplate;

/// 文本字段定义
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextAsset {
    pub text: String,
    #[serde(default)]
    pub html: bool,
}

/// 位图（两种图像表示统一为一个变体）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    pub width: u32,
    pub height: u32,
    /// RGBA8 像素
    #[serde(default)]
    pub rgba: Vec<u8>,
}

/// 波形音频
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioAsset {
    pub sample_rate: u32,
    pub channels: u16,
    #[serde(default)]
    pub data: Vec<u8>,
}

/// 字体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontAsset {
    pub family: String,
    #[serde(default)]
    pub glyph_count: u32,
}

/// 场景（影片剪辑）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneAsset {
    pub template: DisplayTemplate,
}

/// 通用资源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericAsset {
    pub data: serde_json::Value,
}

/// 图形子类（不注册）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphicKind {
    Shape,
    MorphShape,
}

/// 资源负载
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssetPayload {
    Text(TextAsset),
    Image(ImageAsset),
    Audio(AudioAsset),
    Font(FontAsset),
    Sprite(DisplayTemplate),
    Scene(SceneAsset),
    Graphic(GraphicKind),
    Generic(GenericAsset),
    /// 解码器产出了本运行时不认识的类型
    Unknown { type_name: String },
}

/// 资源类型标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetType {
    Text,
    Image,
    Audio,
    Font,
    Sprite,
    Scene,
    Graphic,
    Generic,
    Unknown,
}

impl AssetType {
    pub const ALL: [AssetType; 9] = [
        AssetType::Text,
        AssetType::Image,
        AssetType::Audio,
        AssetType::Font,
        AssetType::Sprite,
        AssetType::Scene,
        AssetType::Graphic,
        AssetType::Generic,
        AssetType::Unknown,
    ];
}

impl AssetPayload {
    pub fn asset_type(&self) -> AssetType {
        match self {
            AssetPayload::Text(_) => AssetType::Text,
            AssetPayload::Image(_) => AssetType::Image,
            AssetPayload::Audio(_) => AssetType::Audio,
            AssetPayload::Font(_) => AssetType::Font,
            AssetPayload::Sprite(_) => AssetType::Sprite,
            AssetPayload::Scene(_) => AssetType::Scene,
            AssetPayload::Graphic(_) => AssetType::Graphic,
            AssetPayload::Generic(_) => AssetType::Generic,
            AssetPayload::Unknown { .. } => AssetType::Unknown,
        }
    }
}

/// 解码后的资源，分发后所有权转移到目标注册表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedAsset {
    pub name: String,
    pub payload: AssetPayload,
    /// 解码器标记的根场景
    #[serde(default)]
    pub is_root_scene: bool,
}

impl DecodedAsset {
    pub fn new(name: impl Into<String>, payload: AssetPayload) -> Self {
        Self {
            name: name.into(),
            payload,
            is_root_scene: false,
        }
    }

    /// 根场景资源
    pub fn root_scene(name: impl Into<String>, template: DisplayTemplate) -> Self {
        Self {
            name: name.into(),
            payload: AssetPayload::Scene(SceneAsset { template }),
            is_root_scene: true,
        }
    }

    pub fn asset_type(&self) -> AssetType {
        self.payload.asset_type()
    }
}
