//! 内容资源
//!
//! 解码后的资源类型、分发器与根场景嫁接。

pub mod asset;
pub mod dispatcher;
pub mod graft;

pub use asset::{
    AssetPayload, AssetType, AudioAsset, DecodedAsset, FontAsset, GenericAsset, GraphicKind,
    ImageAsset, SceneAsset, TextAsset,
};
pub use dispatcher::{AssetDispatcher, DispatchOutcome};
pub use graft::{GraftResult, GraftState, RootSceneGraft};
