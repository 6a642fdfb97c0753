//! 资源分发
//!
//! 把解码器产出的资源按类型路由到执行域的注册表；根场景交给
//! [`RootSceneGraft`]。

use std::sync::Arc;

use bevy_ecs::entity::Entity;

use crate::core::error::{DispatchError, DispatchResult};
use crate::display::ConstructorReport;
use crate::domain::{Definition, DomainRef, LoaderInfo, RegistryKind, SessionRef};

use super::asset::{AssetPayload, DecodedAsset};
use super::graft::{GraftResult, GraftState, RootSceneGraft};

/// 一次分发的结果
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    Registered {
        registry: RegistryKind,
        /// 根场景重复出现（已注册，但没有再次嫁接）
        duplicate_root: bool,
    },
    RootGrafted {
        content: Entity,
        report: ConstructorReport,
    },
    /// 图形资源，不注册
    Ignored,
    Unhandled {
        type_name: String,
    },
}

impl DispatchOutcome {
    fn registered(registry: RegistryKind) -> Self {
        DispatchOutcome::Registered {
            registry,
            duplicate_root: false,
        }
    }
}

/// 资源分发器
#[derive(Debug)]
pub struct AssetDispatcher {
    session: SessionRef,
    graft: RootSceneGraft,
}

impl AssetDispatcher {
    pub fn new(session: SessionRef) -> Self {
        Self {
            session,
            graft: RootSceneGraft::new(),
        }
    }

    pub fn graft_state(&self) -> GraftState {
        self.graft.state()
    }

    pub fn root_content(&self) -> Option<Entity> {
        self.graft.content()
    }

    pub fn dispatch(
        &mut self,
        asset: DecodedAsset,
        is_root_candidate: bool,
    ) -> DispatchResult<DispatchOutcome> {
        let (domain, loader_info) = {
            let session = self.session.borrow();
            match &session.domain {
                Some(domain) => (domain.clone(), session.loader_info.clone()),
                None => {
                    tracing::warn!(
                        target: "assets",
                        "Asset {} arrived before the execution domain was ready",
                        asset.name
                    );
                    return Err(DispatchError::DomainNotReady(asset.name));
                }
            }
        };

        let asset_type = asset.asset_type();
        let DecodedAsset {
            name,
            payload,
            is_root_scene,
        } = asset;
        tracing::trace!(target: "assets", "Dispatching {} ({:?})", name, asset_type);

        let outcome = match payload {
            AssetPayload::Text(text) => {
                define(&domain, name, Definition::Text(text), loader_info)
            }
            AssetPayload::Image(image) => {
                define(&domain, name, Definition::Image(image), loader_info)
            }
            AssetPayload::Sprite(template) => {
                define(&domain, name, Definition::Sprite(template), loader_info)
            }
            AssetPayload::Generic(generic) => {
                define(&domain, name, Definition::Generic(generic), loader_info)
            }
            AssetPayload::Audio(audio) => {
                domain
                    .borrow_mut()
                    .registries_mut()
                    .audio_definitions
                    .insert(name, audio, loader_info);
                DispatchOutcome::registered(RegistryKind::Audio)
            }
            AssetPayload::Font(font) => {
                domain
                    .borrow_mut()
                    .registries_mut()
                    .font_definitions
                    .insert(name, font, loader_info);
                DispatchOutcome::registered(RegistryKind::Fonts)
            }
            AssetPayload::Scene(scene) => {
                let template = scene.template.clone();
                let registered = define(&domain, name, Definition::Scene(scene), loader_info);
                if is_root_candidate && is_root_scene {
                    match self.graft.graft(&template, &self.session)? {
                        GraftResult::Grafted { content, report } => {
                            DispatchOutcome::RootGrafted { content, report }
                        }
                        GraftResult::Duplicate => DispatchOutcome::Registered {
                            registry: RegistryKind::Definitions,
                            duplicate_root: true,
                        },
                    }
                } else {
                    registered
                }
            }
            AssetPayload::Graphic(kind) => {
                tracing::trace!(target: "assets", "Graphic {} ({:?}) not registered", name, kind);
                DispatchOutcome::Ignored
            }
            AssetPayload::Unknown { type_name } => {
                tracing::warn!(
                    target: "assets",
                    "Unknown asset type {} for {}",
                    type_name,
                    name
                );
                DispatchOutcome::Unhandled { type_name }
            }
        };
        Ok(outcome)
    }
}

fn define(
    domain: &DomainRef,
    name: String,
    definition: Definition,
    loader_info: Option<Arc<LoaderInfo>>,
) -> DispatchOutcome {
    domain
        .borrow_mut()
        .registries_mut()
        .definitions
        .insert(name, definition, loader_info);
    DispatchOutcome::registered(RegistryKind::Definitions)
}
