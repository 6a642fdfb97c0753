//! 内容工厂
//!
//! 引导成功后交给宿主的能力对象：在执行域内构造显示对象。

use bevy_ecs::entity::Entity;

use crate::core::error::{FactoryError, FactoryResult};
use crate::domain::{CatalogResolution, DomainRef};

/// 内容工厂
#[derive(Debug, Clone)]
pub struct ContentFactory {
    domain: DomainRef,
}

impl ContentFactory {
    pub fn new(domain: DomainRef) -> Self {
        Self { domain }
    }

    pub fn domain(&self) -> &DomainRef {
        &self.domain
    }

    /// 按定义名实例化一个未挂载的显示对象
    ///
    /// 注册表中没有的名字会先经由模块目录解析。
    pub fn create_instance(&self, definition_name: &str) -> FactoryResult<Entity> {
        let resolution = self.domain.borrow_mut().resolve_definition(definition_name)?;
        tracing::trace!(target: "bootstrap", "Resolved {}: {:?}", definition_name, resolution);

        let domain = self.domain.borrow();
        let template = match domain.registries().definitions.get(definition_name) {
            Some(entry) => entry
                .value
                .template()
                .cloned()
                .ok_or_else(|| FactoryError::NotInstantiable(definition_name.to_string()))?,
            None => {
                if matches!(resolution, CatalogResolution::NotFound) {
                    tracing::debug!(target: "bootstrap", "No definition or catalog entry for {}", definition_name);
                }
                return Err(FactoryError::UnknownDefinition(definition_name.to_string()));
            }
        };
        let stage = domain.stage().cloned().ok_or(FactoryError::NoStage)?;
        drop(domain);

        let entity = stage.borrow_mut().tree_mut().instantiate(&template);
        Ok(entity)
    }

    /// 创建一个空的显示对象
    pub fn create_sprite(&self, name: &str) -> FactoryResult<Entity> {
        let stage = self
            .domain
            .borrow()
            .stage()
            .cloned()
            .ok_or(FactoryError::NoStage)?;
        let entity = stage.borrow_mut().tree_mut().spawn_node(name, 1);
        Ok(entity)
    }
}
