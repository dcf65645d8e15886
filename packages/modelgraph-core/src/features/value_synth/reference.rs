//! Syntheses that read other components

use std::any::Any;
use std::sync::Arc;

use super::ValueSynth;
use crate::errors::{InstantiateResult, InstantiationError};
use crate::features::model_namespace::{ComponentId, ModelScope};
use crate::shared::models::{InstanceType, LiveValue, Value, ValueType};

/// Reads the live value of a namespace component
#[derive(Debug, Clone)]
pub struct ComponentRef {
    id: ComponentId,
    ty: InstanceType,
}

impl ComponentRef {
    pub fn new(id: ComponentId, ty: InstanceType) -> Self {
        Self { id, ty }
    }

    pub fn id(&self) -> &ComponentId {
        &self.id
    }
}

impl ValueSynth for ComponentRef {
    fn instance_type(&self) -> &InstanceType {
        &self.ty
    }

    fn get(&self, scope: &Arc<ModelScope>) -> InstantiateResult<LiveValue> {
        scope.get(&self.id)
    }

    fn components(&self) -> Vec<ComponentId> {
        vec![self.id.clone()]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Converts a single value into another element type
#[derive(Debug)]
pub struct ConvertSynth {
    source: Arc<dyn ValueSynth>,
    ty: InstanceType,
}

impl ConvertSynth {
    /// Wrap `source` when its type differs from `target`
    pub fn wrap(source: Arc<dyn ValueSynth>, target: &ValueType) -> Arc<dyn ValueSynth> {
        let same = source
            .instance_type()
            .element_type()
            .map_or(false, |ty| target.is_assignable_from(ty));
        if same {
            source
        } else {
            Arc::new(Self {
                source,
                ty: InstanceType::value(target.clone()),
            })
        }
    }

    fn target(&self) -> ValueType {
        self.ty.element_type().cloned().unwrap_or_default()
    }
}

impl ValueSynth for ConvertSynth {
    fn instance_type(&self) -> &InstanceType {
        &self.ty
    }

    fn get(&self, scope: &Arc<ModelScope>) -> InstantiateResult<LiveValue> {
        let value = self.current(scope)?;
        Ok(LiveValue::constant(self.target(), value))
    }

    fn current(&self, scope: &Arc<ModelScope>) -> InstantiateResult<Value> {
        let raw = self.source.current(scope)?;
        raw.convert_to(&self.target()).map_err(InstantiationError::new)
    }

    fn components(&self) -> Vec<ComponentId> {
        self.source.components()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
