//! Constant syntheses

use std::any::Any;
use std::sync::Arc;

use super::ValueSynth;
use crate::errors::{InstantiateResult, InterpretResult};
use crate::features::element::InterpretEnv;
use crate::features::model_namespace::{CompiledValue, ComponentId, ModelScope};
use crate::shared::models::{InstanceType, LiveValue, ModelShape, Value, ValueType};

/// Fixed value; every read returns a fresh read-only container
#[derive(Debug, Clone)]
pub struct ConstantSynth {
    ty: InstanceType,
    value: Value,
}

impl ConstantSynth {
    pub fn new(ty: ValueType, value: Value) -> Self {
        Self {
            ty: InstanceType::value(ty),
            value,
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    fn value_type(&self) -> ValueType {
        self.ty.element_type().cloned().unwrap_or_default()
    }
}

impl ValueSynth for ConstantSynth {
    fn instance_type(&self) -> &InstanceType {
        &self.ty
    }

    fn get(&self, _scope: &Arc<ModelScope>) -> InstantiateResult<LiveValue> {
        Ok(LiveValue::constant(self.value_type(), self.value.clone()))
    }

    fn current(&self, _scope: &Arc<ModelScope>) -> InstantiateResult<Value> {
        Ok(self.value.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Compiled constant, for embedder-provided environments
#[derive(Debug, Clone)]
pub struct ConstantValue {
    ty: ValueType,
    value: Value,
}

impl ConstantValue {
    pub fn new(ty: ValueType, value: Value) -> Self {
        Self { ty, value }
    }
}

impl CompiledValue for ConstantValue {
    fn shape(&self) -> ModelShape {
        ModelShape::Value
    }

    fn interpret(&self, _id: &ComponentId, _env: &mut InterpretEnv) -> InterpretResult<Arc<dyn ValueSynth>> {
        Ok(Arc::new(ConstantSynth::new(self.ty.clone(), self.value.clone())))
    }
}
