//! Stateful container syntheses

use parking_lot::Mutex;
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

use super::ValueSynth;
use crate::errors::{InstantiateResult, InstantiationError};
use crate::features::model_namespace::{ComponentId, ModelScope};
use crate::features::sort::{SortComparator, Sorting};
use crate::shared::models::{EventStream, InstanceType, LiveCollection, LiveValue, SettableValue, Value, ValueType};

/// Settable value with an optional initializer
#[derive(Debug)]
pub struct SettableSynth {
    ty: InstanceType,
    init: Option<Arc<dyn ValueSynth>>,
}

impl SettableSynth {
    pub fn new(ty: ValueType, init: Option<Arc<dyn ValueSynth>>) -> Self {
        Self {
            ty: InstanceType::value(ty),
            init,
        }
    }

    fn value_type(&self) -> ValueType {
        self.ty.element_type().cloned().unwrap_or_default()
    }
}

impl ValueSynth for SettableSynth {
    fn instance_type(&self) -> &InstanceType {
        &self.ty
    }

    fn get(&self, scope: &Arc<ModelScope>) -> InstantiateResult<LiveValue> {
        let initial = match &self.init {
            Some(init) => init.current(scope)?,
            None => Value::Null,
        };
        let ty = self.value_type();
        let initial = initial.convert_to(&ty).map_err(InstantiationError::new)?;
        Ok(LiveValue::Value(SettableValue::new(ty, initial)))
    }

    fn is_stateful(&self) -> bool {
        true
    }

    fn components(&self) -> Vec<ComponentId> {
        self.init.as_ref().map(|i| i.components()).unwrap_or_default()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct EventSynth {
    ty: InstanceType,
}

impl EventSynth {
    pub fn new(ty: ValueType) -> Self {
        Self {
            ty: InstanceType::event(ty),
        }
    }
}

impl ValueSynth for EventSynth {
    fn instance_type(&self) -> &InstanceType {
        &self.ty
    }

    fn get(&self, _scope: &Arc<ModelScope>) -> InstantiateResult<LiveValue> {
        let ty = self.ty.element_type().cloned().unwrap_or_default();
        Ok(LiveValue::Event(EventStream::new(ty)))
    }

    fn is_stateful(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Collection, optionally kept sorted
///
/// The sorting is attached after construction because the sort element is a
/// child of the collection element and is interpreted after it.
#[derive(Debug)]
pub struct CollectionSynth {
    ty: InstanceType,
    init: Vec<Arc<dyn ValueSynth>>,
    sorting: Mutex<Option<Arc<Sorting>>>,
}

impl CollectionSynth {
    pub fn new(ty: ValueType, init: Vec<Arc<dyn ValueSynth>>) -> Self {
        Self {
            ty: InstanceType::collection(ty),
            init,
            sorting: Mutex::new(None),
        }
    }

    pub fn element_type(&self) -> ValueType {
        self.ty.element_type().cloned().unwrap_or_default()
    }

    pub fn set_sorting(&self, sorting: Option<Arc<Sorting>>) {
        *self.sorting.lock() = sorting;
    }

    pub fn sorting(&self) -> Option<Arc<Sorting>> {
        self.sorting.lock().clone()
    }
}

impl ValueSynth for CollectionSynth {
    fn instance_type(&self) -> &InstanceType {
        &self.ty
    }

    fn get(&self, scope: &Arc<ModelScope>) -> InstantiateResult<LiveValue> {
        let ty = self.element_type();
        let mut items = Vec::with_capacity(self.init.len());
        for init in &self.init {
            match init.current(scope)? {
                Value::List(values) => {
                    for value in values {
                        items.push(value.convert_to(&ty).map_err(InstantiationError::new)?);
                    }
                }
                value => items.push(value.convert_to(&ty).map_err(InstantiationError::new)?),
            }
        }
        match self.sorting() {
            Some(sorting) => {
                let comparator = SortComparator::new(sorting, scope)?;
                comparator.sort(&mut items)?;
                debug!(len = items.len(), "collection: sorted initial items");
                Ok(LiveValue::Collection(LiveCollection::sorted(ty, items)))
            }
            None => Ok(LiveValue::Collection(LiveCollection::new(ty, items))),
        }
    }

    fn is_stateful(&self) -> bool {
        true
    }

    fn components(&self) -> Vec<ComponentId> {
        self.init.iter().flat_map(|i| i.components()).collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Stand-in synthesis for sub-model components
#[derive(Debug)]
pub struct SubModelSynth {
    ty: InstanceType,
}

impl SubModelSynth {
    pub fn new() -> Self {
        Self {
            ty: InstanceType::sub_model(),
        }
    }
}

impl Default for SubModelSynth {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueSynth for SubModelSynth {
    fn instance_type(&self) -> &InstanceType {
        &self.ty
    }

    fn get(&self, _scope: &Arc<ModelScope>) -> InstantiateResult<LiveValue> {
        Ok(LiveValue::Model)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
