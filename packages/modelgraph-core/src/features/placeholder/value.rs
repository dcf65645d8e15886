//! Placeholder model values
//!
//! [`PlaceholderValue`] is the compiled maker registered in a namespace.
//! Its type comes from, in order of precedence:
//! 1. a type bound at declaration or by an explicit `satisfy_type` call
//! 2. a callback run when the placeholder is first interpreted; callbacks
//!    typically read the frame of the element that is currently interpreting
//!
//! Interpretation yields a [`PlaceholderSynth`]. A satisfier synthesis may be
//! attached to it, in which case every runtime scope satisfies the slot from
//! that synthesis on first access.

use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::hollow::Hollow;
use crate::errors::{InstantiateResult, InterpretResult, TypeResolutionError};
use crate::features::element::InterpretEnv;
use crate::features::model_namespace::{CompiledValue, ComponentId, ModelScope};
use crate::features::value_synth::ValueSynth;
use crate::shared::models::{Identity, InstanceType, LiveValue, ModelShape};

/// Supplies a placeholder's type during interpretation
pub type TypeCallback = Arc<dyn Fn(&InterpretEnv) -> InterpretResult<InstanceType> + Send + Sync>;

pub struct PlaceholderValue {
    name: String,
    owner: Option<Identity>,
    hollow: Mutex<Hollow>,
    callback: Mutex<Option<TypeCallback>>,
}

impl PlaceholderValue {
    /// Placeholder of a known shape whose type is deferred
    pub fn new(name: impl Into<String>, shape: ModelShape, owner: Option<Identity>) -> Self {
        let name = name.into();
        Self {
            hollow: Mutex::new(Hollow::new(name.clone(), shape)),
            name,
            owner,
            callback: Mutex::new(None),
        }
    }

    /// Placeholder whose type is known at declaration
    pub fn typed(name: impl Into<String>, ty: InstanceType, owner: Option<Identity>) -> Self {
        let name = name.into();
        Self {
            hollow: Mutex::new(Hollow::typed(name.clone(), ty)),
            name,
            owner,
            callback: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Element that declared this placeholder
    pub fn owner(&self) -> Option<Identity> {
        self.owner
    }

    pub fn instance_type(&self) -> Option<InstanceType> {
        self.hollow.lock().instance_type().cloned()
    }

    /// Bind the type now; see [`Hollow::satisfy_type`]
    pub fn satisfy_type(&self, ty: InstanceType) -> InterpretResult<()> {
        self.hollow.lock().satisfy_type(ty)
    }

    /// Defer the type to a callback evaluated at interpretation
    pub fn set_type_callback(&self, callback: TypeCallback) {
        *self.callback.lock() = Some(callback);
    }

    pub fn has_type_source(&self) -> bool {
        self.hollow.lock().instance_type().is_some() || self.callback.lock().is_some()
    }
}

impl fmt::Debug for PlaceholderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaceholderValue")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("state", &self.hollow.lock().state().to_string())
            .field("callback", &self.callback.lock().is_some())
            .finish()
    }
}

impl CompiledValue for PlaceholderValue {
    fn shape(&self) -> ModelShape {
        self.hollow.lock().shape()
    }

    fn interpret(&self, id: &ComponentId, env: &mut InterpretEnv) -> InterpretResult<Arc<dyn ValueSynth>> {
        let known = self.hollow.lock().instance_type().cloned();
        let ty = match known {
            Some(ty) => ty,
            None => {
                let callback = self.callback.lock().clone();
                let Some(callback) = callback else {
                    return Err(TypeResolutionError::new(format!(
                        "Type of placeholder '{}' was not specified before being needed",
                        self.name
                    )));
                };
                let ty = callback(env).map_err(|err| {
                    err.wrap(format!("Could not determine the type of '{}'", self.name))
                })?;
                self.hollow.lock().satisfy_type(ty.clone())?;
                ty
            }
        };
        Ok(Arc::new(PlaceholderSynth::new(id.clone(), self.name.clone(), ty)))
    }

    fn as_placeholder(&self) -> Option<&PlaceholderValue> {
        Some(self)
    }
}

/// Interpreted placeholder
pub struct PlaceholderSynth {
    id: ComponentId,
    name: String,
    ty: InstanceType,
    satisfier: Mutex<Option<Arc<dyn ValueSynth>>>,
}

impl PlaceholderSynth {
    pub fn new(id: ComponentId, name: String, ty: InstanceType) -> Self {
        Self {
            id,
            name,
            ty,
            satisfier: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Satisfy every runtime slot of this placeholder from `satisfier`
    pub fn satisfy_with(&self, satisfier: Arc<dyn ValueSynth>) -> InterpretResult<()> {
        if !self.ty.is_assignable_from(satisfier.instance_type()) {
            return Err(TypeResolutionError::new(format!(
                "Cannot satisfy {} '{}' with {}",
                self.ty,
                self.name,
                satisfier.instance_type()
            )));
        }
        *self.satisfier.lock() = Some(satisfier);
        Ok(())
    }

    pub fn satisfier(&self) -> Option<Arc<dyn ValueSynth>> {
        self.satisfier.lock().clone()
    }

    /// Fresh runtime slot
    pub fn new_hollow(&self) -> Hollow {
        Hollow::typed(self.name.clone(), self.ty.clone())
    }
}

impl fmt::Debug for PlaceholderSynth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaceholderSynth")
            .field("id", &self.id)
            .field("type", &self.ty)
            .field("satisfied_by_synth", &self.satisfier.lock().is_some())
            .finish()
    }
}

impl ValueSynth for PlaceholderSynth {
    fn instance_type(&self) -> &InstanceType {
        &self.ty
    }

    fn get(&self, scope: &Arc<ModelScope>) -> InstantiateResult<LiveValue> {
        scope.get(&self.id)
    }

    fn components(&self) -> Vec<ComponentId> {
        vec![self.id.clone()]
    }

    fn as_placeholder(&self) -> Option<&PlaceholderSynth> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
