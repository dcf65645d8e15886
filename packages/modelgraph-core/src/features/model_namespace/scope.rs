//! Runtime model scopes
//!
//! A [`ModelScope`] holds the live values of one instantiation of an
//! [`InterpretedModelSet`]. Values are created on first access. Stateful
//! syntheses (settable values, events, collections) are cached per scope;
//! derived ones are recomputed on every read. Placeholders get a hollow slot
//! per scope, so each copy of a scope is satisfied independently.

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use tracing::trace;

use super::component::ComponentId;
use super::interpreted::InterpretedModelSet;
use crate::errors::{InstantiateResult, InstantiationError, NamespaceError};
use crate::features::placeholder::{Hollow, SatisfyPolicy};
use crate::shared::models::{Identity, LiveValue, Value};
use crate::shared::utils::split_first;

#[derive(Debug, Clone)]
enum Slot {
    Live(LiveValue),
    Hollow(Hollow),
}

#[derive(Debug)]
pub struct ModelScope {
    id: Identity,
    models: Arc<InterpretedModelSet>,
    parent: Option<Arc<ModelScope>>,
    slots: Mutex<FxHashMap<ComponentId, Slot>>,
    building: Mutex<FxHashSet<ComponentId>>,
}

impl ModelScope {
    pub fn instantiate(
        models: Arc<InterpretedModelSet>,
        parent: Option<Arc<ModelScope>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: Identity::fresh(),
            models,
            parent,
            slots: Mutex::new(FxHashMap::default()),
            building: Mutex::new(FxHashSet::default()),
        })
    }

    /// Identity of this particular scope instance
    pub fn id(&self) -> Identity {
        self.id
    }

    pub fn models(&self) -> &Arc<InterpretedModelSet> {
        &self.models
    }

    pub fn parent(&self) -> Option<&Arc<ModelScope>> {
        self.parent.as_ref()
    }

    /// Scope that holds values for `id`: this one or an ancestor
    fn owner_of(self: &Arc<Self>, id: &ComponentId) -> InstantiateResult<Arc<ModelScope>> {
        let mut current = Some(self.clone());
        while let Some(scope) = current {
            if scope.models.owns(id.model) {
                return Ok(scope);
            }
            current = scope.parent.clone();
        }
        Err(InstantiationError::new(format!(
            "Model value '{}' is not available in this scope",
            id
        )))
    }

    /// Live value of a component, creating it on first access
    pub fn get(self: &Arc<Self>, id: &ComponentId) -> InstantiateResult<LiveValue> {
        let owner = self.owner_of(id)?;
        owner.get_owned(id)
    }

    fn get_owned(self: &Arc<Self>, id: &ComponentId) -> InstantiateResult<LiveValue> {
        if let Some(slot) = self.slots.lock().get(id) {
            return match slot {
                Slot::Live(value) => Ok(value.clone()),
                Slot::Hollow(hollow) => hollow.value().cloned(),
            };
        }

        let synth = self.models.synth(id).ok_or_else(|| {
            InstantiationError::new(format!("Model value '{}' was never interpreted", id))
        })?;

        if let Some(placeholder) = synth.as_placeholder() {
            self.ensure_hollow(id)?;
            if let Some(satisfier) = placeholder.satisfier() {
                let value = self.build_guarded(id, || satisfier.get(self))?;
                self.satisfy_owned(id, value, SatisfyPolicy::Replace)?;
            }
            return match self.slots.lock().get(id) {
                Some(Slot::Hollow(hollow)) => hollow.value().cloned(),
                Some(Slot::Live(value)) => Ok(value.clone()),
                None => Err(InstantiationError::new(format!("Model value '{}' vanished", id))),
            };
        }

        if !synth.is_stateful() {
            return self.build_guarded(id, || synth.get(self));
        }

        let value = self.build_guarded(id, || synth.get(self))?;
        trace!(component = %id, "scope: created value");
        let mut slots = self.slots.lock();
        let slot = slots.entry(id.clone()).or_insert(Slot::Live(value));
        match slot {
            Slot::Live(value) => Ok(value.clone()),
            Slot::Hollow(hollow) => hollow.value().cloned(),
        }
    }

    fn build_guarded<F>(&self, id: &ComponentId, build: F) -> InstantiateResult<LiveValue>
    where
        F: FnOnce() -> InstantiateResult<LiveValue>,
    {
        if !self.building.lock().insert(id.clone()) {
            return Err(InstantiationError::new(format!(
                "Cycle while creating model value '{}'",
                id
            )));
        }
        let result = build();
        self.building.lock().remove(id);
        result
    }

    fn ensure_hollow(&self, id: &ComponentId) -> InstantiateResult<()> {
        let synth = self.models.synth(id);
        let placeholder = synth.as_ref().and_then(|s| s.as_placeholder());
        let Some(placeholder) = placeholder else {
            return Err(InstantiationError::new(format!(
                "Model value '{}' is not a placeholder",
                id
            )));
        };
        self.slots
            .lock()
            .entry(id.clone())
            .or_insert_with(|| Slot::Hollow(placeholder.new_hollow()));
        Ok(())
    }

    /// Write a live value into a placeholder slot
    ///
    /// Returns whether the value was stored; `false` only under
    /// [`SatisfyPolicy::Ignore`] when the slot was already satisfied.
    pub fn satisfy(
        self: &Arc<Self>,
        id: &ComponentId,
        value: LiveValue,
        policy: SatisfyPolicy,
    ) -> InstantiateResult<bool> {
        let owner = self.owner_of(id)?;
        owner.satisfy_owned(id, value, policy)
    }

    fn satisfy_owned(
        &self,
        id: &ComponentId,
        value: LiveValue,
        policy: SatisfyPolicy,
    ) -> InstantiateResult<bool> {
        self.ensure_hollow(id)?;
        let mut slots = self.slots.lock();
        match slots.get_mut(id) {
            Some(Slot::Hollow(hollow)) => {
                trace!(component = %id, ?policy, "scope: satisfy placeholder");
                hollow.satisfy_value(value, policy)
            }
            _ => Err(InstantiationError::new(format!(
                "Model value '{}' is not a placeholder",
                id
            ))),
        }
    }

    pub fn is_satisfied(self: &Arc<Self>, id: &ComponentId) -> bool {
        let Ok(owner) = self.owner_of(id) else {
            return false;
        };
        let slots = owner.slots.lock();
        matches!(slots.get(id), Some(Slot::Hollow(h)) if h.is_satisfied())
    }

    /// Live value at a dotted path, resolved against the interpreted chain
    pub fn get_path(self: &Arc<Self>, path: &str) -> InstantiateResult<LiveValue> {
        let id = self.find_id(path)?;
        self.get(&id)
    }

    /// Current plain value at a dotted path
    pub fn value_at(self: &Arc<Self>, path: &str) -> InstantiateResult<Value> {
        Ok(self.get_path(path)?.current())
    }

    /// Component id for a dotted path, searching this scope then its parents
    pub fn find_id(&self, path: &str) -> InstantiateResult<ComponentId> {
        let (first, _) = split_first(path);
        let mut current = Some(self);
        while let Some(scope) = current {
            let models = scope.models.models();
            if models.get_local(first).is_some() {
                return models
                    .get_component(path)
                    .map(|c| c.id.clone())
                    .map_err(InstantiationError::from);
            }
            current = scope.parent.as_deref();
        }
        Err(NamespaceError::not_found(path).into())
    }

    /// New top scope over the same models and parent, with fresh values and
    /// fresh placeholder slots
    pub fn copy(&self) -> Arc<Self> {
        Self::instantiate(self.models.clone(), self.parent.clone())
    }

    /// Whether this scope instantiates `models` under `parent`
    pub fn is_instance_of(
        &self,
        models: &Arc<InterpretedModelSet>,
        parent: &Arc<ModelScope>,
    ) -> bool {
        Arc::ptr_eq(&self.models, models)
            && self
                .parent
                .as_ref()
                .map_or(false, |p| Arc::ptr_eq(p, parent))
    }
}
