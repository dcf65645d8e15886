//! Instance phase
//!
//! An [`ElementInstance`] binds an interpretation to a runtime [`ModelScope`].
//! Elements with a local model get a child scope of their own; it is kept
//! across updates as long as it still instantiates the same interpreted
//! namespace under the same parent.
//!
//! [`ElementInstance::instantiated`] runs the one-time hooks of instances that
//! were freshly built. Updated and copied instances keep their flag, so the
//! hooks (and the `loaded` event) fire once per instance.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::interpretation::{ElementInterp, KindInterp};
use crate::errors::{InstantiateResult, InstantiationError};
use crate::features::addons::{AddOnInstance, AddOnInterp, AddOnSet};
use crate::features::model_namespace::ModelScope;
use crate::features::reconciliation::{synchronize, SyncHandler, SyncStats};
use crate::shared::models::{EventStream, Identity, LiveValue, Value, ValueType};

/// Element-kind logic of the instance phase
pub trait KindInstance: fmt::Debug + 'static {
    fn update(&mut self, interp: &dyn KindInterp, scope: &Arc<ModelScope>) -> InstantiateResult<()>;

    /// One-time hook of a freshly built instance
    fn instantiated(&mut self) {}

    /// Runtime value the element stands for, if it declares one
    fn live_value(&self) -> Option<LiveValue> {
        None
    }

    /// Same kind state, not yet bound to a scope
    fn copy(&self) -> Box<dyn KindInstance>;

    fn destroy(&mut self) {}

    fn as_any(&self) -> &dyn Any;
}

#[derive(Debug)]
pub struct ElementInstance {
    identity: Identity,
    type_name: String,
    kind: Box<dyn KindInstance>,
    add_ons: AddOnSet<dyn AddOnInstance>,
    children: Vec<ElementInstance>,
    scope: Option<Arc<ModelScope>>,
    instantiated: bool,
    destroyed: bool,
    loaded: EventStream,
    last_sync: SyncStats,
}

impl ElementInstance {
    pub fn new(interp: &ElementInterp) -> Self {
        Self {
            identity: interp.identity(),
            type_name: interp.type_name().to_string(),
            kind: interp.kind().create(),
            add_ons: AddOnSet::new(),
            children: Vec::new(),
            scope: None,
            instantiated: false,
            destroyed: false,
            loaded: EventStream::new(ValueType::Any),
            last_sync: SyncStats::default(),
        }
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn kind_as<K: 'static>(&self) -> Option<&K> {
        self.kind.as_any().downcast_ref::<K>()
    }

    pub fn add_ons(&self) -> &AddOnSet<dyn AddOnInstance> {
        &self.add_ons
    }

    pub fn children(&self) -> &[ElementInstance] {
        &self.children
    }

    /// Scope this instance's children and add-ons see
    pub fn scope(&self) -> Option<&Arc<ModelScope>> {
        self.scope.as_ref()
    }

    pub fn live_value(&self) -> Option<LiveValue> {
        self.kind.live_value()
    }

    pub fn is_instantiated(&self) -> bool {
        self.instantiated
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Fires once, when the instance's one-time hooks have run
    pub fn loaded(&self) -> &EventStream {
        &self.loaded
    }

    pub fn last_sync(&self) -> SyncStats {
        self.last_sync
    }

    /// Depth-first search by identity
    pub fn find(&self, identity: Identity) -> Option<&ElementInstance> {
        if self.identity == identity {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(identity))
    }

    pub fn update(&mut self, interp: &ElementInterp, scope: &Arc<ModelScope>) -> InstantiateResult<()> {
        if interp.identity() != self.identity {
            return Err(InstantiationError::new(format!(
                "Instance {} cannot be updated from interpretation {}",
                self.identity,
                interp.identity()
            )));
        }
        let scope = match interp.local_models() {
            Some(models) => match &self.scope {
                Some(existing) if existing.is_instance_of(&models, scope) => existing.clone(),
                _ => ModelScope::instantiate(models, Some(scope.clone())),
            },
            None => scope.clone(),
        };
        self.scope = Some(scope.clone());
        debug!(element = %self.type_name, identity = %self.identity, scope = %scope.id(), "instance: update");

        let interps: Vec<&dyn AddOnInterp> = interp.add_ons().iter().collect();
        synchronize(
            self.add_ons.items_mut(),
            &interps,
            |inst, i| inst.add_on_name() == i.add_on_name(),
            &mut AddOnInstanceSync,
        )?;

        for add_on in self.add_ons.iter_mut() {
            let counterpart = paired(interp, add_on.add_on_name())?;
            add_on.pre_update(counterpart, &scope)?;
        }
        for add_on in self.add_ons.iter_mut() {
            let counterpart = paired(interp, add_on.add_on_name())?;
            add_on.update(counterpart, &scope)?;
        }

        self.kind.update(interp.kind(), &scope)?;

        let children: Vec<&ElementInterp> = interp.children().iter().collect();
        self.last_sync = synchronize(
            &mut self.children,
            &children,
            |inst, i| inst.identity == i.identity(),
            &mut InstanceSync { scope: &scope },
        )?;

        for add_on in self.add_ons.iter_mut() {
            let counterpart = paired(interp, add_on.add_on_name())?;
            add_on.post_update(counterpart, &scope)?;
        }
        Ok(())
    }

    /// Run one-time hooks on every instance of this tree not yet instantiated
    pub fn instantiated(&mut self) {
        let fresh = !self.instantiated;
        if fresh {
            for add_on in self.add_ons.iter_mut() {
                add_on.pre_instantiated();
            }
        }
        for child in &mut self.children {
            child.instantiated();
        }
        if fresh {
            self.kind.instantiated();
            for add_on in self.add_ons.iter_mut() {
                add_on.instantiated();
            }
            self.instantiated = true;
            self.loaded.fire(&Value::Null);
        }
    }

    /// Structurally identical instance bound to `scope`. Live values are
    /// rebound; instantiation flags carry over.
    pub fn copy(&self, interp: &ElementInterp, scope: &Arc<ModelScope>) -> InstantiateResult<ElementInstance> {
        let mut copy = self.unbound();
        copy.update(interp, scope)?;
        Ok(copy)
    }

    fn unbound(&self) -> ElementInstance {
        let mut add_ons = AddOnSet::new();
        for add_on in self.add_ons.iter() {
            add_ons.push(add_on.copy());
        }
        ElementInstance {
            identity: self.identity,
            type_name: self.type_name.clone(),
            kind: self.kind.copy(),
            add_ons,
            children: self.children.iter().map(ElementInstance::unbound).collect(),
            scope: None,
            instantiated: self.instantiated,
            destroyed: false,
            loaded: EventStream::new(ValueType::Any),
            last_sync: SyncStats::default(),
        }
    }

    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        for child in &mut self.children {
            child.destroy();
        }
        for add_on in self.add_ons.iter_mut() {
            add_on.destroy();
        }
        self.kind.destroy();
        self.scope = None;
        self.destroyed = true;
        debug!(identity = %self.identity, "instance: destroyed");
    }
}

fn paired<'a>(interp: &'a ElementInterp, name: &str) -> InstantiateResult<&'a dyn AddOnInterp> {
    interp.add_ons().get_named(name).ok_or_else(|| {
        InstantiationError::new(format!(
            "Add-on '{}' of {} has no interpretation",
            name,
            interp.type_name()
        ))
    })
}

struct AddOnInstanceSync;

impl SyncHandler<Box<dyn AddOnInstance>, dyn AddOnInterp> for AddOnInstanceSync {
    type Error = InstantiationError;

    fn left_only(&mut self, mut left: Box<dyn AddOnInstance>) -> InstantiateResult<()> {
        left.destroy();
        Ok(())
    }

    fn right_only(&mut self, interp: &dyn AddOnInterp, _index: usize) -> InstantiateResult<Option<Box<dyn AddOnInstance>>> {
        Ok(interp.create())
    }

    fn common(&mut self, _left: &mut Box<dyn AddOnInstance>, _interp: &dyn AddOnInterp, _index: usize) -> InstantiateResult<()> {
        Ok(())
    }
}

/// Reconciles child instances against child interpretations by identity
pub(crate) struct InstanceSync<'a> {
    pub(crate) scope: &'a Arc<ModelScope>,
}

impl SyncHandler<ElementInstance, ElementInterp> for InstanceSync<'_> {
    type Error = InstantiationError;

    fn left_only(&mut self, mut left: ElementInstance) -> InstantiateResult<()> {
        left.destroy();
        Ok(())
    }

    fn right_only(&mut self, interp: &ElementInterp, _index: usize) -> InstantiateResult<Option<ElementInstance>> {
        let mut instance = ElementInstance::new(interp);
        instance.update(interp, self.scope)?;
        Ok(Some(instance))
    }

    fn common(&mut self, left: &mut ElementInstance, interp: &ElementInterp, _index: usize) -> InstantiateResult<()> {
        left.update(interp, self.scope)
    }
}
