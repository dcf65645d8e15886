//! Interpreted namespace
//!
//! Turns the compiled makers of a sealed [`ModelSet`] into typed value
//! syntheses. Interpretation is lazy and memoized per component; a component
//! that is reached again while its own interpretation is running is a cycle.
//!
//! The parent link is resolved here, at interpretation time: a local model
//! sealed during definition has no parent until the element that owns it is
//! interpreted inside some enclosing namespace.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Weak};
use tracing::debug;

use super::component::{ComponentId, ComponentKind, ModelComponent};
use super::model_set::ModelSet;
use crate::errors::{InterpretResult, NamespaceError, TypeResolutionError};
use crate::features::element::InterpretEnv;
use crate::features::value_synth::{SubModelSynth, ValueSynth};
use crate::shared::models::{Identity, InstanceType};
use crate::shared::utils::split_first;

#[derive(Debug)]
enum InterpState {
    InProgress,
    Done(Arc<dyn ValueSynth>),
}

/// Component found by name resolution
#[derive(Debug, Clone)]
pub struct ResolvedComponent {
    pub id: ComponentId,
    pub instance_type: InstanceType,
    pub synth: Arc<dyn ValueSynth>,
}

#[derive(Debug)]
pub struct InterpretedModelSet {
    models: Arc<ModelSet>,
    parent: Option<Weak<InterpretedModelSet>>,
    slots: Mutex<FxHashMap<ComponentId, InterpState>>,
    subs: Mutex<FxHashMap<ComponentId, Arc<InterpretedModelSet>>>,
}

impl InterpretedModelSet {
    pub fn new(models: Arc<ModelSet>, parent: Option<&Arc<InterpretedModelSet>>) -> Arc<Self> {
        Arc::new(Self {
            models,
            parent: parent.map(Arc::downgrade),
            slots: Mutex::new(FxHashMap::default()),
            subs: Mutex::new(FxHashMap::default()),
        })
    }

    pub fn models(&self) -> &Arc<ModelSet> {
        &self.models
    }

    pub fn id(&self) -> Identity {
        self.models.id()
    }

    pub fn parent(&self) -> Option<Arc<InterpretedModelSet>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Resolve a dotted path through this set and then its parents
    pub fn resolve(
        self: &Arc<Self>,
        path: &str,
        env: &mut InterpretEnv,
    ) -> InterpretResult<ResolvedComponent> {
        let (first, _) = split_first(path);
        let mut current = Some(self.clone());
        while let Some(set) = current {
            if set.models.get_local(first).is_some() {
                return set.resolve_here(path, env);
            }
            current = set.parent();
        }
        Err(NamespaceError::not_found(path).into())
    }

    /// Whether `path` would resolve through this set or its parents.
    /// Nothing is interpreted.
    pub fn contains_path(&self, path: &str) -> bool {
        let (first, _) = split_first(path);
        if self.models.get_local(first).is_some() {
            return self.models.get_component(path).is_ok();
        }
        self.parent().map_or(false, |parent| parent.contains_path(path))
    }

    /// Resolve a dotted path in this set only
    pub fn resolve_here(
        self: &Arc<Self>,
        path: &str,
        env: &mut InterpretEnv,
    ) -> InterpretResult<ResolvedComponent> {
        let (first, rest) = split_first(path);
        let component = self
            .models
            .get_local(first)
            .cloned()
            .ok_or_else(|| NamespaceError::not_found(path))?;
        match rest {
            None => {
                let synth = self.interpret_component(&component, env)?;
                Ok(ResolvedComponent {
                    id: component.id.clone(),
                    instance_type: synth.instance_type().clone(),
                    synth,
                })
            }
            Some(rest) => {
                let Some(sub_model) = component.as_sub_model() else {
                    return Err(NamespaceError::not_found_because(
                        path,
                        format!("'{}' is not a model", first),
                    )
                    .into());
                };
                if let Err(NamespaceError::NotFound { detail, .. }) = sub_model.get_component(rest) {
                    return Err(NamespaceError::NotFound {
                        path: path.to_string(),
                        detail,
                    }
                    .into());
                }
                let sub = self.interpret_sub_model(&component, env)?;
                sub.resolve_here(rest, env)
            }
        }
    }

    /// Interpret the component with this id, which must belong to this set's tree
    pub fn interpret_id(
        self: &Arc<Self>,
        id: &ComponentId,
        env: &mut InterpretEnv,
    ) -> InterpretResult<Arc<dyn ValueSynth>> {
        let resolved = self.resolve_here(&id.path, env)?;
        if &resolved.id != id {
            return Err(TypeResolutionError::new(format!(
                "Component '{}' is shadowed in '{}'",
                id,
                self.models.label()
            )));
        }
        Ok(resolved.synth)
    }

    fn interpret_component(
        self: &Arc<Self>,
        component: &Arc<ModelComponent>,
        env: &mut InterpretEnv,
    ) -> InterpretResult<Arc<dyn ValueSynth>> {
        {
            let mut slots = self.slots.lock();
            match slots.get(&component.id) {
                Some(InterpState::Done(synth)) => return Ok(synth.clone()),
                Some(InterpState::InProgress) => {
                    return Err(TypeResolutionError::new(format!(
                        "Dynamic value cycle detected at '{}'",
                        component.id
                    ))
                    .at_opt(component.position.clone()))
                }
                None => {
                    slots.insert(component.id.clone(), InterpState::InProgress);
                }
            }
        }

        let result = match &component.kind {
            ComponentKind::Value(compiled) => {
                let previous = env.swap_models(self.clone());
                let result = compiled.interpret(&component.id, env);
                env.swap_models(previous);
                result.map_err(|err| err.at_opt(component.position.clone()))
            }
            ComponentKind::SubModel(_) => self
                .interpret_sub_model(component, env)
                .map(|_| Arc::new(SubModelSynth::new()) as Arc<dyn ValueSynth>),
        };

        let mut slots = self.slots.lock();
        match result {
            Ok(synth) => {
                debug!(component = %component.id, ty = %synth.instance_type(), "namespace: interpreted");
                slots.insert(component.id.clone(), InterpState::Done(synth.clone()));
                Ok(synth)
            }
            Err(err) => {
                slots.remove(&component.id);
                Err(err)
            }
        }
    }

    fn interpret_sub_model(
        self: &Arc<Self>,
        component: &Arc<ModelComponent>,
        env: &mut InterpretEnv,
    ) -> InterpretResult<Arc<InterpretedModelSet>> {
        if let Some(sub) = self.subs.lock().get(&component.id) {
            return Ok(sub.clone());
        }
        let model = component.as_sub_model().cloned().ok_or_else(|| {
            TypeResolutionError::new(format!("'{}' is not a model", component.id))
        })?;
        let sub = InterpretedModelSet::new(model, Some(self));
        self.subs.lock().insert(component.id.clone(), sub.clone());
        sub.interpret_all(env)?;
        Ok(sub)
    }

    /// Interpret every visible component, in declaration order
    pub fn interpret_all(self: &Arc<Self>, env: &mut InterpretEnv) -> InterpretResult<()> {
        for component in self.models.visible_components() {
            self.interpret_component(&component, env)?;
        }
        Ok(())
    }

    /// Synthesis of an already interpreted component of this set's tree
    pub fn synth(&self, id: &ComponentId) -> Option<Arc<dyn ValueSynth>> {
        if let Some(InterpState::Done(synth)) = self.slots.lock().get(id) {
            return Some(synth.clone());
        }
        let subs: Vec<_> = self.subs.lock().values().cloned().collect();
        subs.iter().find_map(|sub| sub.synth(id))
    }

    /// Ids of interpreted components, sub-models included
    pub fn interpreted_ids(&self) -> Vec<ComponentId> {
        let mut ids: Vec<ComponentId> = self
            .slots
            .lock()
            .iter()
            .filter(|(_, state)| matches!(state, InterpState::Done(_)))
            .map(|(id, _)| id.clone())
            .collect();
        for sub in self.subs.lock().values() {
            ids.extend(sub.interpreted_ids());
        }
        ids.sort();
        ids
    }

    /// Whether runtime values of components owned by `model` live in scopes
    /// built from this set
    pub fn owns(&self, model: Identity) -> bool {
        self.models.owns(model)
    }
}
