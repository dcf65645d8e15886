//! Interpretation phase
//!
//! An [`ElementInterp`] resolves the types of one definition against an
//! [`InterpretEnv`]. While it updates, the element has a frame on the env, so
//! placeholder type callbacks declared by the element can read what the
//! element has exposed so far. Namespace changes made by add-ons (a local
//! model swapped in) are undone when the element's update ends.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::definition::{DefCore, ElementDef, KindDef};
use super::env::InterpretEnv;
use super::instance::KindInstance;
use crate::errors::{InterpretResult, TypeResolutionError};
use crate::features::addons::{AddOnDef, AddOnInterp, AddOnSet};
use crate::features::model_namespace::InterpretedModelSet;
use crate::features::reconciliation::{synchronize, SyncHandler, SyncStats};
use crate::shared::models::Identity;

/// Element-kind logic of the interpretation phase
pub trait KindInterp: fmt::Debug + 'static {
    /// Runs in the enclosing element's environment, before this element's
    /// frame is entered and before its add-ons run
    fn pre_update(&mut self, _def: &dyn KindDef, _core: &DefCore, _env: &mut InterpretEnv) -> InterpretResult<()> {
        Ok(())
    }

    fn update(
        &mut self,
        def: &dyn KindDef,
        core: &DefCore,
        add_ons: &AddOnSet<dyn AddOnInterp>,
        env: &mut InterpretEnv,
    ) -> InterpretResult<()>;

    /// Runs after the children are interpreted
    fn post_update(
        &mut self,
        _def: &dyn KindDef,
        _core: &DefCore,
        _add_ons: &AddOnSet<dyn AddOnInterp>,
        _children: &[ElementInterp],
        _env: &mut InterpretEnv,
    ) -> InterpretResult<()> {
        Ok(())
    }

    fn create(&self) -> Box<dyn KindInstance>;

    fn destroy(&mut self) {}

    fn as_any(&self) -> &dyn Any;
}

#[derive(Debug)]
pub struct ElementInterp {
    identity: Identity,
    type_name: String,
    kind: Box<dyn KindInterp>,
    add_ons: AddOnSet<dyn AddOnInterp>,
    children: Vec<ElementInterp>,
    last_sync: SyncStats,
    destroyed: bool,
}

impl ElementInterp {
    pub fn new(def: &ElementDef) -> Self {
        Self {
            identity: def.identity(),
            type_name: def.type_name().to_string(),
            kind: def.kind().interpret(),
            add_ons: AddOnSet::new(),
            children: Vec::new(),
            last_sync: SyncStats::default(),
            destroyed: false,
        }
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn kind(&self) -> &dyn KindInterp {
        self.kind.as_ref()
    }

    pub fn kind_as<K: 'static>(&self) -> Option<&K> {
        self.kind.as_any().downcast_ref::<K>()
    }

    pub fn add_ons(&self) -> &AddOnSet<dyn AddOnInterp> {
        &self.add_ons
    }

    pub fn children(&self) -> &[ElementInterp] {
        &self.children
    }

    pub fn last_sync(&self) -> SyncStats {
        self.last_sync
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Private namespace contributed by an add-on, if any
    pub fn local_models(&self) -> Option<Arc<InterpretedModelSet>> {
        self.add_ons.iter().find_map(|a| a.local_models())
    }

    /// Depth-first search by identity
    pub fn find(&self, identity: Identity) -> Option<&ElementInterp> {
        if self.identity == identity {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(identity))
    }

    pub fn update(&mut self, def: &ElementDef, env: &mut InterpretEnv) -> InterpretResult<()> {
        let core = def.core();
        self.kind.pre_update(def.kind(), core, env)?;

        let mark = env.models().clone();
        env.enter(self.identity, &self.type_name);
        let result = self.update_inner(def, env);
        env.exit();
        env.swap_models(mark);
        result.map_err(|err| err.at(core.position.clone(), core.type_name.len()))
    }

    fn update_inner(&mut self, def: &ElementDef, env: &mut InterpretEnv) -> InterpretResult<()> {
        let core = def.core();
        debug!(element = %core.label(), identity = %self.identity, depth = env.depth(), "interpretation: update");

        let defs: Vec<&dyn AddOnDef> = def.add_ons().iter().collect();
        synchronize(
            self.add_ons.items_mut(),
            &defs,
            |interp, d| interp.add_on_name() == d.add_on_name(),
            &mut AddOnInterpSync,
        )?;
        for (add_on, d) in self.add_ons.iter_mut().zip(defs.iter()) {
            add_on.pre_update(*d, core, env)?;
        }
        for (add_on, d) in self.add_ons.iter_mut().zip(defs.iter()) {
            add_on.update(*d, core, env)?;
        }

        self.kind.update(def.kind(), core, &self.add_ons, env)?;

        let children: Vec<&ElementDef> = def.children().iter().collect();
        self.last_sync = synchronize(
            &mut self.children,
            &children,
            |interp, d| interp.identity == d.identity(),
            &mut InterpSync { env: &mut *env },
        )?;

        self.kind
            .post_update(def.kind(), core, &self.add_ons, &self.children, env)?;
        for (add_on, d) in self.add_ons.iter_mut().zip(defs.iter()) {
            add_on.post_update(*d, core, env)?;
        }
        Ok(())
    }

    /// Release add-ons and children; the interpretation is not used again
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
        self.destroyed = true;
        debug!(identity = %self.identity, "interpretation: destroyed");
    }
}

struct AddOnInterpSync;

impl SyncHandler<Box<dyn AddOnInterp>, dyn AddOnDef> for AddOnInterpSync {
    type Error = TypeResolutionError;

    fn left_only(&mut self, mut left: Box<dyn AddOnInterp>) -> InterpretResult<()> {
        left.destroy();
        Ok(())
    }

    fn right_only(&mut self, def: &dyn AddOnDef, _index: usize) -> InterpretResult<Option<Box<dyn AddOnInterp>>> {
        Ok(Some(def.interpret()))
    }

    fn common(&mut self, _left: &mut Box<dyn AddOnInterp>, _def: &dyn AddOnDef, _index: usize) -> InterpretResult<()> {
        Ok(())
    }
}

/// Reconciles child interpretations against child definitions by identity
pub(crate) struct InterpSync<'a> {
    pub(crate) env: &'a mut InterpretEnv,
}

impl SyncHandler<ElementInterp, ElementDef> for InterpSync<'_> {
    type Error = TypeResolutionError;

    fn left_only(&mut self, mut left: ElementInterp) -> InterpretResult<()> {
        left.destroy();
        Ok(())
    }

    fn right_only(&mut self, def: &ElementDef, _index: usize) -> InterpretResult<Option<ElementInterp>> {
        let mut interp = ElementInterp::new(def);
        interp.update(def, self.env)?;
        Ok(Some(interp))
    }

    fn common(&mut self, left: &mut ElementInterp, def: &ElementDef, _index: usize) -> InterpretResult<()> {
        left.update(def, self.env)
    }
}
