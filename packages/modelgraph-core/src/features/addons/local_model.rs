//! Private namespace for an element's subtree
//!
//! The definition opens a lazy frame: a model is only sealed if something in
//! the subtree declared a value in it. Elements whose subtree declares nothing
//! get no namespace of their own and no runtime scope.

use std::any::Any;
use std::sync::Arc;
use tracing::debug;

use super::named::add_on_kind;
use super::{counterpart, AddOnDef, AddOnInstance, AddOnInterp, AddOnKind};
use crate::errors::{CompileResult, InterpretResult, TypeResolutionError};
use crate::features::element::{CompileSession, DefCore, InterpretEnv};
use crate::features::model_namespace::{InterpretedModelSet, ModelSet};
use crate::shared::models::SchemaNode;

pub const LOCAL_MODEL: &str = "local-model";

#[derive(Debug, Default)]
pub struct LocalModelDef {
    models: Option<Arc<ModelSet>>,
}

impl LocalModelDef {
    /// Sealed local namespace, if the subtree declared anything
    pub fn models(&self) -> Option<&Arc<ModelSet>> {
        self.models.as_ref()
    }
}

add_on_kind!(LocalModelDef, LOCAL_MODEL);

impl AddOnDef for LocalModelDef {
    fn pre_update(&mut self, core: &DefCore, _node: &dyn SchemaNode, session: &mut CompileSession) -> CompileResult<()> {
        session.push_lazy_frame(core.identity, core.label());
        Ok(())
    }

    fn post_update(&mut self, core: &DefCore, _node: &dyn SchemaNode, session: &mut CompileSession) -> CompileResult<()> {
        self.models = session.pop_frame(core.identity)?.map(|builder| builder.seal());
        if let Some(models) = &self.models {
            debug!(element = %core.label(), components = models.len(), "local model: sealed");
        }
        Ok(())
    }

    fn interpret(&self) -> Box<dyn AddOnInterp> {
        Box::new(LocalModelInterp::default())
    }
}

#[derive(Debug, Default)]
pub struct LocalModelInterp {
    models: Option<Arc<InterpretedModelSet>>,
}

add_on_kind!(LocalModelInterp, LOCAL_MODEL);

impl AddOnInterp for LocalModelInterp {
    fn pre_update(&mut self, def: &dyn AddOnDef, _core: &DefCore, env: &mut InterpretEnv) -> InterpretResult<()> {
        let def = counterpart::<LocalModelDef, _>(def, LOCAL_MODEL).map_err(TypeResolutionError::new)?;
        self.models = def.models.as_ref().map(|models| {
            let set = InterpretedModelSet::new(models.clone(), Some(env.models()));
            env.swap_models(set.clone());
            set
        });
        Ok(())
    }

    fn post_update(&mut self, _def: &dyn AddOnDef, _core: &DefCore, env: &mut InterpretEnv) -> InterpretResult<()> {
        if let Some(models) = &self.models {
            models.interpret_all(env)?;
        }
        Ok(())
    }

    fn local_models(&self) -> Option<Arc<InterpretedModelSet>> {
        self.models.clone()
    }

    fn create(&self) -> Option<Box<dyn AddOnInstance>> {
        None
    }
}
