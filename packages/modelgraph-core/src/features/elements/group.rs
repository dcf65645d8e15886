//! Structural kinds with no logic of their own

use std::any::Any;
use std::sync::Arc;

use crate::errors::{CompileResult, InstantiateResult, InterpretResult};
use crate::features::addons::{AddOnDef, AddOnInterp, AddOnSet};
use crate::features::element::{
    CompileSession, DefCore, InterpretEnv, KindDef, KindInstance, KindInterp,
};
use crate::features::model_namespace::ModelScope;
use crate::shared::models::SchemaNode;

/// Container element; behaviour comes from its add-ons and children
#[derive(Debug, Default)]
pub struct GroupDef;

impl KindDef for GroupDef {
    fn update(
        &mut self,
        _core: &DefCore,
        _node: &dyn SchemaNode,
        _add_ons: &mut AddOnSet<dyn AddOnDef>,
        _session: &mut CompileSession,
    ) -> CompileResult<()> {
        Ok(())
    }

    fn interpret(&self) -> Box<dyn KindInterp> {
        Box::new(GroupInterp)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Declaration read by the `required-models` add-on of its parent
#[derive(Debug, Default)]
pub struct ExtValueDef;

impl KindDef for ExtValueDef {
    fn update(
        &mut self,
        _core: &DefCore,
        _node: &dyn SchemaNode,
        _add_ons: &mut AddOnSet<dyn AddOnDef>,
        _session: &mut CompileSession,
    ) -> CompileResult<()> {
        Ok(())
    }

    fn interpret(&self) -> Box<dyn KindInterp> {
        Box::new(GroupInterp)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Debug, Default)]
pub struct GroupInterp;

impl KindInterp for GroupInterp {
    fn update(
        &mut self,
        _def: &dyn KindDef,
        _core: &DefCore,
        _add_ons: &AddOnSet<dyn AddOnInterp>,
        _env: &mut InterpretEnv,
    ) -> InterpretResult<()> {
        Ok(())
    }

    fn create(&self) -> Box<dyn KindInstance> {
        Box::new(GroupInstance)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Default)]
pub struct GroupInstance;

impl KindInstance for GroupInstance {
    fn update(&mut self, _interp: &dyn KindInterp, _scope: &Arc<ModelScope>) -> InstantiateResult<()> {
        Ok(())
    }

    fn copy(&self) -> Box<dyn KindInstance> {
        Box::new(GroupInstance)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
