//! Add-on Capability System
//!
//! Add-ons are optional facets mirroring their host element's three phases.
//! The host invokes them from its own phase methods: pre-update hooks first,
//! then updates in dependency order, the element's own logic, its children,
//! and finally the post-update hooks.
//!
//! Stock capabilities:
//! - [`NamedDef`]: required `name` attribute
//! - [`TypedDef`]: `type` attribute exposed to the interpreting frame
//! - [`LocalModelDef`]: private namespace for the element's subtree
//! - [`ElementModelDef`]: schema-declared placeholders owned by the element
//! - [`RequiredModelsDef`]: external inputs a containing context must supply

mod element_model;
mod local_model;
mod named;
mod required;
mod set;

use std::sync::Arc;

use crate::errors::{CompileResult, InstantiateResult, InterpretResult};
use crate::features::element::{CompileSession, DefCore, InterpretEnv};
use crate::features::model_namespace::{InterpretedModelSet, ModelScope};
use crate::shared::models::SchemaNode;

pub use element_model::{ElementModelDef, ElementModelInstance, ElementModelInterp, ElementValue, ELEMENT_MODEL};
pub use local_model::{LocalModelDef, LocalModelInterp, LOCAL_MODEL};
pub use named::{NamedDef, NamedInterp, TypedDef, TypedInterp, NAMED, TYPED, TYPE_KEY};
pub use required::{
    RequiredModelsDef, RequiredModelsInstance, RequiredModelsInterp, RequiredValue, EXT_VALUE_TYPE,
    REQUIRED_MODELS,
};
pub use set::{AddOnKind, AddOnSet};

/// Definition-phase add-on
pub trait AddOnDef: AddOnKind {
    fn pre_update(
        &mut self,
        _core: &DefCore,
        _node: &dyn SchemaNode,
        _session: &mut CompileSession,
    ) -> CompileResult<()> {
        Ok(())
    }

    fn update(
        &mut self,
        _core: &DefCore,
        _node: &dyn SchemaNode,
        _session: &mut CompileSession,
    ) -> CompileResult<()> {
        Ok(())
    }

    fn post_update(
        &mut self,
        _core: &DefCore,
        _node: &dyn SchemaNode,
        _session: &mut CompileSession,
    ) -> CompileResult<()> {
        Ok(())
    }

    fn interpret(&self) -> Box<dyn AddOnInterp>;
}

/// Interpretation-phase add-on
pub trait AddOnInterp: AddOnKind {
    fn pre_update(&mut self, _def: &dyn AddOnDef, _core: &DefCore, _env: &mut InterpretEnv) -> InterpretResult<()> {
        Ok(())
    }

    fn update(&mut self, _def: &dyn AddOnDef, _core: &DefCore, _env: &mut InterpretEnv) -> InterpretResult<()> {
        Ok(())
    }

    fn post_update(&mut self, _def: &dyn AddOnDef, _core: &DefCore, _env: &mut InterpretEnv) -> InterpretResult<()> {
        Ok(())
    }

    /// Private namespace this add-on contributes to the element
    fn local_models(&self) -> Option<Arc<InterpretedModelSet>> {
        None
    }

    /// Runtime counterpart; `None` when the add-on has no runtime state
    fn create(&self) -> Option<Box<dyn AddOnInstance>>;

    fn destroy(&mut self) {}
}

/// Instance-phase add-on
pub trait AddOnInstance: AddOnKind {
    fn pre_update(&mut self, _interp: &dyn AddOnInterp, _scope: &Arc<ModelScope>) -> InstantiateResult<()> {
        Ok(())
    }

    fn update(&mut self, _interp: &dyn AddOnInterp, _scope: &Arc<ModelScope>) -> InstantiateResult<()> {
        Ok(())
    }

    fn post_update(&mut self, _interp: &dyn AddOnInterp, _scope: &Arc<ModelScope>) -> InstantiateResult<()> {
        Ok(())
    }

    fn pre_instantiated(&mut self) {}

    fn instantiated(&mut self) {}

    fn copy(&self) -> Box<dyn AddOnInstance>;

    fn destroy(&mut self) {}
}

/// Downcast the counterpart of an add-on in another phase
pub(crate) fn counterpart<'a, T: 'static, K: ?Sized + AddOnKind>(
    other: &'a K,
    expected: &'static str,
) -> Result<&'a T, String> {
    other.as_any().downcast_ref::<T>().ok_or_else(|| {
        format!(
            "Add-on '{}' was paired with '{}'",
            expected,
            other.add_on_name()
        )
    })
}
