//! Named sub-model
//!
//! Values declared under a `model` element land in a sub-namespace of the
//! enclosing model, addressed as `name.member`. The sub-model's identity is
//! the element's identity, so component ids survive rebuilds.

use std::any::Any;

use super::group::GroupInterp;
use crate::errors::{CompileError, CompileResult};
use crate::features::addons::{AddOnDef, AddOnSet, NamedDef};
use crate::features::element::{CompileSession, DefCore, ElementDef, KindDef, KindInterp};
use crate::features::model_namespace::{ComponentId, ModelSetBuilder};
use crate::shared::models::SchemaNode;

#[derive(Debug, Default)]
pub struct ModelDef {
    name: String,
    id: Option<ComponentId>,
}

impl ModelDef {
    pub fn component_id(&self) -> Option<&ComponentId> {
        self.id.as_ref()
    }
}

impl KindDef for ModelDef {
    fn update(
        &mut self,
        core: &DefCore,
        _node: &dyn SchemaNode,
        add_ons: &mut AddOnSet<dyn AddOnDef>,
        session: &mut CompileSession,
    ) -> CompileResult<()> {
        self.name = match add_ons.get::<NamedDef>().and_then(NamedDef::name) {
            Some(name) => name.to_string(),
            None => core.require_attribute("name")?.to_string(),
        };
        self.id = None;
        session.push_sub_model_frame(core.identity, &self.name);
        Ok(())
    }

    fn post_update(
        &mut self,
        core: &DefCore,
        _add_ons: &mut AddOnSet<dyn AddOnDef>,
        _children: &mut [ElementDef],
        session: &mut CompileSession,
    ) -> CompileResult<()> {
        let model = session
            .pop_frame(core.identity)?
            .unwrap_or_else(|| ModelSetBuilder::new(core.identity, self.name.clone()))
            .seal();
        let position = core.attribute_position("name");
        let id = session
            .builder_mut()?
            .add_sub_model(&self.name, model, Some(core.identity), Some(position.clone()))
            .map_err(|err| CompileError::from(err).at(position, self.name.len()))?;
        self.id = Some(id);
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
