//! Element-scoped placeholders
//!
//! Schema types declare element values (see
//! [`ElementRegistry::declare_element_value`](crate::features::element::ElementRegistry::declare_element_value)).
//! This add-on turns the declarations of its element's type into
//! placeholders in the element's local model. The element's own logic then
//! supplies their type, through a callback or directly, and their value.

use std::any::Any;
use std::sync::Arc;

use super::named::add_on_kind;
use super::{counterpart, AddOnDef, AddOnInstance, AddOnInterp, AddOnKind};
use crate::errors::{
    CompileError, CompileResult, InstantiateResult, InstantiationError, InterpretResult, TypeResolutionError,
};
use crate::features::element::{CompileSession, DefCore, InterpretEnv};
use crate::features::model_namespace::{ComponentId, ModelScope};
use crate::features::placeholder::{PlaceholderValue, SatisfyPolicy};
use crate::shared::models::{InstanceType, LiveValue, SchemaNode};

pub const ELEMENT_MODEL: &str = "element-model";

#[derive(Debug, Clone)]
pub struct ElementValue {
    /// Declaration key, e.g. the naming attribute
    pub key: String,
    pub name: String,
    pub id: ComponentId,
    pub placeholder: Arc<PlaceholderValue>,
}

#[derive(Debug, Default)]
pub struct ElementModelDef {
    values: Vec<ElementValue>,
}

impl ElementModelDef {
    pub fn values(&self) -> &[ElementValue] {
        &self.values
    }

    fn find(&self, key: &str) -> Option<&ElementValue> {
        self.values.iter().find(|v| v.key == key)
    }

    pub fn element_value_id(&self, key: &str) -> Option<&ComponentId> {
        self.find(key).map(|v| &v.id)
    }

    pub fn placeholder(&self, key: &str) -> Option<&Arc<PlaceholderValue>> {
        self.find(key).map(|v| &v.placeholder)
    }

    pub fn satisfy_element_value_type(&self, key: &str, ty: InstanceType) -> InterpretResult<()> {
        let value = self
            .find(key)
            .ok_or_else(|| TypeResolutionError::new(format!("No element value '{}' is declared", key)))?;
        value.placeholder.satisfy_type(ty)
    }
}

add_on_kind!(ElementModelDef, ELEMENT_MODEL);

impl AddOnDef for ElementModelDef {
    fn update(&mut self, core: &DefCore, _node: &dyn SchemaNode, session: &mut CompileSession) -> CompileResult<()> {
        self.values.clear();
        let registry = session.registry().clone();
        let decls = registry.element_value_decls(&core.type_name, session.cache())?;
        for decl in decls.iter() {
            let spec = &decl.spec;
            let (name, position) = match (&spec.name_attribute, &spec.fixed_name) {
                (Some(attribute), _) => match core.attribute(attribute) {
                    Some(name) => (name.to_string(), core.attribute_position(attribute)),
                    None => continue,
                },
                (None, Some(fixed)) => (fixed.clone(), core.position.clone()),
                (None, None) => continue,
            };
            let placeholder = match &spec.value_type {
                Some(ty) => {
                    let ty = InstanceType::new(spec.shape, vec![ty.clone()])
                        .map_err(|msg| CompileError::new(msg).at(position.clone(), name.len()))?;
                    PlaceholderValue::typed(name.clone(), ty, Some(core.identity))
                }
                None => PlaceholderValue::new(name.clone(), spec.shape, Some(core.identity)),
            };
            let placeholder = Arc::new(placeholder);
            let id = session
                .builder_mut()?
                .add_value(&name, placeholder.clone(), Some(core.identity), Some(position.clone()))
                .map_err(|err| CompileError::from(err).at(position.clone(), name.len()))?;
            self.values.push(ElementValue {
                key: spec.key().to_string(),
                name,
                id,
                placeholder,
            });
        }
        Ok(())
    }

    fn interpret(&self) -> Box<dyn AddOnInterp> {
        Box::new(ElementModelInterp::default())
    }
}

#[derive(Debug, Default)]
pub struct ElementModelInterp {
    ids: Vec<(String, ComponentId)>,
}

impl ElementModelInterp {
    pub fn element_value_id(&self, key: &str) -> Option<&ComponentId> {
        self.ids.iter().find(|(k, _)| k == key).map(|(_, id)| id)
    }
}

add_on_kind!(ElementModelInterp, ELEMENT_MODEL);

impl AddOnInterp for ElementModelInterp {
    fn update(&mut self, def: &dyn AddOnDef, _core: &DefCore, _env: &mut InterpretEnv) -> InterpretResult<()> {
        let def = counterpart::<ElementModelDef, _>(def, ELEMENT_MODEL).map_err(TypeResolutionError::new)?;
        self.ids = def.values.iter().map(|v| (v.key.clone(), v.id.clone())).collect();
        Ok(())
    }

    fn create(&self) -> Option<Box<dyn AddOnInstance>> {
        Some(Box::new(ElementModelInstance::default()))
    }
}

#[derive(Debug, Default)]
pub struct ElementModelInstance {
    ids: Vec<(String, ComponentId)>,
    scope: Option<Arc<ModelScope>>,
}

impl ElementModelInstance {
    fn bound(&self, key: &str) -> InstantiateResult<(&ComponentId, &Arc<ModelScope>)> {
        let id = self
            .ids
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, id)| id)
            .ok_or_else(|| InstantiationError::new(format!("No element value '{}' is declared", key)))?;
        let scope = self
            .scope
            .as_ref()
            .ok_or_else(|| InstantiationError::new("Element values are not bound to a scope yet"))?;
        Ok((id, scope))
    }

    /// Write the value of an element value, replacing any previous one
    pub fn satisfy(&self, key: &str, value: LiveValue) -> InstantiateResult<bool> {
        let (id, scope) = self.bound(key)?;
        scope.satisfy(id, value, SatisfyPolicy::Replace)
    }

    pub fn value(&self, key: &str) -> InstantiateResult<LiveValue> {
        let (id, scope) = self.bound(key)?;
        scope.get(id)
    }
}

add_on_kind!(ElementModelInstance, ELEMENT_MODEL);

impl AddOnInstance for ElementModelInstance {
    fn update(&mut self, interp: &dyn AddOnInterp, scope: &Arc<ModelScope>) -> InstantiateResult<()> {
        let interp =
            counterpart::<ElementModelInterp, _>(interp, ELEMENT_MODEL).map_err(InstantiationError::new)?;
        self.ids = interp.ids.clone();
        self.scope = Some(scope.clone());
        Ok(())
    }

    fn copy(&self) -> Box<dyn AddOnInstance> {
        Box::new(ElementModelInstance {
            ids: self.ids.clone(),
            scope: None,
        })
    }
}
