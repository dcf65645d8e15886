//! Required external models
//!
//! An element carrying this add-on names values that whatever contains it
//! must supply. Each `ext-value` child becomes a typed placeholder in the
//! element's local model. Interpretation maps every placeholder to the
//! external component of the same (or the `source`) name in the containing
//! namespace; instantiation copies the external value in, converting it when
//! the types differ.

use std::any::Any;
use std::sync::Arc;
use tracing::debug;

use super::named::add_on_kind;
use super::{counterpart, AddOnDef, AddOnInstance, AddOnInterp, AddOnKind};
use crate::errors::{
    CompileError, CompileResult, InstantiateResult, InstantiationError, InterpretResult, TypeResolutionError,
};
use crate::features::element::{CompileSession, DefCore, InterpretEnv};
use crate::features::model_namespace::{ComponentId, ModelScope};
use crate::features::placeholder::{PlaceholderValue, SatisfyPolicy};
use crate::shared::models::{InstanceType, LiveValue, SchemaNode, ValueType};

pub const REQUIRED_MODELS: &str = "required-models";

/// Schema type of the children declaring required values
pub const EXT_VALUE_TYPE: &str = "ext-value";

/// One declared external input
#[derive(Debug, Clone, PartialEq)]
pub struct RequiredValue {
    pub name: String,
    /// Path of the external component; defaults to `name`
    pub source: String,
    pub value_type: ValueType,
    pub id: ComponentId,
}

#[derive(Debug, Default)]
pub struct RequiredModelsDef {
    values: Vec<RequiredValue>,
}

impl RequiredModelsDef {
    pub fn values(&self) -> &[RequiredValue] {
        &self.values
    }
}

add_on_kind!(RequiredModelsDef, REQUIRED_MODELS);

impl AddOnDef for RequiredModelsDef {
    fn update(&mut self, core: &DefCore, node: &dyn SchemaNode, session: &mut CompileSession) -> CompileResult<()> {
        self.values.clear();
        for child in node.children() {
            if child.type_name() != EXT_VALUE_TYPE {
                continue;
            }
            let position = child.position();
            let name = child.attribute("name").ok_or_else(|| {
                CompileError::new(format!("'{}' requires a 'name' attribute", EXT_VALUE_TYPE)).at(position.clone(), 0)
            })?;
            let type_text = child.attribute("type").ok_or_else(|| {
                CompileError::new(format!("Required value '{}' must declare its type", name)).at(position.clone(), 0)
            })?;
            let value_type = session.registry().resolve_type(type_text).map_err(|msg| {
                CompileError::new(msg).at(child.attribute_position("type").unwrap_or_else(|| position.clone()), type_text.len())
            })?;
            let placeholder = PlaceholderValue::typed(name, InstanceType::value(value_type.clone()), Some(core.identity));
            let id = session
                .builder_mut()?
                .add_value(name, Arc::new(placeholder), Some(core.identity), Some(position.clone()))
                .map_err(|err| CompileError::from(err).at(position.clone(), name.len()))?;
            self.values.push(RequiredValue {
                name: name.to_string(),
                source: child.attribute("source").unwrap_or(name).to_string(),
                value_type,
                id,
            });
        }
        Ok(())
    }

    fn interpret(&self) -> Box<dyn AddOnInterp> {
        Box::new(RequiredModelsInterp::default())
    }
}

/// Internal placeholder and the external component that satisfies it
#[derive(Debug, Clone)]
struct Mapping {
    internal: ComponentId,
    external: ComponentId,
    value_type: ValueType,
    convert: bool,
}

#[derive(Debug, Default)]
pub struct RequiredModelsInterp {
    mappings: Vec<Mapping>,
}

impl RequiredModelsInterp {
    /// External component each internal placeholder is read from
    pub fn mapping(&self) -> Vec<(ComponentId, ComponentId)> {
        self.mappings
            .iter()
            .map(|m| (m.internal.clone(), m.external.clone()))
            .collect()
    }
}

add_on_kind!(RequiredModelsInterp, REQUIRED_MODELS);

impl AddOnInterp for RequiredModelsInterp {
    fn update(&mut self, def: &dyn AddOnDef, core: &DefCore, env: &mut InterpretEnv) -> InterpretResult<()> {
        let def = counterpart::<RequiredModelsDef, _>(def, REQUIRED_MODELS).map_err(TypeResolutionError::new)?;
        self.mappings.clear();
        if def.values.is_empty() {
            return Ok(());
        }
        // The local model is swapped in by now; external values live around it
        let local = env.models().clone();
        let outer = local.parent();
        for value in &def.values {
            let missing = || {
                TypeResolutionError::new(format!(
                    "Model value '{}' is required to apply {} but is not present",
                    value.source, core.type_name
                ))
            };
            let outer = outer.clone().ok_or_else(missing)?;
            if !outer.contains_path(&value.source) {
                return Err(missing());
            }
            let previous = env.swap_models(outer.clone());
            let resolved = outer.resolve(&value.source, env);
            env.swap_models(previous);
            let resolved = resolved.map_err(|err| err.wrap(missing().message().to_string()))?;

            let wanted = InstanceType::value(value.value_type.clone());
            let convert = if wanted.is_assignable_from(&resolved.instance_type) {
                false
            } else if wanted.can_convert_from(&resolved.instance_type) {
                true
            } else {
                return Err(TypeResolutionError::new(format!(
                    "Model value '{}' is {}, but {} is required",
                    value.source, resolved.instance_type, wanted
                )));
            };
            debug!(internal = %value.id, external = %resolved.id, convert, "required models: mapped");
            self.mappings.push(Mapping {
                internal: value.id.clone(),
                external: resolved.id,
                value_type: value.value_type.clone(),
                convert,
            });
        }
        Ok(())
    }

    fn create(&self) -> Option<Box<dyn AddOnInstance>> {
        Some(Box::new(RequiredModelsInstance::default()))
    }
}

#[derive(Debug, Default)]
pub struct RequiredModelsInstance {
    mappings: Vec<Mapping>,
}

add_on_kind!(RequiredModelsInstance, REQUIRED_MODELS);

impl AddOnInstance for RequiredModelsInstance {
    fn pre_update(&mut self, interp: &dyn AddOnInterp, scope: &Arc<ModelScope>) -> InstantiateResult<()> {
        let interp =
            counterpart::<RequiredModelsInterp, _>(interp, REQUIRED_MODELS).map_err(InstantiationError::new)?;
        self.mappings = interp.mappings.clone();
        for mapping in &self.mappings {
            let external = scope.get(&mapping.external).map_err(|err| {
                err.wrap(format!("Could not read required value '{}'", mapping.external))
            })?;
            let value = if mapping.convert {
                let converted = external
                    .current()
                    .convert_to(&mapping.value_type)
                    .map_err(InstantiationError::new)?;
                LiveValue::constant(mapping.value_type.clone(), converted)
            } else {
                external
            };
            scope.satisfy(&mapping.internal, value, SatisfyPolicy::Replace)?;
        }
        Ok(())
    }

    fn copy(&self) -> Box<dyn AddOnInstance> {
        Box::new(RequiredModelsInstance::default())
    }
}
