//! Naming and declared-type capabilities

use std::any::Any;

use super::{counterpart, AddOnDef, AddOnInstance, AddOnInterp, AddOnKind};
use crate::errors::{CompileError, CompileResult, InterpretResult, TypeResolutionError};
use crate::features::element::{CompileSession, DefCore, InterpretEnv};
use crate::shared::models::{SchemaNode, ValueType};

pub const NAMED: &str = "named";
pub const TYPED: &str = "typed";

/// Frame key under which a typed element exposes its declared type
pub const TYPE_KEY: &str = "type";

macro_rules! add_on_kind {
    ($ty:ty, $name:expr) => {
        impl AddOnKind for $ty {
            fn add_on_name(&self) -> &'static str {
                $name
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }
        }
    };
}

pub(crate) use add_on_kind;

/// Element declares a value under its required `name` attribute
#[derive(Debug, Default)]
pub struct NamedDef {
    name: Option<String>,
}

impl NamedDef {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

add_on_kind!(NamedDef, NAMED);

impl AddOnDef for NamedDef {
    fn update(&mut self, core: &DefCore, _node: &dyn SchemaNode, _session: &mut CompileSession) -> CompileResult<()> {
        let name = core.require_attribute("name")?;
        if name.is_empty() {
            return Err(CompileError::new(format!("{} has an empty name", core.type_name))
                .at(core.attribute_position("name"), 0));
        }
        self.name = Some(name.to_string());
        Ok(())
    }

    fn interpret(&self) -> Box<dyn AddOnInterp> {
        Box::new(NamedInterp::default())
    }
}

#[derive(Debug, Default)]
pub struct NamedInterp {
    name: Option<String>,
}

impl NamedInterp {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

add_on_kind!(NamedInterp, NAMED);

impl AddOnInterp for NamedInterp {
    fn update(&mut self, def: &dyn AddOnDef, _core: &DefCore, _env: &mut InterpretEnv) -> InterpretResult<()> {
        let def = counterpart::<NamedDef, _>(def, NAMED).map_err(TypeResolutionError::new)?;
        self.name = def.name.clone();
        Ok(())
    }

    fn create(&self) -> Option<Box<dyn AddOnInstance>> {
        None
    }
}

/// Optional `type` attribute, checked at definition time and exposed on the
/// element's frame while it interprets
#[derive(Debug, Default)]
pub struct TypedDef {
    text: Option<String>,
    value_type: Option<ValueType>,
}

impl TypedDef {
    pub fn type_text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn value_type(&self) -> Option<&ValueType> {
        self.value_type.as_ref()
    }
}

add_on_kind!(TypedDef, TYPED);

impl AddOnDef for TypedDef {
    fn update(&mut self, core: &DefCore, _node: &dyn SchemaNode, session: &mut CompileSession) -> CompileResult<()> {
        self.text = core.attribute("type").map(str::to_string);
        self.value_type = match &self.text {
            Some(text) => Some(session.registry().resolve_type(text).map_err(|msg| {
                CompileError::new(msg).at(core.attribute_position("type"), text.len())
            })?),
            None => None,
        };
        Ok(())
    }

    fn interpret(&self) -> Box<dyn AddOnInterp> {
        Box::new(TypedInterp::default())
    }
}

#[derive(Debug, Default)]
pub struct TypedInterp {
    value_type: Option<ValueType>,
}

impl TypedInterp {
    pub fn value_type(&self) -> Option<&ValueType> {
        self.value_type.as_ref()
    }
}

add_on_kind!(TypedInterp, TYPED);

impl AddOnInterp for TypedInterp {
    fn pre_update(&mut self, def: &dyn AddOnDef, core: &DefCore, env: &mut InterpretEnv) -> InterpretResult<()> {
        let def = counterpart::<TypedDef, _>(def, TYPED).map_err(TypeResolutionError::new)?;
        self.value_type = def.value_type.clone();
        if let Some(ty) = &self.value_type {
            env.expose(core.identity, TYPE_KEY, ty.clone())?;
        }
        Ok(())
    }

    fn create(&self) -> Option<Box<dyn AddOnInstance>> {
        None
    }
}
