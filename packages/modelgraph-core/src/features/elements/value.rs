//! Declared values: `value`, `derived`, `event` and `list`

use std::any::Any;
use std::sync::Arc;
use tracing::debug;

use super::maker::{MakerKind, ValueMaker};
use crate::errors::{CompileError, CompileResult, InstantiateResult, InstantiationError, InterpretResult, TypeResolutionError};
use crate::features::addons::{AddOnDef, AddOnInterp, AddOnSet, NamedDef, TypedDef};
use crate::features::element::{
    CompileSession, DefCore, ElementDef, ElementInterp, InterpretEnv, KindDef, KindInstance, KindInterp,
};
use crate::features::model_namespace::{ComponentId, ModelScope};
use crate::features::sort::{SortDef, SortInterp, SORT_TYPE, SORT_TYPE_KEY};
use crate::features::value_synth::{CollectionSynth, ValueSynth};
use crate::shared::models::{LiveValue, SchemaNode, ValueType};

/// Declaration shared by the value kinds
#[derive(Debug)]
struct Declared {
    kind: MakerKind,
    name: String,
    id: Option<ComponentId>,
    value_type: Option<ValueType>,
}

impl Declared {
    fn new(kind: MakerKind) -> Self {
        Self {
            kind,
            name: String::new(),
            id: None,
            value_type: None,
        }
    }

    fn update(
        &mut self,
        core: &DefCore,
        add_ons: &AddOnSet<dyn AddOnDef>,
        session: &mut CompileSession,
    ) -> CompileResult<()> {
        self.id = None;
        self.name = match add_ons.get::<NamedDef>().and_then(NamedDef::name) {
            Some(name) => name.to_string(),
            None => core.require_attribute("name")?.to_string(),
        };
        let typed = add_ons.get::<TypedDef>();
        self.value_type = typed.and_then(|t| t.value_type().cloned());
        let type_text = typed
            .and_then(TypedDef::type_text)
            .map(|text| (text.to_string(), core.attribute_position("type")));

        let init = match core.text().map(str::trim).filter(|t| !t.is_empty()) {
            Some(text) => Some(session.parse_expression(text, Some(core.text_position()))?),
            None => None,
        };
        match self.kind {
            MakerKind::Derived if init.is_none() => {
                return Err(CompileError::new(format!("Derived value '{}' requires an expression", self.name))
                    .at(core.position.clone(), core.type_name.len()))
            }
            MakerKind::Event if type_text.is_none() => {
                return Err(CompileError::new(format!("Event '{}' must declare its type", self.name))
                    .at(core.position.clone(), core.type_name.len()))
            }
            MakerKind::Event if init.is_some() => {
                session.warn(format!("Event '{}' ignores its value", self.name), Some(core.text_position()));
            }
            MakerKind::Settable | MakerKind::Collection if type_text.is_none() && init.is_none() => {
                return Err(CompileError::new(format!(
                    "Value '{}' needs a type or an initial value",
                    self.name
                ))
                .at(core.position.clone(), core.type_name.len()))
            }
            _ => {}
        }

        let maker = ValueMaker {
            kind: self.kind,
            name: self.name.clone(),
            type_text,
            init,
        };
        let position = core.attribute_position("name");
        let id = session
            .builder_mut()
            .map_err(|err| err.at(core.position.clone(), core.type_name.len()))?
            .add_value(&self.name, Arc::new(maker), Some(core.identity), Some(core.position.clone()))
            .map_err(|err| CompileError::from(err).at(position, self.name.len()))?;
        self.id = Some(id);
        Ok(())
    }
}

/// `value`, `derived` or `event` element
#[derive(Debug)]
pub struct ValueDef {
    declared: Declared,
}

impl ValueDef {
    pub fn settable() -> Self {
        Self {
            declared: Declared::new(MakerKind::Settable),
        }
    }

    pub fn derived() -> Self {
        Self {
            declared: Declared::new(MakerKind::Derived),
        }
    }

    pub fn event() -> Self {
        Self {
            declared: Declared::new(MakerKind::Event),
        }
    }

    pub fn name(&self) -> &str {
        &self.declared.name
    }

    pub fn component_id(&self) -> Option<&ComponentId> {
        self.declared.id.as_ref()
    }
}

impl KindDef for ValueDef {
    fn update(
        &mut self,
        core: &DefCore,
        _node: &dyn SchemaNode,
        add_ons: &mut AddOnSet<dyn AddOnDef>,
        session: &mut CompileSession,
    ) -> CompileResult<()> {
        self.declared.update(core, add_ons, session)
    }

    fn interpret(&self) -> Box<dyn KindInterp> {
        Box::new(ValueInterp::default())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn declared_id(def: &dyn KindDef) -> InterpretResult<ComponentId> {
    let id = if let Some(value) = def.as_any().downcast_ref::<ValueDef>() {
        value.component_id()
    } else if let Some(list) = def.as_any().downcast_ref::<ListDef>() {
        list.component_id()
    } else {
        return Err(TypeResolutionError::new(format!("{:?} does not declare a value", def)));
    };
    id.cloned()
        .ok_or_else(|| TypeResolutionError::new("Value was not declared; its definition failed"))
}

#[derive(Debug, Default)]
pub struct ValueInterp {
    id: Option<ComponentId>,
    synth: Option<Arc<dyn ValueSynth>>,
}

impl ValueInterp {
    pub fn component_id(&self) -> Option<&ComponentId> {
        self.id.as_ref()
    }

    pub fn synth(&self) -> Option<&Arc<dyn ValueSynth>> {
        self.synth.as_ref()
    }
}

impl KindInterp for ValueInterp {
    fn update(
        &mut self,
        def: &dyn KindDef,
        _core: &DefCore,
        _add_ons: &AddOnSet<dyn AddOnInterp>,
        env: &mut InterpretEnv,
    ) -> InterpretResult<()> {
        let id = declared_id(def)?;
        self.synth = Some(env.interpret_id(&id)?);
        self.id = Some(id);
        Ok(())
    }

    fn create(&self) -> Box<dyn KindInstance> {
        Box::new(ValueInstance::default())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Runtime side of every declared value: the live container in its scope
#[derive(Debug, Default)]
pub struct ValueInstance {
    value: Option<LiveValue>,
}

impl KindInstance for ValueInstance {
    fn update(&mut self, interp: &dyn KindInterp, scope: &Arc<ModelScope>) -> InstantiateResult<()> {
        let id = if let Some(value) = interp.as_any().downcast_ref::<ValueInterp>() {
            value.component_id()
        } else if let Some(list) = interp.as_any().downcast_ref::<ListInterp>() {
            list.value.component_id()
        } else {
            None
        };
        let id = id.ok_or_else(|| InstantiationError::new("Value instance has no interpreted component"))?;
        self.value = Some(scope.get(id)?);
        Ok(())
    }

    fn live_value(&self) -> Option<LiveValue> {
        self.value.clone()
    }

    fn copy(&self) -> Box<dyn KindInstance> {
        Box::new(ValueInstance::default())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `list` element, optionally sorted by a `sort` child
#[derive(Debug)]
pub struct ListDef {
    declared: Declared,
}

impl Default for ListDef {
    fn default() -> Self {
        Self {
            declared: Declared::new(MakerKind::Collection),
        }
    }
}

impl ListDef {
    pub fn component_id(&self) -> Option<&ComponentId> {
        self.declared.id.as_ref()
    }
}

impl KindDef for ListDef {
    fn update(
        &mut self,
        core: &DefCore,
        _node: &dyn SchemaNode,
        add_ons: &mut AddOnSet<dyn AddOnDef>,
        session: &mut CompileSession,
    ) -> CompileResult<()> {
        self.declared.update(core, add_ons, session)
    }

    fn post_update(
        &mut self,
        core: &DefCore,
        _add_ons: &mut AddOnSet<dyn AddOnDef>,
        children: &mut [ElementDef],
        session: &mut CompileSession,
    ) -> CompileResult<()> {
        let mut sorts = children.iter_mut().filter(|c| c.type_name() == SORT_TYPE);
        let Some(sort) = sorts.next() else {
            return Ok(());
        };
        if let Some(extra) = sorts.next() {
            return Err(CompileError::new(format!("{} may declare only one sort", core.label()))
                .at(extra.core().position.clone(), SORT_TYPE.len()));
        }
        if let (Some(ty), Some(sort)) = (self.declared.value_type.clone(), sort.kind_as_mut::<SortDef>()) {
            sort.bind_sort_type(&ty, session);
        }
        Ok(())
    }

    fn interpret(&self) -> Box<dyn KindInterp> {
        Box::new(ListInterp::default())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Debug, Default)]
pub struct ListInterp {
    value: ValueInterp,
}

impl ListInterp {
    pub fn synth(&self) -> Option<&Arc<dyn ValueSynth>> {
        self.value.synth()
    }
}

impl KindInterp for ListInterp {
    fn update(
        &mut self,
        def: &dyn KindDef,
        core: &DefCore,
        add_ons: &AddOnSet<dyn AddOnInterp>,
        env: &mut InterpretEnv,
    ) -> InterpretResult<()> {
        self.value.update(def, core, add_ons, env)?;
        let element = self
            .value
            .synth()
            .and_then(|s| s.instance_type().element_type().cloned())
            .unwrap_or_default();
        env.expose(core.identity, SORT_TYPE_KEY, element)
    }

    fn post_update(
        &mut self,
        _def: &dyn KindDef,
        core: &DefCore,
        _add_ons: &AddOnSet<dyn AddOnInterp>,
        children: &[ElementInterp],
        _env: &mut InterpretEnv,
    ) -> InterpretResult<()> {
        let sorting = children
            .iter()
            .filter(|c| c.type_name() == SORT_TYPE)
            .find_map(|c| c.kind_as::<SortInterp>())
            .and_then(SortInterp::sorting);
        let collection = self
            .value
            .synth()
            .and_then(|s| s.as_any().downcast_ref::<CollectionSynth>());
        if let Some(collection) = collection {
            debug!(element = %core.label(), sorted = sorting.is_some(), "list: bound sorting");
            collection.set_sorting(sorting);
        }
        Ok(())
    }

    fn create(&self) -> Box<dyn KindInstance> {
        Box::new(ValueInstance::default())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
