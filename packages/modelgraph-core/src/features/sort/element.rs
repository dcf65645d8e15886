//! `sort` and `sort-by` elements
//!
//! A `sort` child of a collection declares how its items are ordered. The
//! names given by `sort-value-as` and `sort-compare-value-as` become
//! placeholders in the sort's local model; their type is the sorted type,
//! which the enclosing collection (or, for `sort-by`, the key expression)
//! exposes on the interpreting frame.

use std::any::Any;
use std::sync::Arc;
use tracing::debug;

use super::comparator::{SortKey, SortMode, Sorting};
use crate::errors::{CompileError, CompileResult, InterpretResult, TypeResolutionError};
use crate::features::addons::{AddOnDef, AddOnInterp, AddOnSet, ElementModelDef, LocalModelInterp};
use crate::features::element::{
    CompileSession, DefCore, ElementInterp, InterpretEnv, KindDef, KindInstance, KindInterp,
};
use crate::features::elements::GroupInstance;
use crate::features::expression::Expression;
use crate::features::model_namespace::ComponentId;
use crate::features::placeholder::TypeCallback;
use crate::features::value_synth::ValueSynth;
use crate::shared::models::{FilePosition, InstanceType, SchemaNode, ValueType};

pub const SORT_TYPE: &str = "sort";
pub const SORT_BY_TYPE: &str = "sort-by";

/// Frame key of the type being sorted
pub const SORT_TYPE_KEY: &str = "sort-type";

const VALUE_AS: &str = "sort-value-as";
const COMPARE_VALUE_AS: &str = "sort-compare-value-as";

#[derive(Debug)]
pub struct SortDef {
    position: FilePosition,
    is_sort_by: bool,
    ascending: bool,
    sort_with: Option<Arc<dyn Expression>>,
    /// Key extracted from the parent's value; `sort-by` only
    key: Option<Arc<dyn Expression>>,
    has_sort_by: bool,
    value_as: Option<ComponentId>,
    compare_as: Option<ComponentId>,
}

impl Default for SortDef {
    fn default() -> Self {
        Self {
            position: FilePosition::unknown(),
            is_sort_by: false,
            ascending: true,
            sort_with: None,
            key: None,
            has_sort_by: false,
            value_as: None,
            compare_as: None,
        }
    }
}

impl SortDef {
    pub fn is_ascending(&self) -> bool {
        self.ascending
    }

    pub fn uses_sort_with(&self) -> bool {
        self.sort_with.is_some()
    }

    pub fn uses_sort_by(&self) -> bool {
        self.has_sort_by
    }

    /// Check the default ordering once the sorted type is known at definition
    /// time
    pub fn bind_sort_type(&mut self, ty: &ValueType, session: &mut CompileSession) {
        if self.sort_with.is_none() && !self.has_sort_by && !ty.has_natural_order() {
            session.report(
                CompileError::new(no_ordering(ty)).at(self.position.clone(), SORT_TYPE.len()),
            );
        }
    }

    fn validate(&self, core: &DefCore, session: &mut CompileSession) -> CompileResult<()> {
        let at = |name: &str| core.attribute_position(name);
        if self.sort_with.is_some() {
            if self.has_sort_by {
                session.report(
                    CompileError::new("sort-with or sort-by may be used, but not both")
                        .at(at("sort-with"), 0),
                );
            }
            if self.value_as.is_none() {
                return Err(CompileError::new("sort-with must be used with sort-value-as").at(at("sort-with"), 0));
            }
            if self.compare_as.is_none() {
                return Err(
                    CompileError::new("sort-with must be used with sort-compare-value-as").at(at("sort-with"), 0),
                );
            }
        } else if self.has_sort_by {
            if self.value_as.is_none() {
                return Err(CompileError::new("sort-by must be used with sort-value-as")
                    .at(core.position.clone(), core.type_name.len()));
            }
            if self.compare_as.is_some() {
                session.warn("sort-compare-value-as is not used with sort-by", Some(at(COMPARE_VALUE_AS)));
            }
        } else {
            if self.value_as.is_some() {
                session.warn("sort-value-as is not used with default sorting", Some(at(VALUE_AS)));
            }
            if self.compare_as.is_some() {
                session.warn(
                    "sort-compare-value-as is not used with default sorting",
                    Some(at(COMPARE_VALUE_AS)),
                );
            }
        }
        Ok(())
    }
}

fn no_ordering(ty: &ValueType) -> String {
    format!("{} has no natural ordering; use either sort-with or sort-by", ty)
}

impl KindDef for SortDef {
    fn update(
        &mut self,
        core: &DefCore,
        node: &dyn SchemaNode,
        add_ons: &mut AddOnSet<dyn AddOnDef>,
        session: &mut CompileSession,
    ) -> CompileResult<()> {
        self.position = core.position.clone();
        self.is_sort_by = session.registry().is_a(&core.type_name, SORT_BY_TYPE);
        self.ascending = core.bool_attribute("ascending", true)?;
        self.sort_with = match core.attribute("sort-with") {
            Some(text) => Some(session.parse_expression(text, Some(core.attribute_position("sort-with")))?),
            None => None,
        };
        self.key = match (self.is_sort_by, core.text().map(str::trim).filter(|t| !t.is_empty())) {
            (true, Some(text)) => Some(session.parse_expression(text, Some(core.text_position()))?),
            (true, None) => {
                return Err(CompileError::new("sort-by requires a key expression")
                    .at(core.position.clone(), core.type_name.len()))
            }
            (false, _) => None,
        };
        self.has_sort_by = node.children().iter().any(|c| c.type_name() == SORT_BY_TYPE);

        let element_model = add_ons.get::<ElementModelDef>();
        self.value_as = element_model.and_then(|m| m.element_value_id(VALUE_AS)).cloned();
        self.compare_as = element_model.and_then(|m| m.element_value_id(COMPARE_VALUE_AS)).cloned();
        if let Some(element_model) = element_model {
            let owner = core.identity;
            let callback: TypeCallback = Arc::new(move |env: &InterpretEnv| {
                env.exposed(owner, SORT_TYPE_KEY)
                    .cloned()
                    .map(InstanceType::value)
                    .ok_or_else(|| TypeResolutionError::new("The sorted type is not known here"))
            });
            for key in [VALUE_AS, COMPARE_VALUE_AS] {
                if let Some(placeholder) = element_model.placeholder(key) {
                    placeholder.set_type_callback(callback.clone());
                }
            }
        }

        self.validate(core, session)
    }

    fn interpret(&self) -> Box<dyn KindInterp> {
        Box::new(SortInterp::default())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Debug, Default)]
pub struct SortInterp {
    sort_type: Option<ValueType>,
    key: Option<Arc<dyn ValueSynth>>,
    compare: Option<Arc<dyn ValueSynth>>,
    sorting: Option<Arc<Sorting>>,
}

impl SortInterp {
    pub fn sort_type(&self) -> Option<&ValueType> {
        self.sort_type.as_ref()
    }

    pub fn sorting(&self) -> Option<Arc<Sorting>> {
        self.sorting.clone()
    }

    fn sort_def(def: &dyn KindDef) -> InterpretResult<&SortDef> {
        def.as_any()
            .downcast_ref::<SortDef>()
            .ok_or_else(|| TypeResolutionError::new("Sort interpretation paired with another element kind"))
    }
}

impl KindInterp for SortInterp {
    fn pre_update(&mut self, def: &dyn KindDef, _core: &DefCore, env: &mut InterpretEnv) -> InterpretResult<()> {
        let def = Self::sort_def(def)?;
        self.compare = None;
        self.sorting = None;
        match &def.key {
            Some(key) => {
                let synth = key
                    .evaluate(None, env)
                    .map_err(|err| err.wrap(format!("Could not interpret sort-by '{}'", key.text())))?;
                self.sort_type = synth.instance_type().element_type().cloned();
                self.key = Some(synth);
            }
            None => {
                self.key = None;
                self.sort_type = env.nearest_exposed(SORT_TYPE_KEY).cloned();
            }
        }
        if self.sort_type.is_none() {
            return Err(TypeResolutionError::new("sort is not inside a sortable collection"));
        }
        Ok(())
    }

    fn update(
        &mut self,
        def: &dyn KindDef,
        core: &DefCore,
        _add_ons: &AddOnSet<dyn AddOnInterp>,
        env: &mut InterpretEnv,
    ) -> InterpretResult<()> {
        let def = Self::sort_def(def)?;
        let ty = self.sort_type.clone().unwrap_or_default();
        env.expose(core.identity, SORT_TYPE_KEY, ty.clone())?;
        if let Some(with) = &def.sort_with {
            let compare = with
                .evaluate(Some(&ValueType::Int), env)
                .map_err(|err| err.wrap(format!("Could not interpret sort-with '{}'", with.text())))?;
            self.compare = Some(compare);
        } else if !def.has_sort_by && !ty.has_natural_order() {
            return Err(TypeResolutionError::new(no_ordering(&ty)));
        }
        Ok(())
    }

    fn post_update(
        &mut self,
        def: &dyn KindDef,
        core: &DefCore,
        add_ons: &AddOnSet<dyn AddOnInterp>,
        children: &[ElementInterp],
        _env: &mut InterpretEnv,
    ) -> InterpretResult<()> {
        let def = Self::sort_def(def)?;
        let mode = if let Some(compare) = &self.compare {
            SortMode::With {
                compare: compare.clone(),
            }
        } else if def.has_sort_by {
            let keys = children
                .iter()
                .filter_map(|c| c.kind_as::<SortInterp>())
                .map(|child| match (&child.key, &child.sorting) {
                    (Some(key), Some(sorting)) => Ok(SortKey {
                        key: key.clone(),
                        sorting: sorting.clone(),
                    }),
                    _ => Err(TypeResolutionError::new("sort-by was not interpreted")),
                })
                .collect::<InterpretResult<Vec<_>>>()?;
            SortMode::By(keys)
        } else {
            SortMode::Natural
        };
        let sorting = Sorting {
            value_type: self.sort_type.clone().unwrap_or_default(),
            ascending: def.ascending,
            mode,
            models: add_ons.get::<LocalModelInterp>().and_then(|l| l.local_models()),
            value_as: def.value_as.clone(),
            compare_as: def.compare_as.clone(),
        };
        debug!(element = %core.label(), ty = %sorting.value_type, ascending = sorting.ascending, "sort: interpreted");
        self.sorting = Some(Arc::new(sorting));
        Ok(())
    }

    fn create(&self) -> Box<dyn KindInstance> {
        Box::new(GroupInstance)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
