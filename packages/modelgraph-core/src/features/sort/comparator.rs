//! Runtime comparators
//!
//! A [`Sorting`] is the interpreted form of a sort spec. [`SortComparator`]
//! binds it to a runtime scope: candidates are written into settable left and
//! right slots that satisfy the spec's placeholders, and the compiled
//! comparison is read back.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

use super::compare::natural_compare;
use crate::errors::{InstantiateResult, InstantiationError};
use crate::features::model_namespace::{ComponentId, InterpretedModelSet, ModelScope};
use crate::features::placeholder::SatisfyPolicy;
use crate::features::value_synth::ValueSynth;
use crate::shared::models::{LiveValue, SettableValue, Value, ValueType};

#[derive(Debug)]
pub enum SortMode {
    /// Natural ordering of the value type
    Natural,
    /// Signed result of an expression over the two bound values
    With { compare: Arc<dyn ValueSynth> },
    /// Lexicographic over extracted keys
    By(Vec<SortKey>),
}

/// One `sort-by` level: a key extracted from the value, sorted by `sorting`
#[derive(Debug)]
pub struct SortKey {
    pub key: Arc<dyn ValueSynth>,
    pub sorting: Arc<Sorting>,
}

#[derive(Debug)]
pub struct Sorting {
    pub value_type: ValueType,
    pub ascending: bool,
    pub mode: SortMode,
    /// Local models of the sort element, holding the bound values
    pub models: Option<Arc<InterpretedModelSet>>,
    pub value_as: Option<ComponentId>,
    pub compare_as: Option<ComponentId>,
}

impl Sorting {
    pub fn natural(value_type: ValueType, ascending: bool) -> Self {
        Self {
            value_type,
            ascending,
            mode: SortMode::Natural,
            models: None,
            value_as: None,
            compare_as: None,
        }
    }

    fn bound_scope(&self, parent: &Arc<ModelScope>) -> InstantiateResult<Arc<ModelScope>> {
        let models = self
            .models
            .clone()
            .ok_or_else(|| InstantiationError::new("Sort values were declared without a model"))?;
        Ok(ModelScope::instantiate(models, Some(parent.clone())))
    }
}

enum Bound {
    Natural,
    With {
        scope: Arc<ModelScope>,
        left: SettableValue,
        right: SettableValue,
        compare: Arc<dyn ValueSynth>,
    },
    By {
        left_scope: Arc<ModelScope>,
        right_scope: Arc<ModelScope>,
        left: SettableValue,
        right: SettableValue,
        keys: Vec<(Arc<dyn ValueSynth>, SortComparator)>,
    },
}

pub struct SortComparator {
    sorting: Arc<Sorting>,
    bound: Bound,
}

impl fmt::Debug for SortComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortComparator")
            .field("type", &self.sorting.value_type)
            .field("ascending", &self.sorting.ascending)
            .finish()
    }
}

fn slot(
    scope: &Arc<ModelScope>,
    id: &Option<ComponentId>,
    ty: &ValueType,
    role: &str,
) -> InstantiateResult<SettableValue> {
    let id = id
        .as_ref()
        .ok_or_else(|| InstantiationError::new(format!("Sort has no {} value", role)))?;
    let value = SettableValue::new(ty.clone(), Value::Null);
    scope.satisfy(id, LiveValue::Value(value.clone()), SatisfyPolicy::Replace)?;
    Ok(value)
}

impl SortComparator {
    pub fn new(sorting: Arc<Sorting>, parent: &Arc<ModelScope>) -> InstantiateResult<Self> {
        let ty = &sorting.value_type;
        let bound = match &sorting.mode {
            SortMode::Natural => Bound::Natural,
            SortMode::With { compare } => {
                let scope = sorting.bound_scope(parent)?;
                let left = slot(&scope, &sorting.value_as, ty, "left")?;
                let right = slot(&scope, &sorting.compare_as, ty, "right")?;
                Bound::With {
                    scope,
                    left,
                    right,
                    compare: compare.clone(),
                }
            }
            SortMode::By(keys) => {
                let left_scope = sorting.bound_scope(parent)?;
                let right_scope = sorting.bound_scope(parent)?;
                let left = slot(&left_scope, &sorting.value_as, ty, "left")?;
                let right = slot(&right_scope, &sorting.value_as, ty, "right")?;
                let keys = keys
                    .iter()
                    .map(|k| Ok((k.key.clone(), SortComparator::new(k.sorting.clone(), &left_scope)?)))
                    .collect::<InstantiateResult<Vec<_>>>()?;
                Bound::By {
                    left_scope,
                    right_scope,
                    left,
                    right,
                    keys,
                }
            }
        };
        Ok(Self { sorting, bound })
    }

    pub fn sorting(&self) -> &Arc<Sorting> {
        &self.sorting
    }

    /// Signed comparison: negative, zero or positive
    pub fn compare(&self, a: &Value, b: &Value) -> InstantiateResult<i64> {
        let raw = match &self.bound {
            Bound::Natural => natural_compare(a, b) as i64,
            Bound::With {
                scope,
                left,
                right,
                compare,
            } => {
                set(left, a)?;
                set(right, b)?;
                match compare.current(scope)? {
                    // No preference
                    Value::Null => 0,
                    Value::Int(i) => i.signum(),
                    Value::Float(f) if f > 0.0 => 1,
                    Value::Float(f) if f < 0.0 => -1,
                    Value::Float(_) => 0,
                    other => {
                        return Err(InstantiationError::new(format!(
                            "Sort comparison produced {}, expected an integer",
                            other
                        )))
                    }
                }
            }
            Bound::By {
                left_scope,
                right_scope,
                left,
                right,
                keys,
            } => {
                set(left, a)?;
                set(right, b)?;
                let mut result = 0;
                for (key, comparator) in keys {
                    let key_a = key.current(left_scope)?;
                    let key_b = key.current(right_scope)?;
                    result = comparator.compare(&key_a, &key_b)?;
                    if result != 0 {
                        break;
                    }
                }
                result
            }
        };
        trace!(%a, %b, raw, "sort: compare");
        Ok(if self.sorting.ascending { raw } else { -raw })
    }

    pub fn ordering(&self, a: &Value, b: &Value) -> InstantiateResult<Ordering> {
        Ok(self.compare(a, b)?.cmp(&0))
    }

    /// Stable merge sort. Comparisons come from user expressions and need not
    /// form a total order; the result is then some permutation of `items`.
    /// The first failing comparison stops the sort and leaves `items` in an
    /// unspecified order.
    pub fn sort(&self, items: &mut Vec<Value>) -> InstantiateResult<()> {
        if items.len() < 2 {
            return Ok(());
        }
        let mut source = std::mem::take(items);
        let mut target = Vec::with_capacity(source.len());
        let result = self.merge_passes(&mut source, &mut target);
        *items = source;
        result.map_err(|err| err.wrap("Could not sort collection"))
    }

    /// Bottom-up merging of runs of doubling width; the sorted data ends in
    /// `source`
    fn merge_passes(&self, source: &mut Vec<Value>, target: &mut Vec<Value>) -> InstantiateResult<()> {
        let len = source.len();
        let mut width = 1;
        while width < len {
            let mut pending = std::mem::take(source).into_iter();
            let mut start = 0;
            while start < len {
                let mid = (start + width).min(len);
                let end = (start + 2 * width).min(len);
                let left: Vec<Value> = pending.by_ref().take(mid - start).collect();
                let right: Vec<Value> = pending.by_ref().take(end - mid).collect();
                if let Err(err) = self.merge(left, right, target) {
                    target.extend(pending);
                    std::mem::swap(source, target);
                    return Err(err);
                }
                start = end;
            }
            std::mem::swap(source, target);
            width *= 2;
        }
        Ok(())
    }

    /// Merge two sorted runs into `out`, taking from `left` on ties. On
    /// failure every remaining value is still moved into `out`.
    fn merge(&self, left: Vec<Value>, right: Vec<Value>, out: &mut Vec<Value>) -> InstantiateResult<()> {
        let mut left = left.into_iter().peekable();
        let mut right = right.into_iter().peekable();
        let mut failure = None;
        while let (Some(a), Some(b)) = (left.peek(), right.peek()) {
            match self.compare(a, b) {
                Ok(order) if order > 0 => out.extend(right.next()),
                Ok(_) => out.extend(left.next()),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }
        out.extend(left);
        out.extend(right);
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn set(slot: &SettableValue, value: &Value) -> InstantiateResult<()> {
    slot.set(value.clone()).map(|_| ()).map_err(InstantiationError::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::model_namespace::ModelSet;

    fn scope() -> Arc<ModelScope> {
        ModelScope::instantiate(InterpretedModelSet::new(ModelSet::empty("root"), None), None)
    }

    #[test]
    fn test_natural_descending() {
        let sorting = Arc::new(Sorting::natural(ValueType::Int, false));
        let comparator = SortComparator::new(sorting, &scope()).unwrap();
        let mut items = vec![Value::Int(1), Value::Null, Value::Int(3), Value::Int(2)];
        comparator.sort(&mut items).unwrap();
        assert_eq!(items, vec![Value::Null, Value::Int(3), Value::Int(2), Value::Int(1)]);
    }

    #[test]
    fn test_with_mode_requires_models() {
        let sorting = Sorting {
            mode: SortMode::With {
                compare: Arc::new(crate::features::value_synth::ConstantSynth::new(ValueType::Int, Value::Int(0))),
            },
            ..Sorting::natural(ValueType::Int, true)
        };
        let err = SortComparator::new(Arc::new(sorting), &scope()).unwrap_err();
        assert_eq!(err.message(), "Sort values were declared without a model");
    }

    #[test]
    fn test_sort_keeps_every_item() {
        let sorting = Arc::new(Sorting::natural(ValueType::Int, true));
        let comparator = SortComparator::new(sorting, &scope()).unwrap();
        let mut items: Vec<Value> = (0..37).rev().map(Value::Int).collect();
        comparator.sort(&mut items).unwrap();
        assert_eq!(items, (0..37).map(Value::Int).collect::<Vec<_>>());
    }
}
