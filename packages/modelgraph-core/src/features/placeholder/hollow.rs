//! Hollow (placeholder) state machine
//!
//! A placeholder is a single-assignment future in two steps:
//!
//! ```text
//! Empty ──satisfy_type──▶ TypeBound ──satisfy_value──▶ ValueBound
//! ```
//!
//! Type satisfaction happens during interpretation and is idempotent for a
//! compatible type. Value satisfaction happens per runtime scope and obeys a
//! [`SatisfyPolicy`] when the slot is already filled.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{InstantiateResult, InstantiationError, InterpretResult, TypeResolutionError};
use crate::shared::models::{InstanceType, LiveValue, ModelShape};

/// What to do when a value is written into an already satisfied slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SatisfyPolicy {
    /// Fail with an InstantiationError
    #[default]
    Error,
    /// Keep the existing value
    Ignore,
    /// Overwrite the existing value
    Replace,
}

#[derive(Debug, Clone)]
pub enum HollowState {
    Empty,
    TypeBound(InstanceType),
    ValueBound(InstanceType, LiveValue),
}

impl HollowState {
    pub fn instance_type(&self) -> Option<&InstanceType> {
        match self {
            HollowState::Empty => None,
            HollowState::TypeBound(ty) | HollowState::ValueBound(ty, _) => Some(ty),
        }
    }
}

impl fmt::Display for HollowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HollowState::Empty => write!(f, "empty"),
            HollowState::TypeBound(ty) => write!(f, "typed {}", ty),
            HollowState::ValueBound(ty, _) => write!(f, "satisfied {}", ty),
        }
    }
}

/// One placeholder slot
#[derive(Debug, Clone)]
pub struct Hollow {
    name: String,
    shape: ModelShape,
    state: HollowState,
}

impl Hollow {
    pub fn new(name: impl Into<String>, shape: ModelShape) -> Self {
        Self {
            name: name.into(),
            shape,
            state: HollowState::Empty,
        }
    }

    /// Slot whose type is already known
    pub fn typed(name: impl Into<String>, ty: InstanceType) -> Self {
        Self {
            name: name.into(),
            shape: ty.shape,
            state: HollowState::TypeBound(ty),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> ModelShape {
        self.shape
    }

    pub fn state(&self) -> &HollowState {
        &self.state
    }

    pub fn instance_type(&self) -> Option<&InstanceType> {
        self.state.instance_type()
    }

    pub fn is_satisfied(&self) -> bool {
        matches!(self.state, HollowState::ValueBound(..))
    }

    /// Bind the element type
    ///
    /// Binding a type the current one accepts is a no-op; anything else fails
    /// naming both types.
    pub fn satisfy_type(&mut self, ty: InstanceType) -> InterpretResult<()> {
        match &self.state {
            HollowState::Empty => {
                if !self.shape.accepts(ty.shape) {
                    return Err(TypeResolutionError::new(format!(
                        "Placeholder '{}' is declared as {} and cannot be typed as {}",
                        self.name, self.shape, ty
                    )));
                }
                self.state = HollowState::TypeBound(ty);
                Ok(())
            }
            HollowState::TypeBound(existing) | HollowState::ValueBound(existing, _) => {
                if existing.is_assignable_from(&ty) {
                    Ok(())
                } else {
                    Err(TypeResolutionError::new(format!(
                        "Placeholder '{}' is already typed as {} and cannot be re-satisfied as {}",
                        self.name, existing, ty
                    )))
                }
            }
        }
    }

    /// Write the live value
    pub fn satisfy_value(&mut self, value: LiveValue, policy: SatisfyPolicy) -> InstantiateResult<bool> {
        let ty = match &self.state {
            HollowState::Empty => {
                return Err(InstantiationError::new(format!(
                    "Placeholder '{}' must be typed before it can be satisfied",
                    self.name
                )))
            }
            HollowState::TypeBound(ty) => ty.clone(),
            HollowState::ValueBound(ty, _) => match policy {
                SatisfyPolicy::Error => {
                    return Err(InstantiationError::new(format!(
                        "Model value '{}' has already been satisfied",
                        self.name
                    )))
                }
                SatisfyPolicy::Ignore => return Ok(false),
                SatisfyPolicy::Replace => ty.clone(),
            },
        };
        if !value.fits(&ty) {
            return Err(InstantiationError::new(format!(
                "A {} cannot satisfy model value '{}' of type {}",
                value.shape(),
                self.name,
                ty
            )));
        }
        if let (Some(settable), Some(expected)) = (value.as_settable(), ty.element_type()) {
            if !expected.is_assignable_from(settable.value_type()) {
                return Err(InstantiationError::new(format!(
                    "A value of type {} cannot satisfy model value '{}' of type {}",
                    settable.value_type(),
                    self.name,
                    ty
                )));
            }
        }
        self.state = HollowState::ValueBound(ty, value);
        Ok(true)
    }

    /// The satisfied value
    pub fn value(&self) -> InstantiateResult<&LiveValue> {
        match &self.state {
            HollowState::ValueBound(_, value) => Ok(value),
            _ => Err(InstantiationError::new(format!(
                "Model value '{}' has not been satisfied",
                self.name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{Value, ValueType};

    fn string_value(s: &str) -> LiveValue {
        LiveValue::constant(ValueType::String, Value::str(s))
    }

    #[test]
    fn test_type_then_value() {
        let mut hollow = Hollow::new("title", ModelShape::Value);
        assert!(hollow.instance_type().is_none());
        hollow.satisfy_type(InstanceType::value(ValueType::String)).unwrap();
        assert!(hollow.value().is_err());
        assert!(hollow.satisfy_value(string_value("a"), SatisfyPolicy::Error).unwrap());
        assert_eq!(hollow.value().unwrap().current(), Value::str("a"));
    }

    #[test]
    fn test_retype_same_is_idempotent() {
        let mut hollow = Hollow::new("title", ModelShape::Value);
        hollow.satisfy_type(InstanceType::value(ValueType::String)).unwrap();
        hollow.satisfy_type(InstanceType::value(ValueType::String)).unwrap();
        assert_eq!(
            hollow.instance_type(),
            Some(&InstanceType::value(ValueType::String))
        );
    }

    #[test]
    fn test_retype_incompatible_names_both_types() {
        let mut hollow = Hollow::new("title", ModelShape::Value);
        hollow.satisfy_type(InstanceType::value(ValueType::String)).unwrap();
        let err = hollow
            .satisfy_type(InstanceType::value(ValueType::Int))
            .unwrap_err();
        assert!(err.message().contains("Value<string>"));
        assert!(err.message().contains("Value<int>"));
    }

    #[test]
    fn test_shape_mismatch() {
        let mut hollow = Hollow::new("rows", ModelShape::Collection);
        assert!(hollow.satisfy_type(InstanceType::value(ValueType::Int)).is_err());
        assert!(hollow
            .satisfy_type(InstanceType::sorted_collection(ValueType::Int))
            .is_ok());
    }

    #[test]
    fn test_policies() {
        let mut hollow = Hollow::typed("t", InstanceType::value(ValueType::String));
        hollow.satisfy_value(string_value("a"), SatisfyPolicy::Error).unwrap();

        assert!(hollow.satisfy_value(string_value("b"), SatisfyPolicy::Error).is_err());
        assert_eq!(hollow.value().unwrap().current(), Value::str("a"));

        assert!(!hollow.satisfy_value(string_value("c"), SatisfyPolicy::Ignore).unwrap());
        assert_eq!(hollow.value().unwrap().current(), Value::str("a"));

        assert!(hollow.satisfy_value(string_value("d"), SatisfyPolicy::Replace).unwrap());
        assert_eq!(hollow.value().unwrap().current(), Value::str("d"));
    }

    #[test]
    fn test_wrong_element_type_rejected() {
        let mut hollow = Hollow::typed("t", InstanceType::value(ValueType::Int));
        assert!(hollow.satisfy_value(string_value("a"), SatisfyPolicy::Error).is_err());
        assert!(!hollow.is_satisfied());
    }

    #[test]
    fn test_untyped_cannot_take_value() {
        let mut hollow = Hollow::new("t", ModelShape::Value);
        assert!(hollow.satisfy_value(string_value("a"), SatisfyPolicy::Replace).is_err());
    }

    #[test]
    fn test_wrong_shape_value_rejected() {
        let mut hollow = Hollow::typed("t", InstanceType::event(ValueType::Any));
        assert!(hollow.satisfy_value(string_value("a"), SatisfyPolicy::Error).is_err());
    }
}
