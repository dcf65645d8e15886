//! Stock element kinds
//!
//! - structural: `group`, `models` (with a local model), `required` (with
//!   required external values), `ext-value` and `model` (a named sub-model)
//! - declarations: `value`, `derived`, `event`, `list`

mod group;
mod maker;
mod model;
mod value;

pub use group::{ExtValueDef, GroupDef, GroupInstance, GroupInterp};
pub use maker::{MakerKind, ValueMaker};
pub use model::ModelDef;
pub use value::{ListDef, ListInterp, ValueDef, ValueInstance, ValueInterp};

pub const GROUP_TYPE: &str = "group";
pub const MODELS_TYPE: &str = "models";
pub const REQUIRED_TYPE: &str = "required";
pub const MODEL_TYPE: &str = "model";
pub const VALUE_TYPE: &str = "value";
pub const DERIVED_TYPE: &str = "derived";
pub const EVENT_TYPE: &str = "event";
pub const LIST_TYPE: &str = "list";
