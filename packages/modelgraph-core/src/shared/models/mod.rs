//! Shared data models

pub mod identity;
pub mod live;
pub mod model_type;
pub mod schema;
pub mod span;
pub mod value;

pub use identity::Identity;
pub use live::{ActionHandle, EventStream, LiveCollection, LiveMap, LiveValue, SettableValue};
pub use model_type::{InstanceType, ModelShape};
pub use schema::{ConfigNode, SchemaNode};
pub use span::FilePosition;
pub use value::{RecordType, Value, ValueType};
