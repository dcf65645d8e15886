//! Live containers
//!
//! Minimal reactive leaves the compiler wires together. They are opaque to the
//! lifecycle machinery: it only creates them, hands them around by clone
//! (clones share state) and reads their current value.

use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::model_type::{InstanceType, ModelShape};
use super::value::{Value, ValueType};

/// Settable single value
#[derive(Clone)]
pub struct SettableValue {
    ty: ValueType,
    cell: Arc<RwLock<Value>>,
    stamp: Arc<AtomicU64>,
}

impl SettableValue {
    pub fn new(ty: ValueType, initial: Value) -> Self {
        Self {
            ty,
            cell: Arc::new(RwLock::new(initial)),
            stamp: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn value_type(&self) -> &ValueType {
        &self.ty
    }

    pub fn get(&self) -> Value {
        self.cell.read().clone()
    }

    /// Replace the value, returning the previous one
    pub fn set(&self, value: Value) -> Result<Value, String> {
        if !value.conforms_to(&self.ty) {
            return Err(format!("{} is not a valid {}", value, self.ty));
        }
        let previous = std::mem::replace(&mut *self.cell.write(), value);
        self.stamp.fetch_add(1, Ordering::Relaxed);
        Ok(previous)
    }

    /// Number of successful writes
    pub fn stamp(&self) -> u64 {
        self.stamp.load(Ordering::Relaxed)
    }

    pub fn shares_state_with(&self, other: &SettableValue) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl fmt::Debug for SettableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettableValue")
            .field("type", &self.ty)
            .field("value", &*self.cell.read())
            .finish()
    }
}

type Listener = Box<dyn Fn(&Value) + Send + Sync>;

/// Event stream with synchronous listeners
#[derive(Clone)]
pub struct EventStream {
    ty: ValueType,
    listeners: Arc<Mutex<Vec<Listener>>>,
    fired: Arc<AtomicU64>,
}

impl EventStream {
    pub fn new(ty: ValueType) -> Self {
        Self {
            ty,
            listeners: Arc::new(Mutex::new(Vec::new())),
            fired: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn value_type(&self) -> &ValueType {
        &self.ty
    }

    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.listeners.lock().push(Box::new(listener));
    }

    pub fn fire(&self, value: &Value) {
        self.fired.fetch_add(1, Ordering::Relaxed);
        for listener in self.listeners.lock().iter() {
            listener(value);
        }
    }

    pub fn fire_count(&self) -> u64 {
        self.fired.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("type", &self.ty)
            .field("fired", &self.fire_count())
            .finish()
    }
}

/// Invocable action
#[derive(Clone)]
pub struct ActionHandle {
    ty: ValueType,
    action: Arc<dyn Fn() -> Value + Send + Sync>,
}

impl ActionHandle {
    pub fn new<F>(ty: ValueType, action: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self {
            ty,
            action: Arc::new(action),
        }
    }

    pub fn invoke(&self) -> Value {
        (self.action)()
    }
}

impl fmt::Debug for ActionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionHandle").field("type", &self.ty).finish()
    }
}

/// Ordered collection of values
#[derive(Clone, Debug)]
pub struct LiveCollection {
    ty: ValueType,
    sorted: bool,
    items: Arc<RwLock<Vec<Value>>>,
}

impl LiveCollection {
    pub fn new(ty: ValueType, items: Vec<Value>) -> Self {
        Self {
            ty,
            sorted: false,
            items: Arc::new(RwLock::new(items)),
        }
    }

    pub fn sorted(ty: ValueType, items: Vec<Value>) -> Self {
        Self {
            sorted: true,
            ..Self::new(ty, items)
        }
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn items(&self) -> Vec<Value> {
        self.items.read().clone()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    pub fn push(&self, value: Value) -> Result<(), String> {
        if !value.conforms_to(&self.ty) {
            return Err(format!("{} is not a valid {}", value, self.ty));
        }
        self.items.write().push(value);
        Ok(())
    }
}

/// Key/value map preserving insertion order
#[derive(Clone, Debug)]
pub struct LiveMap {
    key: ValueType,
    value: ValueType,
    entries: Arc<RwLock<Vec<(Value, Value)>>>,
}

impl LiveMap {
    pub fn new(key: ValueType, value: ValueType) -> Self {
        Self {
            key,
            value,
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn insert(&self, key: Value, value: Value) -> Option<Value> {
        let mut entries = self.entries.write();
        if let Some(slot) = entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        entries.push((key, value));
        None
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        self.entries
            .read()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Any live container a component can produce
#[derive(Clone, Debug)]
pub enum LiveValue {
    Value(SettableValue),
    Event(EventStream),
    Action(ActionHandle),
    Collection(LiveCollection),
    Map(LiveMap),
    /// Marker for sub-model components; their members live in the same scope
    Model,
}

impl LiveValue {
    /// Read-only value holding `value`
    pub fn constant(ty: ValueType, value: Value) -> Self {
        LiveValue::Value(SettableValue::new(ty, value))
    }

    pub fn shape(&self) -> ModelShape {
        match self {
            LiveValue::Value(_) => ModelShape::Value,
            LiveValue::Event(_) => ModelShape::Event,
            LiveValue::Action(_) => ModelShape::Action,
            LiveValue::Collection(c) if c.is_sorted() => ModelShape::SortedCollection,
            LiveValue::Collection(_) => ModelShape::Collection,
            LiveValue::Map(_) => ModelShape::Map,
            LiveValue::Model => ModelShape::SubModel,
        }
    }

    /// Whether this container is usable as a component of `ty`
    pub fn fits(&self, ty: &InstanceType) -> bool {
        ty.shape.accepts(self.shape())
    }

    /// Current plain value; collections read as lists
    pub fn current(&self) -> Value {
        match self {
            LiveValue::Value(v) => v.get(),
            LiveValue::Collection(c) => Value::List(c.items()),
            LiveValue::Action(a) => a.invoke(),
            LiveValue::Event(_) | LiveValue::Map(_) | LiveValue::Model => Value::Null,
        }
    }

    pub fn as_settable(&self) -> Option<&SettableValue> {
        match self {
            LiveValue::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_event(&self) -> Option<&EventStream> {
        match self {
            LiveValue::Event(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&LiveCollection> {
        match self {
            LiveValue::Collection(c) => Some(c),
            _ => None,
        }
    }
}
