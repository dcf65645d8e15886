//! Ordered add-on collections with capability lookup

use std::any::Any;
use std::fmt;

/// Common surface of add-on definitions, interpretations and instances
pub trait AddOnKind: fmt::Debug + 'static {
    /// Registered add-on name; interpretations and instances share it with
    /// their definition
    fn add_on_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Add-ons attached to one element phase object, in dependency order
pub struct AddOnSet<T: ?Sized> {
    items: Vec<Box<T>>,
}

impl<T: ?Sized> Default for AddOnSet<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for AddOnSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<T: ?Sized + AddOnKind> AddOnSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter().map(|b| &**b)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut().map(|b| &mut **b)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.items.iter().map(|a| a.add_on_name()).collect()
    }

    /// Add-on with the concrete type `C`
    pub fn get<C: 'static>(&self) -> Option<&C> {
        self.items.iter().find_map(|a| a.as_any().downcast_ref::<C>())
    }

    pub fn get_mut<C: 'static>(&mut self) -> Option<&mut C> {
        self.items
            .iter_mut()
            .find_map(|a| a.as_any_mut().downcast_mut::<C>())
    }

    pub fn get_named(&self, name: &str) -> Option<&T> {
        self.iter().find(|a| a.add_on_name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get_named(name).is_some()
    }

    pub(crate) fn push(&mut self, item: Box<T>) {
        self.items.push(item);
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<Box<T>> {
        &mut self.items
    }
}
