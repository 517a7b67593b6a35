//! Instance: an owned, type-erased constructed value
//!
//! Every construction strategy hands back an `Instance`. It owns the
//! produced object outright; the factory that created it keeps no
//! reference. Fields can be read back generically through the type's
//! `FieldTable`, which is how instances produced by different strategies
//! are compared without knowing their concrete Rust type.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// Type-erased object storage
pub type AnyBox = Box<dyn Any + Send + Sync>;

/// Reads one field out of a type-erased object
pub type FieldReader = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> Option<Value> + Send + Sync>;

/// Named field readers of a type, in declaration order
#[derive(Clone, Default)]
pub struct FieldTable {
    names: Vec<Arc<str>>,
    readers: Vec<FieldReader>,
}

impl FieldTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a typed field reader
    ///
    /// The reader returns `None` when handed an object of another type.
    pub fn add<T, F>(&mut self, name: &str, read: F)
    where
        T: Any,
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        let reader: FieldReader =
            Arc::new(move |obj: &(dyn Any + Send + Sync)| obj.downcast_ref::<T>().map(&read));
        self.names.push(Arc::from(name));
        self.readers.push(reader);
    }

    /// Field names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|n| &**n)
    }

    /// Get field index by name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| &**n == name)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if the table has no fields
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl fmt::Debug for FieldTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// A constructed object
pub struct Instance {
    type_name: Arc<str>,
    fields: Arc<FieldTable>,
    value: AnyBox,
}

impl Instance {
    /// Wrap a freshly constructed object
    pub fn new(type_name: Arc<str>, fields: Arc<FieldTable>, value: AnyBox) -> Self {
        Self {
            type_name,
            fields,
            value,
        }
    }

    /// Name of the type this instance was constructed as
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Check the concrete Rust type
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Borrow as the concrete Rust type
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Take ownership as the concrete Rust type, handing the instance
    /// back unchanged when the type does not match
    pub fn downcast<T: Any>(self) -> Result<T, Instance> {
        let Instance {
            type_name,
            fields,
            value,
        } = self;
        match value.downcast::<T>() {
            Ok(boxed) => Ok(*boxed),
            Err(value) => Err(Instance {
                type_name,
                fields,
                value,
            }),
        }
    }

    /// Read a field by name
    pub fn field(&self, name: &str) -> Option<Value> {
        let index = self.fields.index_of(name)?;
        (self.fields.readers[index])(&*self.value)
    }

    /// Snapshot of every readable field, in declaration order
    pub fn fields(&self) -> Vec<(String, Value)> {
        self.fields
            .names
            .iter()
            .zip(self.fields.readers.iter())
            .filter_map(|(name, read)| read(&*self.value).map(|v| (name.to_string(), v)))
            .collect()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(&self.type_name);
        for (name, value) in self.fields() {
            s.field(&name, &value);
        }
        s.finish()
    }
}
