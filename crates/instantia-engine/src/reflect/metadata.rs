//! Type Metadata for Reflection
//!
//! Stores the constructor table and field readers of one registered type.
//! Metadata is assembled once through [`TypeMetadataBuilder`] and is
//! immutable afterwards; the registry shares it behind an `Arc`.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use instantia_sdk::{AnyBox, ArgList, FieldTable, InvokeError, InvokeResult, Signature, Value};

/// Raw constructor function: extracts its own arguments and builds the object
pub type ConstructorFn = Arc<dyn Fn(&[Value]) -> InvokeResult<AnyBox> + Send + Sync>;

/// Constructor access level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Reachable by every strategy
    #[default]
    Public,
    /// Reachable only by strategies that may bypass access checks
    Private,
}

impl Visibility {
    /// Check if public
    pub fn is_public(self) -> bool {
        self == Visibility::Public
    }
}

/// Constructor information for reflection
#[derive(Clone)]
pub struct ConstructorInfo {
    /// Parameter types in order
    pub signature: Signature,
    /// Access level
    pub visibility: Visibility,
    /// Position in the declaring type's constructor table
    pub index: usize,
    function: ConstructorFn,
}

impl ConstructorInfo {
    /// The raw constructor function
    pub fn function(&self) -> &ConstructorFn {
        &self.function
    }

    /// Run the raw constructor
    #[inline]
    pub fn call(&self, args: &[Value]) -> InvokeResult<AnyBox> {
        (self.function)(args)
    }
}

impl fmt::Debug for ConstructorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorInfo")
            .field("signature", &self.signature)
            .field("visibility", &self.visibility)
            .field("index", &self.index)
            .finish()
    }
}

/// Reflection metadata for a single type
#[derive(Debug, Clone)]
pub struct TypeMetadata {
    name: Arc<str>,
    constructors: Vec<ConstructorInfo>,
    fields: Arc<FieldTable>,
}

impl TypeMetadata {
    /// Start describing a type
    pub fn builder(name: &str) -> TypeMetadataBuilder {
        TypeMetadataBuilder {
            name: Arc::from(name),
            constructors: Vec::new(),
            fields: FieldTable::new(),
        }
    }

    /// Type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared type name
    pub fn name_arc(&self) -> &Arc<str> {
        &self.name
    }

    /// All constructors in declaration order
    pub fn constructors(&self) -> &[ConstructorInfo] {
        &self.constructors
    }

    /// Field readers
    pub fn fields(&self) -> &Arc<FieldTable> {
        &self.fields
    }

    /// Get the constructor whose signature is exactly `params`
    pub fn constructor(&self, params: &[instantia_sdk::ParamType]) -> Option<&ConstructorInfo> {
        self.constructors
            .iter()
            .find(|c| c.signature.params() == params)
    }

    /// Check if a constructor with exactly `params` exists
    pub fn has_constructor(&self, params: &[instantia_sdk::ParamType]) -> bool {
        self.constructor(params).is_some()
    }
}

/// Builder for [`TypeMetadata`]
pub struct TypeMetadataBuilder {
    name: Arc<str>,
    constructors: Vec<ConstructorInfo>,
    fields: FieldTable,
}

impl TypeMetadataBuilder {
    /// Add an infallible constructor; the signature is taken from `A`
    pub fn constructor<A, T, F>(self, visibility: Visibility, ctor: F) -> Self
    where
        A: ArgList,
        T: Any + Send + Sync,
        F: Fn(A) -> T + Send + Sync + 'static,
    {
        let function: ConstructorFn =
            Arc::new(move |args: &[Value]| Ok(Box::new(ctor(A::from_values(args)?)) as AnyBox));
        self.raw_constructor(A::signature(), visibility, function)
    }

    /// Add a constructor that may fail; its error is reported as a
    /// construction failure
    pub fn try_constructor<A, T, E, F>(self, visibility: Visibility, ctor: F) -> Self
    where
        A: ArgList,
        T: Any + Send + Sync,
        E: fmt::Display,
        F: Fn(A) -> Result<T, E> + Send + Sync + 'static,
    {
        let function: ConstructorFn = Arc::new(move |args: &[Value]| {
            let value = ctor(A::from_values(args)?)
                .map_err(|e| InvokeError::Failed(e.to_string()))?;
            Ok(Box::new(value) as AnyBox)
        });
        self.raw_constructor(A::signature(), visibility, function)
    }

    /// Add an untyped constructor function
    ///
    /// Declaring a signature twice replaces the earlier constructor.
    pub fn raw_constructor(
        mut self,
        signature: Signature,
        visibility: Visibility,
        function: ConstructorFn,
    ) -> Self {
        if let Some(existing) = self
            .constructors
            .iter_mut()
            .find(|c| c.signature == signature)
        {
            existing.visibility = visibility;
            existing.function = function;
            return self;
        }
        let index = self.constructors.len();
        self.constructors.push(ConstructorInfo {
            signature,
            visibility,
            index,
            function,
        });
        self
    }

    /// Add a readable field
    pub fn field<T, F>(mut self, name: &str, read: F) -> Self
    where
        T: Any,
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        self.fields.add::<T, F>(name, read);
        self
    }

    /// Finish the metadata
    pub fn build(self) -> TypeMetadata {
        TypeMetadata {
            name: self.name,
            constructors: self.constructors,
            fields: Arc::new(self.fields),
        }
    }
}
