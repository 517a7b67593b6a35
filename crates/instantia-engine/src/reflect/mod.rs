//! Reflection runtime
//!
//! Provides type metadata storage and constructor resolution by signature.
//! There is no runtime introspection of Rust types: a type becomes visible
//! here only by registering a [`TypeMetadata`] with a [`TypeRegistry`].
//!
//! ## Usage
//!
//! ```ignore
//! let registry = TypeRegistry::new();
//! registry.register(
//!     TypeMetadata::builder("ValueHolder")
//!         .constructor(Visibility::Public, |(value,): (String,)| ValueHolder::new(value))
//!         .field::<ValueHolder, _>("value", |h| Value::str(h.value()))
//!         .build(),
//! );
//!
//! let ctor = registry.find("ValueHolder", &[ParamType::Str]).unwrap();
//! let instance = ctor.invoke(&[Value::str("hello")])?;
//! ```

mod metadata;
mod registry;

pub use metadata::{ConstructorFn, ConstructorInfo, TypeMetadata, TypeMetadataBuilder, Visibility};
pub use registry::{ConstructorHandle, ConstructorLocator, TypeRegistry};
