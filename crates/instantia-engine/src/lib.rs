//! Instantia Engine
//!
//! Runtime object construction behind one factory abstraction:
//! - **Reflection**: type metadata, constructor tables and lookup (`reflect` module)
//! - **Coercion**: argument conversion policies for generic activation (`coerce` module)
//! - **Emission**: callable synthesis from constructor handles (`emit` module)
//! - **Factory**: `ObjectFactory` and its construction strategies (`factory` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use instantia_engine::{
//!     ConstructionSpec, EmitterKind, ObjectFactory, StrategyKind, TypeMetadata, TypeRegistry,
//!     Visibility,
//! };
//! use instantia_sdk::{ParamType, Value};
//!
//! struct ValueHolder { value: String }
//!
//! let registry = Arc::new(TypeRegistry::new());
//! registry.register(
//!     TypeMetadata::builder("ValueHolder")
//!         .constructor(Visibility::Public, |(value,): (String,)| ValueHolder { value })
//!         .field::<ValueHolder, _>("value", |h| Value::str(&h.value))
//!         .build(),
//! );
//!
//! let factories = ObjectFactory::new(registry);
//! let spec = ConstructionSpec::new("ValueHolder", [ParamType::Str]);
//! let factory = factories.build(&spec, StrategyKind::GeneratedCallable(EmitterKind::Expression))?;
//! let holder = factory.invoke(&[Value::str("hello")])?;
//! assert_eq!(holder.field("value"), Some(Value::str("hello")));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Argument coercion policies
pub mod coerce;

/// Factory configuration
pub mod config;

/// Callable synthesis: instruction and expression emitters
pub mod emit;

/// Error types
pub mod error;

/// Object factory and construction strategies
pub mod factory;

/// Type metadata and constructor lookup
pub mod reflect;

pub use coerce::{ArgumentCoercion, CoercionConfig, CoercionError, ExactCoercion, InvariantCoercion, LocaleCoercion};
pub use config::{ConfigError, FactoryConfig};
pub use emit::{Callable, CodeEmitter, DelegateShape, EmitError, EmitterKind, EmitterOptions};
pub use error::{ConstructionError, ConstructionResult};
pub use factory::{
    ConstructionSpec, ConstructionStrategy, Factory, ObjectFactory, ParseStrategyError, StrategyKind,
    TypedFactory,
};
pub use reflect::{
    ConstructorFn, ConstructorHandle, ConstructorInfo, ConstructorLocator, TypeMetadata, TypeMetadataBuilder,
    TypeRegistry, Visibility,
};
