//! Instantia SDK - lightweight types shared by constructors and factories
//!
//! This crate provides the minimal types needed to describe a constructor
//! and the values flowing through it without depending on the full
//! instantia-engine:
//!
//! - [`Value`] / [`ParamType`] / [`Signature`]: the argument calling convention
//! - [`FromValue`] / [`ArgList`]: typed extraction so ordinary Rust closures
//!   can serve as constructors
//! - [`Instance`] / [`FieldTable`]: owned, type-erased constructed objects
//! - [`InvokeError`]: what a raw constructor function may fail with
//!
//! # Example
//!
//! ```ignore
//! use instantia_sdk::{ArgList, Value};
//!
//! let (value,) = <(String,)>::from_values(&[Value::str("hello")])?;
//! ```

#![warn(missing_docs)]

pub mod convert;
pub mod error;
pub mod instance;
pub mod value;

pub use convert::{ArgList, FromValue};
pub use error::{InvokeError, InvokeResult};
pub use instance::{AnyBox, FieldReader, FieldTable, Instance};
pub use value::{ParamType, Signature, Value};
