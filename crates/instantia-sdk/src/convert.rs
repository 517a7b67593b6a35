//! Traits for converting between argument values and Rust types.
//!
//! `FromValue` extracts a single typed argument; `ArgList` describes a whole
//! constructor parameter list (a tuple of `FromValue` types) so a plain Rust
//! closure can be registered as a constructor and its signature derived
//! from its argument types.
//!
//! # Example
//!
//! ```ignore
//! use instantia_sdk::{ArgList, ParamType, Value};
//!
//! assert_eq!(<(String, i64)>::signature().params(), &[ParamType::Str, ParamType::Int]);
//! let (name, age) = <(String, i64)>::from_values(&[Value::str("ada"), Value::Int(36)])?;
//! ```

use std::sync::Arc;

use crate::error::{InvokeError, InvokeResult};
use crate::value::{ParamType, Signature, Value};

/// Extract a Rust value from an exactly-typed argument.
pub trait FromValue: Sized {
    /// Parameter type this Rust type binds to
    const PARAM_TYPE: ParamType;

    /// Convert from a value, `None` if the value has a different type
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for bool {
    const PARAM_TYPE: ParamType = ParamType::Bool;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for i64 {
    const PARAM_TYPE: ParamType = ParamType::Int;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_int()
    }
}

impl FromValue for i32 {
    const PARAM_TYPE: ParamType = ParamType::Int;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_int().and_then(|i| i32::try_from(i).ok())
    }
}

impl FromValue for f64 {
    const PARAM_TYPE: ParamType = ParamType::Float;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_float()
    }
}

impl FromValue for String {
    const PARAM_TYPE: ParamType = ParamType::Str;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromValue for Arc<str> {
    const PARAM_TYPE: ParamType = ParamType::Str;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(Arc::clone(s)),
            _ => None,
        }
    }
}

fn extract<T: FromValue>(args: &[Value], index: usize) -> InvokeResult<T> {
    let value = &args[index];
    T::from_value(value).ok_or(InvokeError::TypeMismatch {
        index,
        expected: T::PARAM_TYPE.name(),
        got: value.type_name(),
    })
}

/// An ordered constructor parameter list.
///
/// Implemented for `()` and tuples of up to four `FromValue` types.
pub trait ArgList: Sized {
    /// Signature derived from the element types
    fn signature() -> Signature;

    /// Extract the tuple from an argument slice
    fn from_values(args: &[Value]) -> InvokeResult<Self>;

    /// Convert the tuple back into argument values
    fn into_values(self) -> Vec<Value>;
}

fn check_arity(expected: usize, args: &[Value]) -> InvokeResult<()> {
    if args.len() != expected {
        return Err(InvokeError::ArityMismatch {
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

impl ArgList for () {
    fn signature() -> Signature {
        Signature::empty()
    }

    fn from_values(args: &[Value]) -> InvokeResult<Self> {
        check_arity(0, args)
    }

    fn into_values(self) -> Vec<Value> {
        Vec::new()
    }
}

macro_rules! impl_arg_list {
    ($count:expr; $($ty:ident => $idx:tt),+) => {
        impl<$($ty),+> ArgList for ($($ty,)+)
        where
            $($ty: FromValue + Into<Value>),+
        {
            fn signature() -> Signature {
                Signature::from([$(<$ty as FromValue>::PARAM_TYPE),+])
            }

            fn from_values(args: &[Value]) -> InvokeResult<Self> {
                check_arity($count, args)?;
                Ok(($(extract::<$ty>(args, $idx)?,)+))
            }

            fn into_values(self) -> Vec<Value> {
                vec![$(self.$idx.into()),+]
            }
        }
    };
}

impl_arg_list!(1; A => 0);
impl_arg_list!(2; A => 0, B => 1);
impl_arg_list!(3; A => 0, B => 1, C => 2);
impl_arg_list!(4; A => 0, B => 1, C => 2, D => 3);
