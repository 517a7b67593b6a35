//! Value: loosely-typed constructor argument
//!
//! Arguments cross the factory boundary as `Value`s so that every
//! construction strategy can share one calling convention. Heap data
//! (strings) is reference-counted, so cloning a `Value` never copies
//! the payload.
//!
//! # Parameter types
//!
//! ```text
//! Value::Null      -> (no parameter type)
//! Value::Bool(_)   -> ParamType::Bool   "bool"
//! Value::Int(_)    -> ParamType::Int    "int"
//! Value::Float(_)  -> ParamType::Float  "float"
//! Value::Str(_)    -> ParamType::Str    "str"
//! ```

use std::fmt;
use std::sync::Arc;

/// Semantic type of a constructor parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamType {
    /// Boolean
    Bool,
    /// 64-bit signed integer
    Int,
    /// 64-bit float
    Float,
    /// UTF-8 string
    Str,
}

impl ParamType {
    /// Short name used in signatures and diagnostics
    pub const fn name(self) -> &'static str {
        match self {
            ParamType::Bool => "bool",
            ParamType::Int => "int",
            ParamType::Float => "float",
            ParamType::Str => "str",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered parameter list of a constructor.
///
/// Order-sensitive: `(str, int)` and `(int, str)` are different signatures.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Signature(Arc<[ParamType]>);

impl Signature {
    /// Create a signature from parameter types
    pub fn new(params: impl Into<Vec<ParamType>>) -> Self {
        Self(Arc::from(params.into()))
    }

    /// Signature with no parameters
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parameter types in declaration order
    #[inline]
    pub fn params(&self) -> &[ParamType] {
        &self.0
    }

    /// Number of parameters
    #[inline]
    pub fn arity(&self) -> usize {
        self.0.len()
    }

    /// Whether `args` has exactly this signature's arity and types
    pub fn accepts(&self, args: &[Value]) -> bool {
        args.len() == self.0.len()
            && args
                .iter()
                .zip(self.0.iter())
                .all(|(arg, ty)| arg.param_type() == Some(*ty))
    }

    /// Describe the runtime types of an argument list, e.g. `(str, null)`
    pub fn describe_args(args: &[Value]) -> String {
        let names: Vec<&str> = args.iter().map(Value::type_name).collect();
        format!("({})", names.join(", "))
    }
}

impl From<&[ParamType]> for Signature {
    fn from(params: &[ParamType]) -> Self {
        Self(Arc::from(params))
    }
}

impl<const N: usize> From<[ParamType; N]> for Signature {
    fn from(params: [ParamType; N]) -> Self {
        Self(Arc::from(params.as_slice()))
    }
}

impl From<Vec<ParamType>> for Signature {
    fn from(params: Vec<ParamType>) -> Self {
        Self::new(params)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, ty) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(ty.name())?;
        }
        f.write_str(")")
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature{}", self)
    }
}

/// Constructor argument value.
#[derive(Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// Shared string
    Str(Arc<str>),
}

impl Value {
    /// Create a string value
    #[inline]
    pub fn str(s: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(s.as_ref()))
    }

    /// Parameter type this value satisfies exactly (`None` for null)
    #[inline]
    pub const fn param_type(&self) -> Option<ParamType> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(ParamType::Bool),
            Value::Int(_) => Some(ParamType::Int),
            Value::Float(_) => Some(ParamType::Float),
            Value::Str(_) => Some(ParamType::Str),
        }
    }

    /// Get type name for diagnostics
    pub const fn type_name(&self) -> &'static str {
        match self.param_type() {
            Some(ty) => ty.name(),
            None => "null",
        }
    }

    /// Check if value is null
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Extract boolean value
    #[inline]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract integer value
    #[inline]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract float value
    #[inline]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Borrow string value
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Value::Null"),
            Value::Bool(b) => write!(f, "Value::Bool({})", b),
            Value::Int(i) => write!(f, "Value::Int({})", i),
            Value::Float(x) => write!(f, "Value::Float({})", x),
            Value::Str(s) => write!(f, "Value::Str({:?})", s),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<Arc<str>> for Value {
    fn from(s: Arc<str>) -> Self {
        Value::Str(s)
    }
}
