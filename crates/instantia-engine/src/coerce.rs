//! Argument coercion policies
//!
//! Generic activation accepts loosely-typed arguments and converts each one
//! to the exact parameter type before invoking the constructor. The rules are
//! an explicit policy object handed to the factory, never process-wide
//! locale state.
//!
//! | from \ to | bool        | int                 | float            | str               |
//! |-----------|-------------|---------------------|------------------|-------------------|
//! | bool      | identity    | -                   | -                | `true`/`false`    |
//! | int       | -           | identity            | widen            | formatted         |
//! | float     | -           | integral values     | identity         | formatted         |
//! | str       | `true/false`| parsed              | parsed           | identity          |
//! | null      | -           | -                   | -                | -                 |
//!
//! `ExactCoercion` only allows the identity column.

use std::sync::Arc;

use serde::Deserialize;

use instantia_sdk::{ParamType, Value};

/// Coercion failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoercionError {
    /// No rule converts this value to the target type
    #[error("Cannot coerce {from} to {to}")]
    Unsupported {
        /// Source type name
        from: &'static str,
        /// Target parameter type
        to: ParamType,
    },

    /// A string did not parse as the target type
    #[error("Cannot parse {text:?} as {to}")]
    Parse {
        /// Input text
        text: String,
        /// Target parameter type
        to: ParamType,
    },

    /// Float has a fractional part or is out of integer range
    #[error("{0} is not an integral value")]
    NotIntegral(f64),

    /// Decimal and group separators are the same character
    #[error("Decimal and group separator are both {0:?}")]
    SeparatorClash(char),
}

/// Converts one argument to a parameter type
pub trait ArgumentCoercion: Send + Sync {
    /// Coerce `value` to `target`
    fn coerce(&self, value: &Value, target: ParamType) -> Result<Value, CoercionError>;
}

fn identity(value: &Value, target: ParamType) -> Option<Value> {
    (value.param_type() == Some(target)).then(|| value.clone())
}

fn unsupported(value: &Value, target: ParamType) -> CoercionError {
    CoercionError::Unsupported {
        from: value.type_name(),
        to: target,
    }
}

/// Only exactly-typed arguments are accepted
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactCoercion;

impl ArgumentCoercion for ExactCoercion {
    fn coerce(&self, value: &Value, target: ParamType) -> Result<Value, CoercionError> {
        identity(value, target).ok_or_else(|| unsupported(value, target))
    }
}

/// Culture-invariant conversions (`.` decimal separator, no grouping)
#[derive(Debug, Clone, Copy, Default)]
pub struct InvariantCoercion;

impl ArgumentCoercion for InvariantCoercion {
    fn coerce(&self, value: &Value, target: ParamType) -> Result<Value, CoercionError> {
        LocaleCoercion::INVARIANT.coerce(value, target)
    }
}

/// Conversions using explicit number formatting rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocaleCoercion {
    decimal_separator: char,
    group_separator: Option<char>,
}

impl LocaleCoercion {
    const INVARIANT: LocaleCoercion = LocaleCoercion {
        decimal_separator: '.',
        group_separator: None,
    };

    /// Create a policy with the given separators
    pub fn new(decimal_separator: char, group_separator: char) -> Result<Self, CoercionError> {
        Self::with_separators(decimal_separator, Some(group_separator))
    }

    fn with_separators(
        decimal_separator: char,
        group_separator: Option<char>,
    ) -> Result<Self, CoercionError> {
        if group_separator == Some(decimal_separator) {
            return Err(CoercionError::SeparatorClash(decimal_separator));
        }
        Ok(Self {
            decimal_separator,
            group_separator,
        })
    }

    /// Create a policy without digit grouping
    pub fn without_grouping(decimal_separator: char) -> Self {
        Self {
            decimal_separator,
            group_separator: None,
        }
    }

    /// Normalise locale text into invariant number syntax.
    ///
    /// Returns `None` when the text carries a `.` or `,` that is not one of
    /// this locale's separators.
    fn normalise(&self, text: &str) -> Option<String> {
        let mut out = String::with_capacity(text.len());
        for c in text.trim().chars() {
            if Some(c) == self.group_separator {
                continue;
            }
            if c == self.decimal_separator {
                out.push('.');
            } else if c == '.' || c == ',' {
                return None;
            } else {
                out.push(c);
            }
        }
        Some(out)
    }

    fn parse_int(&self, text: &str) -> Result<i64, CoercionError> {
        self.normalise(text)
            .and_then(|t| t.parse::<i64>().ok())
            .ok_or_else(|| CoercionError::Parse {
                text: text.to_string(),
                to: ParamType::Int,
            })
    }

    fn parse_float(&self, text: &str) -> Result<f64, CoercionError> {
        self.normalise(text)
            .and_then(|t| t.parse::<f64>().ok())
            .ok_or_else(|| CoercionError::Parse {
                text: text.to_string(),
                to: ParamType::Float,
            })
    }

    fn format_float(&self, x: f64) -> String {
        let text = x.to_string();
        if self.decimal_separator == '.' {
            text
        } else {
            text.replace('.', &self.decimal_separator.to_string())
        }
    }
}

fn float_to_int(x: f64) -> Result<i64, CoercionError> {
    if x.is_finite() && x.fract() == 0.0 && x >= i64::MIN as f64 && x < i64::MAX as f64 {
        Ok(x as i64)
    } else {
        Err(CoercionError::NotIntegral(x))
    }
}

impl ArgumentCoercion for LocaleCoercion {
    fn coerce(&self, value: &Value, target: ParamType) -> Result<Value, CoercionError> {
        if let Some(same) = identity(value, target) {
            return Ok(same);
        }
        match (value, target) {
            (Value::Int(i), ParamType::Float) => Ok(Value::Float(*i as f64)),
            (Value::Float(x), ParamType::Int) => float_to_int(*x).map(Value::Int),
            (Value::Bool(b), ParamType::Str) => Ok(Value::str(b.to_string())),
            (Value::Int(i), ParamType::Str) => Ok(Value::str(i.to_string())),
            (Value::Float(x), ParamType::Str) => Ok(Value::str(self.format_float(*x))),
            (Value::Str(s), ParamType::Int) => self.parse_int(s).map(Value::Int),
            (Value::Str(s), ParamType::Float) => self.parse_float(s).map(Value::Float),
            (Value::Str(s), ParamType::Bool) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(CoercionError::Parse {
                    text: s.to_string(),
                    to: ParamType::Bool,
                }),
            },
            _ => Err(unsupported(value, target)),
        }
    }
}

/// Coercion policy selection for configuration files
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CoercionConfig {
    /// [`ExactCoercion`]
    Exact,
    /// [`InvariantCoercion`]
    #[default]
    Invariant,
    /// [`LocaleCoercion`]
    Locale {
        /// Decimal separator
        decimal_separator: char,
        /// Digit group separator
        #[serde(default)]
        group_separator: Option<char>,
    },
}

impl CoercionConfig {
    /// Instantiate the configured policy
    pub fn build(&self) -> Result<Arc<dyn ArgumentCoercion>, CoercionError> {
        Ok(match self {
            CoercionConfig::Exact => Arc::new(ExactCoercion),
            CoercionConfig::Invariant => Arc::new(InvariantCoercion),
            CoercionConfig::Locale {
                decimal_separator,
                group_separator,
            } => Arc::new(LocaleCoercion::with_separators(*decimal_separator, *group_separator)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_identity_only() {
        assert_eq!(
            ExactCoercion.coerce(&Value::str("a"), ParamType::Str),
            Ok(Value::str("a"))
        );
        assert_eq!(
            ExactCoercion.coerce(&Value::Int(1), ParamType::Float),
            Err(CoercionError::Unsupported {
                from: "int",
                to: ParamType::Float
            })
        );
    }

    #[test]
    fn test_invariant_numbers() {
        let c = InvariantCoercion;
        assert_eq!(c.coerce(&Value::Int(2), ParamType::Float), Ok(Value::Float(2.0)));
        assert_eq!(c.coerce(&Value::Float(3.0), ParamType::Int), Ok(Value::Int(3)));
        assert_eq!(
            c.coerce(&Value::Float(3.5), ParamType::Int),
            Err(CoercionError::NotIntegral(3.5))
        );
        assert_eq!(c.coerce(&Value::str("1.25"), ParamType::Float), Ok(Value::Float(1.25)));
        assert_eq!(c.coerce(&Value::str(" 42 "), ParamType::Int), Ok(Value::Int(42)));
        assert_eq!(c.coerce(&Value::Float(0.5), ParamType::Str), Ok(Value::str("0.5")));
    }

    #[test]
    fn test_invariant_bool_and_null() {
        let c = InvariantCoercion;
        assert_eq!(c.coerce(&Value::str("TRUE"), ParamType::Bool), Ok(Value::Bool(true)));
        assert!(c.coerce(&Value::str("yes"), ParamType::Bool).is_err());
        assert!(c.coerce(&Value::Null, ParamType::Str).is_err());
        assert!(c.coerce(&Value::Bool(true), ParamType::Int).is_err());
    }

    #[test]
    fn test_locale_separators() {
        let de = LocaleCoercion::new(',', '.').unwrap();
        assert_eq!(de.coerce(&Value::str("1.234,5"), ParamType::Float), Ok(Value::Float(1234.5)));
        assert_eq!(de.coerce(&Value::str("1.000"), ParamType::Int), Ok(Value::Int(1000)));
        assert_eq!(de.coerce(&Value::Float(2.5), ParamType::Str), Ok(Value::str("2,5")));

        // Same text, invariant rules: a decimal, not a grouped thousand
        assert_eq!(
            InvariantCoercion.coerce(&Value::str("1.000"), ParamType::Float),
            Ok(Value::Float(1.0))
        );
    }

    #[test]
    fn test_locale_parse_error() {
        let fr = LocaleCoercion::without_grouping(',');
        assert_eq!(
            fr.coerce(&Value::str("abc"), ParamType::Float),
            Err(CoercionError::Parse {
                text: "abc".to_string(),
                to: ParamType::Float
            })
        );
    }

    #[test]
    fn test_config_build() {
        let policy = CoercionConfig::Locale {
            decimal_separator: ',',
            group_separator: None,
        }
        .build()
        .unwrap();
        assert_eq!(policy.coerce(&Value::str("0,5"), ParamType::Float), Ok(Value::Float(0.5)));
        assert!(CoercionConfig::Exact
            .build()
            .unwrap()
            .coerce(&Value::Int(1), ParamType::Str)
            .is_err());
    }

    #[test]
    fn test_locale_rejects_foreign_decimal_point() {
        let fr = LocaleCoercion::without_grouping(',');
        assert_eq!(fr.coerce(&Value::str("1,5"), ParamType::Float), Ok(Value::Float(1.5)));
        assert_eq!(
            fr.coerce(&Value::str("1.5"), ParamType::Float),
            Err(CoercionError::Parse {
                text: "1.5".to_string(),
                to: ParamType::Float
            })
        );
        assert!(fr.coerce(&Value::str("1.000"), ParamType::Int).is_err());

        // Invariant rules reject the comma the same way
        assert!(InvariantCoercion.coerce(&Value::str("1,5"), ParamType::Float).is_err());
    }

    #[test]
    fn test_locale_separator_clash() {
        assert_eq!(LocaleCoercion::new(',', ','), Err(CoercionError::SeparatorClash(',')));
        let config = CoercionConfig::Locale {
            decimal_separator: '.',
            group_separator: Some('.'),
        };
        assert_eq!(config.build().err(), Some(CoercionError::SeparatorClash('.')));
    }
}
