//! Factory error taxonomy
//!
//! Every failure is surfaced synchronously to the immediate caller; nothing
//! is retried.

use instantia_sdk::{InvokeError, Signature};

/// Result type for factory operations
pub type ConstructionResult<T> = Result<T, ConstructionError>;

/// Errors raised while building or invoking a factory
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConstructionError {
    /// No constructor of the type has exactly the requested signature
    #[error("No constructor {type_name}{signature}")]
    NoMatchingConstructor {
        /// Target type name
        type_name: String,
        /// Requested signature
        signature: Signature,
    },

    /// The strategy cannot be realised for this constructor
    #[error("Strategy '{strategy}' unsupported: {reason}")]
    UnsupportedStrategy {
        /// Strategy display name
        strategy: String,
        /// Why it could not be realised
        reason: String,
    },

    /// The constructor itself failed
    #[error("Constructing {type_name} failed: {message}")]
    ConstructionFailed {
        /// Target type name
        type_name: String,
        /// The constructor's own error message
        message: String,
    },

    /// Invocation arguments do not fit the bound constructor
    #[error("Argument mismatch for {type_name}: expected {expected}, got {got}")]
    ArgumentMismatch {
        /// Target type name
        type_name: String,
        /// Expected signature
        expected: String,
        /// What was supplied
        got: String,
    },
}

impl ConstructionError {
    /// Map a raw constructor error for `type_name` bound to `signature`
    pub fn from_invoke(type_name: &str, signature: &Signature, err: InvokeError) -> Self {
        match err {
            InvokeError::Failed(message) => ConstructionError::ConstructionFailed {
                type_name: type_name.to_string(),
                message,
            },
            mismatch => ConstructionError::ArgumentMismatch {
                type_name: type_name.to_string(),
                expected: signature.to_string(),
                got: mismatch.to_string(),
            },
        }
    }

    /// Arguments that do not exactly match `signature`
    pub fn mismatch(type_name: &str, signature: &Signature, args: &[instantia_sdk::Value]) -> Self {
        ConstructionError::ArgumentMismatch {
            type_name: type_name.to_string(),
            expected: signature.to_string(),
            got: Signature::describe_args(args),
        }
    }

    /// Check if this is a `NoMatchingConstructor` error
    pub fn is_no_matching_constructor(&self) -> bool {
        matches!(self, ConstructionError::NoMatchingConstructor { .. })
    }

    /// Check if this is an `UnsupportedStrategy` error
    pub fn is_unsupported_strategy(&self) -> bool {
        matches!(self, ConstructionError::UnsupportedStrategy { .. })
    }

    /// Check if this is a `ConstructionFailed` error
    pub fn is_construction_failed(&self) -> bool {
        matches!(self, ConstructionError::ConstructionFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use instantia_sdk::{ParamType, Value};

    #[test]
    fn test_from_invoke_failed_keeps_message() {
        let sig = Signature::from([ParamType::Str]);
        let err = ConstructionError::from_invoke("Holder", &sig, InvokeError::from("boom"));
        assert_eq!(
            err,
            ConstructionError::ConstructionFailed {
                type_name: "Holder".to_string(),
                message: "boom".to_string()
            }
        );
    }

    #[test]
    fn test_mismatch_describes_args() {
        let sig = Signature::from([ParamType::Str]);
        let err = ConstructionError::mismatch("Holder", &sig, &[Value::Int(1)]);
        assert_eq!(
            err.to_string(),
            "Argument mismatch for Holder: expected (str), got (int)"
        );
    }

    #[test]
    fn test_no_matching_display() {
        let err = ConstructionError::NoMatchingConstructor {
            type_name: "Holder".to_string(),
            signature: Signature::from([ParamType::Int]),
        };
        assert_eq!(err.to_string(), "No constructor Holder(int)");
        assert!(err.is_no_matching_constructor());
    }
}
