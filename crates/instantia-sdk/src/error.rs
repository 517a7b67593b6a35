//! Error types raised by registered constructor functions

/// Result type for raw constructor calls
pub type InvokeResult<T> = Result<T, InvokeError>;

/// Failure raised while running a raw constructor function
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvokeError {
    /// Argument did not convert to the parameter type
    #[error("Type mismatch at argument {index}: expected {expected}, got {got}")]
    TypeMismatch {
        /// Argument position
        index: usize,
        /// Expected type name
        expected: &'static str,
        /// Actual type name
        got: &'static str,
    },

    /// Wrong number of arguments
    #[error("Arity mismatch: expected {expected} arguments, got {got}")]
    ArityMismatch {
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    /// The constructor body itself failed
    #[error("{0}")]
    Failed(String),
}

impl From<String> for InvokeError {
    fn from(s: String) -> Self {
        InvokeError::Failed(s)
    }
}

impl From<&str> for InvokeError {
    fn from(s: &str) -> Self {
        InvokeError::Failed(s.to_string())
    }
}
