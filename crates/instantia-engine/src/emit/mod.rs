//! Callable synthesis for constructor handles
//!
//! A [`CodeEmitter`] turns a resolved [`ConstructorHandle`] into a
//! [`Callable`] ahead of use, so that invoking it costs about as much as
//! calling the constructor directly. Two emitters are provided and are
//! interchangeable behind the trait:
//!
//! - [`InstructionEmitter`]: emits and verifies a minimal instruction
//!   sequence (`load args; new; ret`) and runs it on a tiny stack machine
//! - [`ExpressionEmitter`]: builds the expression tree `new T(p0, ..)` and
//!   compiles it into nested closures
//!
//! Nothing here produces machine code.

mod expression;
mod instructions;

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use instantia_sdk::{Instance, Signature, Value};

use crate::error::ConstructionResult;
use crate::reflect::ConstructorHandle;

pub use expression::{Expr, ExpressionEmitter, Lambda};
pub use instructions::{EmittedRoutine, InstructionEmitter, Op, RoutineBuilder, StackType, ValidationResult};

/// A synthesized constructor callable
pub type Callable = Arc<dyn Fn(&[Value]) -> ConstructionResult<Instance> + Send + Sync>;

/// Parameter and return shape a callable must have
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegateShape {
    /// Parameter types
    pub params: Signature,
    /// Returned type name
    pub returns: Arc<str>,
}

impl DelegateShape {
    /// Create a shape
    pub fn new(params: Signature, returns: &str) -> Self {
        Self {
            params,
            returns: Arc::from(returns),
        }
    }

    /// The shape matching a constructor exactly
    pub fn of(ctor: &ConstructorHandle) -> Self {
        Self {
            params: ctor.signature().clone(),
            returns: Arc::clone(ctor.metadata().name_arc()),
        }
    }
}

impl fmt::Display for DelegateShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn{} -> {}", self.params, self.returns)
    }
}

/// Error during callable synthesis
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EmitError {
    /// Emission has been switched off
    #[error("Code emission is disabled")]
    Disabled,
    /// The builder was already finished
    #[error("Cannot modify finalized routine '{0}'")]
    Finalized(String),
    /// The routine or expression failed verification
    #[error("Verification failed: {}", .0.join("; "))]
    Verification(Vec<String>),
}

/// Backend that synthesizes constructor callables.
pub trait CodeEmitter: Send + Sync {
    /// Backend name for diagnostics
    fn name(&self) -> &str;

    /// Synthesize a callable invoking `ctor` with the given shape
    fn synthesize(&self, ctor: &ConstructorHandle, shape: &DelegateShape) -> Result<Callable, EmitError>;
}

/// Which emitter realises a generated callable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EmitterKind {
    /// [`InstructionEmitter`]
    #[default]
    Instructions,
    /// [`ExpressionEmitter`]
    Expression,
}

impl fmt::Display for EmitterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmitterKind::Instructions => f.write_str("instructions"),
            EmitterKind::Expression => f.write_str("expression"),
        }
    }
}

/// Emitter limits and switches
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EmitterOptions {
    /// Allow callable synthesis at all (default: true)
    pub enabled: bool,
    /// Largest operand stack / expression arity accepted (default: 16)
    pub max_stack_depth: usize,
}

impl Default for EmitterOptions {
    fn default() -> Self {
        EmitterOptions {
            enabled: true,
            max_stack_depth: 16,
        }
    }
}

impl EmitterKind {
    /// Create the emitter backend for this kind
    pub fn emitter(self, options: &EmitterOptions) -> Box<dyn CodeEmitter> {
        match self {
            EmitterKind::Instructions => Box::new(InstructionEmitter::new(options.clone())),
            EmitterKind::Expression => Box::new(ExpressionEmitter::new(options.clone())),
        }
    }
}
