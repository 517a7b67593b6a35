//! Instruction emission for constructor routines
//!
//! Builds a routine one instruction at a time, tracking operand stack types
//! so the routine can be verified before it is ever run:
//!
//! | Op                  | Stack effect                         |
//! |---------------------|--------------------------------------|
//! | `LoadArg(i)`        | push argument `i`                    |
//! | `New(c)`            | pop `arity(c)` values, push object   |
//! | `NewFromArgs(c, i)` | push object built from args `i..`    |
//! | `Ret`               | pop object and return it             |
//!
//! `NewFromArgs` is never emitted directly; `finish` fuses a run of
//! consecutive `LoadArg`s feeding a `New` into it so the common routine
//! runs without touching the operand stack.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use instantia_sdk::{Instance, ParamType, Signature, Value};

use super::{Callable, CodeEmitter, DelegateShape, EmitError, EmitterOptions};
use crate::error::{ConstructionError, ConstructionResult};
use crate::reflect::ConstructorHandle;

/// Global counter for emitted routine IDs
static NEXT_ROUTINE_ID: AtomicUsize = AtomicUsize::new(1);

/// Generate a unique routine ID
fn generate_routine_id() -> usize {
    NEXT_ROUTINE_ID.fetch_add(1, Ordering::Relaxed)
}

/// A routine instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Push argument by index
    LoadArg(u16),
    /// Invoke constructor slot, consuming its arguments from the stack
    New(u16),
    /// Invoke constructor slot with arguments taken straight from the
    /// argument list, starting at the given index
    NewFromArgs(u16, u16),
    /// Return the object on top of the stack
    Ret,
}

/// Type tracked on the operand stack for validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackType {
    /// Argument value of a parameter type
    Param(ParamType),
    /// Constructed object of a named type
    Object(Arc<str>),
}

/// Result of routine validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether validation passed
    pub is_valid: bool,
    /// Validation error messages
    pub errors: Vec<String>,
}

/// Builder for constructing routines programmatically
#[derive(Debug)]
pub struct RoutineBuilder {
    /// Unique builder ID
    pub id: usize,
    /// Routine name
    pub name: String,
    params: Signature,
    returns: Arc<str>,
    ops: Vec<Op>,
    ctors: Vec<ConstructorHandle>,
    type_stack: Vec<StackType>,
    max_stack_depth: usize,
    returned: bool,
    finalized: bool,
    errors: Vec<String>,
}

impl RoutineBuilder {
    /// Create a new builder for a routine with the given shape
    pub fn new(name: String, shape: &DelegateShape) -> Self {
        Self {
            id: generate_routine_id(),
            name,
            params: shape.params.clone(),
            returns: Arc::clone(&shape.returns),
            ops: Vec::with_capacity(8),
            ctors: Vec::new(),
            type_stack: Vec::with_capacity(8),
            max_stack_depth: 0,
            returned: false,
            finalized: false,
            errors: Vec::new(),
        }
    }

    fn check_open(&self) -> Result<(), EmitError> {
        if self.finalized {
            return Err(EmitError::Finalized(self.name.clone()));
        }
        Ok(())
    }

    /// Track stack push for validation
    fn push_type(&mut self, t: StackType) {
        self.type_stack.push(t);
        if self.type_stack.len() > self.max_stack_depth {
            self.max_stack_depth = self.type_stack.len();
        }
    }

    fn after_return(&mut self) {
        if self.returned {
            self.errors
                .push(format!("Instruction {} follows return", self.ops.len()));
        }
    }

    /// Emit load argument
    pub fn emit_load_arg(&mut self, index: u16) -> Result<(), EmitError> {
        self.check_open()?;
        self.after_return();
        let param = self.params.params().get(index as usize).copied();
        match param {
            Some(ty) => self.push_type(StackType::Param(ty)),
            None => {
                self.errors.push(format!(
                    "Argument {} out of range for {}",
                    index, self.params
                ));
                // Keep tracking so later errors stay meaningful
                self.push_type(StackType::Param(ParamType::Bool));
            }
        }
        self.ops.push(Op::LoadArg(index));
        Ok(())
    }

    /// Emit constructor invocation
    pub fn emit_new(&mut self, ctor: &ConstructorHandle) -> Result<(), EmitError> {
        self.check_open()?;
        self.after_return();
        let arity = ctor.signature().arity();
        if self.type_stack.len() < arity {
            self.errors.push(format!(
                "Stack underflow at new {}: need {}, have {}",
                ctor.type_name(),
                arity,
                self.type_stack.len()
            ));
            self.type_stack.clear();
        } else {
            let start = self.type_stack.len() - arity;
            for (offset, (found, expected)) in self.type_stack[start..]
                .iter()
                .zip(ctor.signature().params())
                .enumerate()
            {
                if *found != StackType::Param(*expected) {
                    self.errors.push(format!(
                        "Argument {} of new {}: expected {}, found {:?}",
                        offset,
                        ctor.type_name(),
                        expected,
                        found
                    ));
                }
            }
            self.type_stack.truncate(start);
        }
        let slot = match self
            .ctors
            .iter()
            .position(|c| c.type_name() == ctor.type_name() && c.signature() == ctor.signature())
        {
            Some(slot) => slot,
            None => {
                self.ctors.push(ctor.clone());
                self.ctors.len() - 1
            }
        };
        self.push_type(StackType::Object(Arc::clone(ctor.metadata().name_arc())));
        self.ops.push(Op::New(slot as u16));
        Ok(())
    }

    /// Emit return
    pub fn emit_ret(&mut self) -> Result<(), EmitError> {
        self.check_open()?;
        self.after_return();
        match self.type_stack.pop() {
            Some(StackType::Object(name)) if name == self.returns => {}
            Some(other) => self.errors.push(format!(
                "Return type mismatch: expected {}, found {:?}",
                self.returns, other
            )),
            None => self.errors.push("Stack underflow at return".to_string()),
        }
        self.returned = true;
        self.ops.push(Op::Ret);
        Ok(())
    }

    /// Validate the routine
    pub fn validate(&self) -> ValidationResult {
        let mut errors = self.errors.clone();

        if !self.returned {
            errors.push("Routine does not return".to_string());
        }

        if !self.type_stack.is_empty() {
            errors.push(format!(
                "Stack not balanced: {} values remaining",
                self.type_stack.len()
            ));
        }

        ValidationResult {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// Verify, fuse argument runs and finish the routine
    pub fn finish(&mut self) -> Result<EmittedRoutine, EmitError> {
        self.check_open()?;

        let validation = self.validate();
        if !validation.is_valid {
            return Err(EmitError::Verification(validation.errors));
        }

        self.finalized = true;

        Ok(EmittedRoutine {
            id: self.id,
            name: self.name.clone(),
            params: self.params.clone(),
            returns: Arc::clone(&self.returns),
            max_stack: self.max_stack_depth,
            ops: fuse_arg_runs(&self.ops, &self.ctors),
            ctors: self.ctors.clone(),
        })
    }

    /// Maximum stack depth reached so far
    pub fn max_stack_depth(&self) -> usize {
        self.max_stack_depth
    }
}

/// Replace `LoadArg(i), LoadArg(i+1), .., New(c)` by `NewFromArgs(c, i)`
/// when the run supplies exactly the constructor's arguments.
fn fuse_arg_runs(ops: &[Op], ctors: &[ConstructorHandle]) -> Vec<Op> {
    let mut out: Vec<Op> = Vec::with_capacity(ops.len());
    for op in ops {
        if let Op::New(slot) = *op {
            let arity = ctors[slot as usize].signature().arity();
            if out.len() >= arity {
                let run = &out[out.len() - arity..];
                let first = match run.first() {
                    Some(Op::LoadArg(first)) => Some(*first),
                    None => Some(0),
                    _ => None,
                };
                let contiguous = first.is_some_and(|first| {
                    run.iter()
                        .enumerate()
                        .all(|(k, op)| *op == Op::LoadArg(first + k as u16))
                });
                if let (true, Some(first)) = (contiguous, first) {
                    out.truncate(out.len() - arity);
                    out.push(Op::NewFromArgs(slot, first));
                    continue;
                }
            }
        }
        out.push(*op);
    }
    out
}

/// Operand stack slot at run time
enum Slot {
    Arg(Value),
    Obj(Instance),
}

/// A verified routine, ready to run
#[derive(Debug, Clone)]
pub struct EmittedRoutine {
    /// Routine ID
    pub id: usize,
    /// Routine name
    pub name: String,
    /// Parameter types
    pub params: Signature,
    /// Returned type name
    pub returns: Arc<str>,
    /// Maximum stack depth
    pub max_stack: usize,
    /// Instructions after fusion
    pub ops: Vec<Op>,
    /// Constructor slots referenced by `New`
    pub ctors: Vec<ConstructorHandle>,
}

impl EmittedRoutine {
    /// Run the routine.
    ///
    /// Arguments must match the routine's parameter types exactly.
    pub fn execute(&self, args: &[Value]) -> ConstructionResult<Instance> {
        if !self.params.accepts(args) {
            return Err(ConstructionError::mismatch(&self.returns, &self.params, args));
        }
        if let [Op::NewFromArgs(slot, first), Op::Ret] = self.ops.as_slice() {
            let ctor = &self.ctors[*slot as usize];
            let first = *first as usize;
            return ctor.invoke(&args[first..first + ctor.signature().arity()]);
        }

        let mut stack: Vec<Slot> = Vec::with_capacity(self.max_stack);
        for op in &self.ops {
            match *op {
                Op::LoadArg(index) => stack.push(Slot::Arg(args[index as usize].clone())),
                Op::New(slot) => {
                    let ctor = &self.ctors[slot as usize];
                    let start = stack.len() - ctor.signature().arity();
                    let values: Vec<Value> = stack
                        .drain(start..)
                        .filter_map(|s| match s {
                            Slot::Arg(v) => Some(v),
                            Slot::Obj(_) => None,
                        })
                        .collect();
                    stack.push(Slot::Obj(ctor.invoke(&values)?));
                }
                Op::NewFromArgs(slot, first) => {
                    let ctor = &self.ctors[slot as usize];
                    let first = first as usize;
                    let inst = ctor.invoke(&args[first..first + ctor.signature().arity()])?;
                    stack.push(Slot::Obj(inst));
                }
                Op::Ret => {
                    if let Some(Slot::Obj(inst)) = stack.pop() {
                        return Ok(inst);
                    }
                    break;
                }
            }
        }
        Err(ConstructionError::ConstructionFailed {
            type_name: self.name.clone(),
            message: "routine ended without returning an object".to_string(),
        })
    }
}

/// Emitter backed by verified instruction routines
pub struct InstructionEmitter {
    options: EmitterOptions,
}

impl InstructionEmitter {
    /// Create an emitter
    pub fn new(options: EmitterOptions) -> Self {
        Self { options }
    }

    /// Emit `load args; new ctor; ret` for `ctor`
    pub fn emit_routine(
        &self,
        ctor: &ConstructorHandle,
        shape: &DelegateShape,
    ) -> Result<EmittedRoutine, EmitError> {
        if !self.options.enabled {
            return Err(EmitError::Disabled);
        }
        let mut builder = RoutineBuilder::new(String::new(), shape);
        builder.name = format!("{}Creator#{}", ctor.type_name(), builder.id);
        for index in 0..shape.params.arity() {
            builder.emit_load_arg(index as u16)?;
        }
        builder.emit_new(ctor)?;
        builder.emit_ret()?;

        if builder.max_stack_depth() > self.options.max_stack_depth {
            return Err(EmitError::Verification(vec![format!(
                "Stack depth {} exceeds limit {}",
                builder.max_stack_depth(),
                self.options.max_stack_depth
            )]));
        }
        builder.finish()
    }
}

impl CodeEmitter for InstructionEmitter {
    fn name(&self) -> &str {
        "instructions"
    }

    fn synthesize(&self, ctor: &ConstructorHandle, shape: &DelegateShape) -> Result<Callable, EmitError> {
        let routine = self.emit_routine(ctor, shape)?;
        tracing::trace!(
            routine = %routine.name,
            ops = ?routine.ops,
            max_stack = routine.max_stack,
            "emitted routine"
        );
        Ok(Arc::new(move |args: &[Value]| routine.execute(args)))
    }
}
