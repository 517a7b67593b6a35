//! Expression-tree compilation for constructor callables
//!
//! A [`Lambda`] describes `|p0, .., pn| new T(args..)` as a small tree.
//! `compile` type-checks the tree and turns every node into a closure, so
//! invoking the result walks no tree at all.

use std::sync::Arc;

use instantia_sdk::{Instance, ParamType, Signature, Value};

use super::{Callable, CodeEmitter, DelegateShape, EmitError, EmitterOptions};
use crate::error::{ConstructionError, ConstructionResult};
use crate::reflect::ConstructorHandle;

/// Expression node
#[derive(Debug, Clone)]
pub enum Expr {
    /// Lambda parameter by index
    Param(u16),
    /// Constant value
    Constant(Value),
    /// Constructor invocation
    New {
        /// Constructor to invoke
        ctor: ConstructorHandle,
        /// Argument expressions
        args: Vec<Expr>,
    },
}

/// Static type of an expression
#[derive(Debug, Clone, PartialEq, Eq)]
enum ExprType {
    Value(ParamType),
    Null,
    Object(Arc<str>),
}

/// A typed lambda over constructor arguments
#[derive(Debug, Clone)]
pub struct Lambda {
    /// Parameter types
    pub params: Signature,
    /// Returned type name
    pub returns: Arc<str>,
    /// Body expression
    pub body: Expr,
}

type ValueFn = Box<dyn Fn(&[Value]) -> Value + Send + Sync>;

impl Lambda {
    /// `|p0, .., pn| new T(p0, .., pn)` for the given shape
    pub fn new_object(ctor: &ConstructorHandle, shape: &DelegateShape) -> Self {
        let args = (0..shape.params.arity()).map(|i| Expr::Param(i as u16)).collect();
        Lambda {
            params: shape.params.clone(),
            returns: Arc::clone(&shape.returns),
            body: Expr::New {
                ctor: ctor.clone(),
                args,
            },
        }
    }

    fn type_of(&self, expr: &Expr, errors: &mut Vec<String>) -> Option<ExprType> {
        match expr {
            Expr::Param(index) => match self.params.params().get(*index as usize) {
                Some(ty) => Some(ExprType::Value(*ty)),
                None => {
                    errors.push(format!("Parameter {} out of range for {}", index, self.params));
                    None
                }
            },
            Expr::Constant(value) => Some(match value.param_type() {
                Some(ty) => ExprType::Value(ty),
                None => ExprType::Null,
            }),
            Expr::New { ctor, args } => {
                let expected = ctor.signature().params();
                if args.len() != expected.len() {
                    errors.push(format!(
                        "new {} takes {} arguments, got {}",
                        ctor.type_name(),
                        expected.len(),
                        args.len()
                    ));
                }
                for (i, (arg, ty)) in args.iter().zip(expected).enumerate() {
                    match self.type_of(arg, errors) {
                        Some(ExprType::Value(found)) if found == *ty => {}
                        Some(found) => errors.push(format!(
                            "Argument {} of new {}: expected {}, found {:?}",
                            i,
                            ctor.type_name(),
                            ty,
                            found
                        )),
                        None => {}
                    }
                }
                Some(ExprType::Object(Arc::clone(ctor.metadata().name_arc())))
            }
        }
    }

    /// Type-check the lambda
    pub fn check(&self) -> Result<(), EmitError> {
        let mut errors = Vec::new();
        match self.type_of(&self.body, &mut errors) {
            Some(ExprType::Object(name)) if name == self.returns => {}
            Some(other) => errors.push(format!(
                "Body type mismatch: expected {}, found {:?}",
                self.returns, other
            )),
            None => {}
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(EmitError::Verification(errors))
        }
    }

    /// Deepest argument list in the tree
    fn max_arity(expr: &Expr) -> usize {
        match expr {
            Expr::New { args, .. } => args
                .iter()
                .map(Self::max_arity)
                .max()
                .unwrap_or(0)
                .max(args.len()),
            _ => 0,
        }
    }

    /// Type-check and compile into a callable
    pub fn compile(self) -> Result<Callable, EmitError> {
        self.check()?;
        let Expr::New { ctor, args } = self.body else {
            return Err(EmitError::Verification(vec![
                "Body must be a constructor invocation".to_string(),
            ]));
        };
        let params = self.params;
        let type_name = Arc::clone(ctor.metadata().name_arc());
        let body = compile_new(ctor, args);
        Ok(Arc::new(move |args: &[Value]| {
            if !params.accepts(args) {
                return Err(ConstructionError::mismatch(&type_name, &params, args));
            }
            body(args)
        }))
    }
}

/// Parameters `first..first + len` in order, if that is what `args` is
fn contiguous_params(args: &[Expr]) -> Option<usize> {
    let first = match args.first() {
        Some(Expr::Param(first)) => *first as usize,
        None => 0,
        _ => return None,
    };
    args.iter()
        .enumerate()
        .all(|(k, arg)| matches!(arg, Expr::Param(i) if *i as usize == first + k))
        .then_some(first)
}

fn compile_value(expr: Expr) -> ValueFn {
    match expr {
        Expr::Param(index) => {
            let index = index as usize;
            Box::new(move |args: &[Value]| args[index].clone())
        }
        Expr::Constant(value) => Box::new(move |_: &[Value]| value.clone()),
        // Rejected by the type check: constructor parameters are never objects
        Expr::New { .. } => Box::new(|_: &[Value]| Value::Null),
    }
}

fn compile_new(
    ctor: ConstructorHandle,
    args: Vec<Expr>,
) -> Box<dyn Fn(&[Value]) -> ConstructionResult<Instance> + Send + Sync> {
    if let Some(first) = contiguous_params(&args) {
        let last = first + args.len();
        return Box::new(move |values: &[Value]| ctor.invoke(&values[first..last]));
    }
    let arg_fns: Vec<ValueFn> = args.into_iter().map(compile_value).collect();
    Box::new(move |values: &[Value]| {
        let evaluated: Vec<Value> = arg_fns.iter().map(|f| f(values)).collect();
        ctor.invoke(&evaluated)
    })
}

/// Emitter backed by compiled expression trees
pub struct ExpressionEmitter {
    options: EmitterOptions,
}

impl ExpressionEmitter {
    /// Create an emitter
    pub fn new(options: EmitterOptions) -> Self {
        Self { options }
    }
}

impl CodeEmitter for ExpressionEmitter {
    fn name(&self) -> &str {
        "expression"
    }

    fn synthesize(&self, ctor: &ConstructorHandle, shape: &DelegateShape) -> Result<Callable, EmitError> {
        if !self.options.enabled {
            return Err(EmitError::Disabled);
        }
        let lambda = Lambda::new_object(ctor, shape);
        let arity = Lambda::max_arity(&lambda.body);
        if arity > self.options.max_stack_depth {
            return Err(EmitError::Verification(vec![format!(
                "Arity {} exceeds limit {}",
                arity, self.options.max_stack_depth
            )]));
        }
        tracing::trace!(lambda = ?lambda.body, "compiling expression");
        lambda.compile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{ConstructorLocator, TypeMetadata, TypeRegistry, Visibility};

    struct Labelled {
        label: String,
        weight: f64,
    }

    fn ctor() -> ConstructorHandle {
        let registry = TypeRegistry::new();
        registry.register(
            TypeMetadata::builder("Labelled")
                .constructor(Visibility::Public, |(label, weight): (String, f64)| Labelled {
                    label,
                    weight,
                })
                .field::<Labelled, _>("label", |l| Value::str(&l.label))
                .field::<Labelled, _>("weight", |l| Value::Float(l.weight))
                .build(),
        );
        registry
            .find("Labelled", &[ParamType::Str, ParamType::Float])
            .unwrap()
    }

    #[test]
    fn test_new_object_compiles() {
        let ctor = ctor();
        let callable = Lambda::new_object(&ctor, &DelegateShape::of(&ctor))
            .compile()
            .unwrap();
        let inst = callable(&[Value::str("w"), Value::Float(0.5)]).unwrap();
        assert_eq!(inst.field("label"), Some(Value::str("w")));
        assert_eq!(inst.field("weight"), Some(Value::Float(0.5)));
    }

    #[test]
    fn test_constant_argument() {
        let ctor = ctor();
        let lambda = Lambda {
            params: Signature::from([ParamType::Str]),
            returns: Arc::from("Labelled"),
            body: Expr::New {
                ctor: ctor.clone(),
                args: vec![Expr::Param(0), Expr::Constant(Value::Float(2.0))],
            },
        };
        let callable = lambda.compile().unwrap();
        let inst = callable(&[Value::str("fixed")]).unwrap();
        assert_eq!(inst.field("weight"), Some(Value::Float(2.0)));
    }

    #[test]
    fn test_check_rejects_bad_trees() {
        let ctor = ctor();
        let swapped = Lambda {
            params: Signature::from([ParamType::Str, ParamType::Float]),
            returns: Arc::from("Labelled"),
            body: Expr::New {
                ctor: ctor.clone(),
                args: vec![Expr::Param(1), Expr::Param(0)],
            },
        };
        assert!(matches!(swapped.check(), Err(EmitError::Verification(e)) if e.len() == 2));

        let wrong_return = Lambda {
            returns: Arc::from("Other"),
            ..Lambda::new_object(&ctor, &DelegateShape::of(&ctor))
        };
        assert!(wrong_return.check().is_err());

        let bare_param = Lambda {
            params: Signature::from([ParamType::Str]),
            returns: Arc::from("Labelled"),
            body: Expr::Param(0),
        };
        assert!(bare_param.compile().is_err());
    }

    #[test]
    fn test_contiguous_params() {
        assert_eq!(contiguous_params(&[Expr::Param(0), Expr::Param(1)]), Some(0));
        assert_eq!(contiguous_params(&[Expr::Param(2)]), Some(2));
        assert_eq!(contiguous_params(&[]), Some(0));
        assert_eq!(contiguous_params(&[Expr::Param(1), Expr::Param(0)]), None);
        assert_eq!(
            contiguous_params(&[Expr::Param(0), Expr::Constant(Value::Null)]),
            None
        );
    }

    #[test]
    fn test_emitter_disabled() {
        let ctor = ctor();
        let emitter = ExpressionEmitter::new(EmitterOptions {
            enabled: false,
            ..EmitterOptions::default()
        });
        assert_eq!(
            emitter.synthesize(&ctor, &DelegateShape::of(&ctor)).err(),
            Some(EmitError::Disabled)
        );
    }
}
