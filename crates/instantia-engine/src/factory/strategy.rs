//! Realised construction strategies and the factories wrapping them

use std::any::{type_name, Any};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use instantia_sdk::{ArgList, Instance, Value};

use super::spec::{ConstructionSpec, StrategyKind};
use crate::coerce::ArgumentCoercion;
use crate::emit::Callable;
use crate::error::{ConstructionError, ConstructionResult};
use crate::reflect::{ConstructorHandle, TypeRegistry};

/// One way of invoking a bound constructor.
///
/// Implementations are immutable once built and may be called from any
/// number of threads at once.
pub trait ConstructionStrategy: Send + Sync {
    /// Construct an instance from `args`
    fn invoke(&self, args: &[Value]) -> ConstructionResult<Instance>;
}

/// Activates through the registry on every call, preferring the spec's
/// constructor and falling back to value-driven overload choice. Arguments
/// are coerced through the configured policy.
pub(crate) struct GenericActivation {
    pub(crate) registry: Arc<TypeRegistry>,
    pub(crate) spec: ConstructionSpec,
    pub(crate) coercion: Arc<dyn ArgumentCoercion>,
}

impl ConstructionStrategy for GenericActivation {
    fn invoke(&self, args: &[Value]) -> ConstructionResult<Instance> {
        self.registry.activate_preferring(
            &self.spec.target,
            &self.spec.params,
            args,
            self.coercion.as_ref(),
        )
    }
}

/// Calls a constructor handle resolved once at build time.
pub(crate) struct DirectInvoke {
    pub(crate) handle: ConstructorHandle,
}

impl ConstructionStrategy for DirectInvoke {
    #[inline]
    fn invoke(&self, args: &[Value]) -> ConstructionResult<Instance> {
        let signature = self.handle.signature();
        if !signature.accepts(args) {
            return Err(ConstructionError::mismatch(self.handle.type_name(), signature, args));
        }
        self.handle.invoke(args)
    }
}

/// Runs a callable synthesized by a code emitter.
pub(crate) struct GeneratedInvoke {
    pub(crate) callable: Callable,
}

impl ConstructionStrategy for GeneratedInvoke {
    #[inline]
    fn invoke(&self, args: &[Value]) -> ConstructionResult<Instance> {
        (self.callable)(args)
    }
}

struct FactoryInner {
    spec: ConstructionSpec,
    strategy: StrategyKind,
    imp: Box<dyn ConstructionStrategy>,
}

/// A built object factory.
///
/// Cloning shares the same realised strategy.
#[derive(Clone)]
pub struct Factory {
    inner: Arc<FactoryInner>,
}

impl Factory {
    /// Wrap a realised strategy
    pub fn new(
        spec: ConstructionSpec,
        strategy: StrategyKind,
        imp: Box<dyn ConstructionStrategy>,
    ) -> Self {
        Self {
            inner: Arc::new(FactoryInner { spec, strategy, imp }),
        }
    }

    /// Construct a new instance
    #[inline]
    pub fn invoke(&self, args: &[Value]) -> ConstructionResult<Instance> {
        self.inner.imp.invoke(args)
    }

    /// The spec this factory was built for
    pub fn spec(&self) -> &ConstructionSpec {
        &self.inner.spec
    }

    /// The strategy realised by this factory
    pub fn strategy(&self) -> StrategyKind {
        self.inner.strategy
    }

    /// Strongly-typed view taking `A` and returning `T`.
    ///
    /// Fails with `ArgumentMismatch` when `A` does not describe the
    /// parameter list this factory was built for.
    pub fn typed<A: ArgList, T: Any>(&self) -> ConstructionResult<TypedFactory<A, T>> {
        let wanted = A::signature();
        if wanted != self.inner.spec.params {
            return Err(ConstructionError::ArgumentMismatch {
                type_name: self.inner.spec.target.to_string(),
                expected: self.inner.spec.params.to_string(),
                got: wanted.to_string(),
            });
        }
        Ok(TypedFactory {
            factory: self.clone(),
            _marker: PhantomData,
        })
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("spec", &self.inner.spec.to_string())
            .field("strategy", &self.inner.strategy)
            .finish()
    }
}

/// Typed callable over a [`Factory`]
pub struct TypedFactory<A, T> {
    factory: Factory,
    _marker: PhantomData<fn(A) -> T>,
}

impl<A: ArgList, T: Any> TypedFactory<A, T> {
    /// Construct a `T` from `args`
    pub fn call(&self, args: A) -> ConstructionResult<T> {
        let instance = self.factory.invoke(&args.into_values())?;
        instance
            .downcast::<T>()
            .map_err(|instance| ConstructionError::ConstructionFailed {
                type_name: instance.type_name().to_string(),
                message: format!("constructed value is not a {}", type_name::<T>()),
            })
    }

    /// The untyped factory
    pub fn factory(&self) -> &Factory {
        &self.factory
    }
}

impl<A, T> Clone for TypedFactory<A, T> {
    fn clone(&self) -> Self {
        Self {
            factory: self.factory.clone(),
            _marker: PhantomData,
        }
    }
}
