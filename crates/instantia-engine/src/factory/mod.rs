//! Object factory
//!
//! [`ObjectFactory::build`] binds a [`ConstructionSpec`] to one of the
//! construction strategies and returns a reusable [`Factory`]. All lookup,
//! visibility checking and code synthesis happens inside `build`; invoking
//! the factory afterwards only does the per-call work of its strategy.

mod spec;
mod strategy;

use std::sync::Arc;

use dashmap::DashMap;

use crate::coerce::{ArgumentCoercion, InvariantCoercion};
use crate::config::{ConfigError, FactoryConfig};
use crate::emit::{DelegateShape, EmitterKind};
use crate::error::{ConstructionError, ConstructionResult};
use crate::reflect::{ConstructorHandle, ConstructorLocator, TypeRegistry};

pub use spec::{ConstructionSpec, ParseStrategyError, StrategyKind};
pub use strategy::{ConstructionStrategy, Factory, TypedFactory};

use strategy::{DirectInvoke, GeneratedInvoke, GenericActivation};

/// Cache key: registry generation keeps entries from outliving a re-registration
type CacheKey = (ConstructionSpec, StrategyKind, u64);

/// Builds factories for registered types
pub struct ObjectFactory {
    registry: Arc<TypeRegistry>,
    config: FactoryConfig,
    coercion: Arc<dyn ArgumentCoercion>,
    cache: DashMap<CacheKey, Factory>,
}

impl ObjectFactory {
    /// Create a factory builder with the default configuration
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            config: FactoryConfig::default(),
            coercion: Arc::new(InvariantCoercion),
            cache: DashMap::new(),
        }
    }

    /// Create a factory builder with an explicit configuration
    ///
    /// Fails when the configured coercion policy cannot be built.
    pub fn with_config(registry: Arc<TypeRegistry>, config: FactoryConfig) -> Result<Self, ConfigError> {
        let coercion = config.coercion.build()?;
        Ok(Self {
            registry,
            config,
            coercion,
            cache: DashMap::new(),
        })
    }

    /// Replace the coercion policy used by generic activation
    pub fn with_coercion(mut self, coercion: Arc<dyn ArgumentCoercion>) -> Self {
        self.coercion = coercion;
        self
    }

    /// The registry constructors are resolved from
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Active configuration
    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    /// Build a factory for `spec` using the configured default strategy
    pub fn build_default(&self, spec: &ConstructionSpec) -> ConstructionResult<Factory> {
        self.build(spec, self.config.default_strategy)
    }

    /// Build a factory for `spec` realised by `strategy`
    pub fn build(&self, spec: &ConstructionSpec, strategy: StrategyKind) -> ConstructionResult<Factory> {
        let result = self.build_inner(spec, strategy);
        match &result {
            Ok(_) => tracing::debug!(spec = %spec, strategy = %strategy, "built factory"),
            Err(err @ ConstructionError::UnsupportedStrategy { .. }) => {
                tracing::warn!(spec = %spec, strategy = %strategy, error = %err, "strategy unsupported")
            }
            Err(err) => tracing::debug!(spec = %spec, strategy = %strategy, error = %err, "build failed"),
        }
        result
    }

    fn build_inner(&self, spec: &ConstructionSpec, strategy: StrategyKind) -> ConstructionResult<Factory> {
        let handle = self.resolve(spec)?;

        let imp: Box<dyn ConstructionStrategy> = match strategy {
            StrategyKind::Direct => {
                return Err(unsupported(
                    strategy,
                    "ordinary construction is compiled into the caller and has no runtime factory",
                ))
            }
            StrategyKind::ReflectiveGeneric => Box::new(GenericActivation {
                registry: Arc::clone(&self.registry),
                spec: spec.clone(),
                coercion: Arc::clone(&self.coercion),
            }),
            StrategyKind::ReflectiveDirect => {
                require_public(&handle, strategy)?;
                Box::new(DirectInvoke { handle })
            }
            StrategyKind::GeneratedCallable(kind) => {
                if !self.config.skip_visibility {
                    require_public(&handle, strategy)?;
                }
                if self.config.cache_generated {
                    return self.generate_cached(spec, kind, &handle);
                }
                Box::new(self.generate(kind, &handle)?)
            }
        };

        Ok(Factory::new(spec.clone(), strategy, imp))
    }

    fn resolve(&self, spec: &ConstructionSpec) -> ConstructionResult<ConstructorHandle> {
        self.registry
            .find(&spec.target, spec.params.params())
            .ok_or_else(|| ConstructionError::NoMatchingConstructor {
                type_name: spec.target.to_string(),
                signature: spec.params.clone(),
            })
    }

    fn generate(&self, kind: EmitterKind, handle: &ConstructorHandle) -> ConstructionResult<GeneratedInvoke> {
        let emitter = kind.emitter(&self.config.emitter);
        let callable = emitter
            .synthesize(handle, &DelegateShape::of(handle))
            .map_err(|err| unsupported(StrategyKind::GeneratedCallable(kind), &err.to_string()))?;
        tracing::trace!(emitter = emitter.name(), ctor = ?handle, "synthesized callable");
        Ok(GeneratedInvoke { callable })
    }

    fn generate_cached(
        &self,
        spec: &ConstructionSpec,
        kind: EmitterKind,
        handle: &ConstructorHandle,
    ) -> ConstructionResult<Factory> {
        let strategy = StrategyKind::GeneratedCallable(kind);
        let key = (spec.clone(), strategy, self.registry.generation());
        if let Some(hit) = self.cache.get(&key) {
            tracing::trace!(spec = %spec, strategy = %strategy, "factory cache hit");
            return Ok(hit.clone());
        }

        let factory = Factory::new(spec.clone(), strategy, Box::new(self.generate(kind, handle)?));
        // A concurrent build may have won the race; either factory is equivalent
        Ok(self.cache.entry(key).or_insert(factory).clone())
    }

    /// Drop every cached factory
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Number of cached factories
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}

fn unsupported(strategy: StrategyKind, reason: &str) -> ConstructionError {
    ConstructionError::UnsupportedStrategy {
        strategy: strategy.to_string(),
        reason: reason.to_string(),
    }
}

fn require_public(handle: &ConstructorHandle, strategy: StrategyKind) -> ConstructionResult<()> {
    if handle.visibility().is_public() {
        Ok(())
    } else {
        Err(unsupported(
            strategy,
            &format!("constructor {}{} is not public", handle.type_name(), handle.signature()),
        ))
    }
}
