//! Type registry and constructor lookup
//!
//! `TypeRegistry` is the in-process stand-in for platform reflection: types
//! register their constructor tables explicitly, and lookups resolve a
//! constructor by `(type name, exact parameter types)`.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use instantia_sdk::{Instance, ParamType, Signature, Value};

use super::metadata::{ConstructorInfo, TypeMetadata, Visibility};
use crate::coerce::ArgumentCoercion;
use crate::error::{ConstructionError, ConstructionResult};

/// Resolves a constructor by declared parameter types.
pub trait ConstructorLocator: Send + Sync {
    /// Find the constructor of `type_name` whose parameters are exactly `params`
    fn find(&self, type_name: &str, params: &[ParamType]) -> Option<ConstructorHandle>;
}

/// A resolved constructor, reusable across invocations.
///
/// Cloning is cheap: the handle shares the declaring type's metadata.
#[derive(Clone)]
pub struct ConstructorHandle {
    metadata: Arc<TypeMetadata>,
    index: usize,
}

impl ConstructorHandle {
    fn info(&self) -> &ConstructorInfo {
        &self.metadata.constructors()[self.index]
    }

    /// Declaring type name
    pub fn type_name(&self) -> &str {
        self.metadata.name()
    }

    /// Declaring type metadata
    pub fn metadata(&self) -> &Arc<TypeMetadata> {
        &self.metadata
    }

    /// Parameter types
    pub fn signature(&self) -> &Signature {
        &self.info().signature
    }

    /// Access level
    pub fn visibility(&self) -> Visibility {
        self.info().visibility
    }

    /// Invoke the constructor
    ///
    /// Arguments are not pre-checked; a mismatch is reported by the
    /// constructor's own extraction as `ArgumentMismatch`.
    #[inline]
    pub fn invoke(&self, args: &[Value]) -> ConstructionResult<Instance> {
        let info = self.info();
        match info.call(args) {
            Ok(value) => Ok(Instance::new(
                Arc::clone(self.metadata.name_arc()),
                Arc::clone(self.metadata.fields()),
                value,
            )),
            Err(err) => Err(ConstructionError::from_invoke(
                self.metadata.name(),
                &info.signature,
                err,
            )),
        }
    }
}

impl fmt::Debug for ConstructorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConstructorHandle({}{})", self.type_name(), self.signature())
    }
}

/// Registry of type metadata for reflection
#[derive(Default)]
pub struct TypeRegistry {
    types: RwLock<FxHashMap<Arc<str>, Arc<TypeMetadata>>>,
    /// Bumped on every registration
    generation: AtomicU64,
}

impl TypeRegistry {
    /// Create new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register metadata for a type, replacing any previous registration
    pub fn register(&self, metadata: TypeMetadata) {
        let name = Arc::clone(metadata.name_arc());
        let constructors = metadata.constructors().len();
        let replaced = self
            .types
            .write()
            .insert(Arc::clone(&name), Arc::new(metadata))
            .is_some();
        self.generation.fetch_add(1, Ordering::Release);
        tracing::debug!(
            type_name = %name,
            constructors,
            replaced,
            "registered type"
        );
    }

    /// Registration counter; changes whenever the registry contents change
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Get metadata for a type
    pub fn get(&self, type_name: &str) -> Option<Arc<TypeMetadata>> {
        self.types.read().get(type_name).cloned()
    }

    /// Check if a type is registered
    pub fn contains(&self, type_name: &str) -> bool {
        self.types.read().contains_key(type_name)
    }

    /// Names of all registered types, sorted
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.read().keys().map(|k| k.to_string()).collect();
        names.sort();
        names
    }

    /// Get number of registered types
    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }

    /// Constructors of `type_name` taking `arity` parameters, in declaration order
    pub fn candidates(&self, type_name: &str, arity: usize) -> Vec<ConstructorHandle> {
        let Some(metadata) = self.get(type_name) else {
            return Vec::new();
        };
        metadata
            .constructors()
            .iter()
            .filter(|c| c.signature.arity() == arity)
            .map(|c| ConstructorHandle {
                metadata: Arc::clone(&metadata),
                index: c.index,
            })
            .collect()
    }

    /// Activate a type from argument values alone.
    ///
    /// Overload choice: a constructor whose parameter types match the
    /// arguments exactly wins; otherwise the first constructor (in
    /// declaration order) whose parameters every argument can be coerced
    /// to under `coercion`. Non-public constructors are considered.
    pub fn activate(
        &self,
        type_name: &str,
        args: &[Value],
        coercion: &dyn ArgumentCoercion,
    ) -> ConstructionResult<Instance> {
        match self.choose_overload(type_name, args, coercion) {
            Some((handle, coerced)) => handle.invoke(&coerced),
            None => {
                let got: Vec<ParamType> = args.iter().filter_map(Value::param_type).collect();
                Err(ConstructionError::NoMatchingConstructor {
                    type_name: type_name.to_string(),
                    signature: Signature::new(got),
                })
            }
        }
    }

    /// Activate a type, trying the `preferred` constructor first.
    ///
    /// When `args` cannot be coerced to `preferred`, or the type no longer
    /// declares it, falls back to the overload choice of [`activate`].
    /// Fails with `ArgumentMismatch` if `preferred` still exists but no
    /// overload takes `args`, and with `NoMatchingConstructor` otherwise.
    ///
    /// [`activate`]: TypeRegistry::activate
    pub fn activate_preferring(
        &self,
        type_name: &str,
        preferred: &Signature,
        args: &[Value],
        coercion: &dyn ArgumentCoercion,
    ) -> ConstructionResult<Instance> {
        let handle = self.find(type_name, preferred.params());
        if let Some(handle) = &handle {
            if args.len() == preferred.arity() {
                if let Ok(coerced) = coerce_all(coercion, args, preferred) {
                    return handle.invoke(&coerced);
                }
            }
        }

        if let Some((fallback, coerced)) = self.choose_overload(type_name, args, coercion) {
            tracing::trace!(
                type_name,
                preferred = %preferred,
                chosen = %fallback.signature(),
                "activated fallback overload"
            );
            return fallback.invoke(&coerced);
        }

        Err(match handle {
            Some(_) => ConstructionError::mismatch(type_name, preferred, args),
            None => ConstructionError::NoMatchingConstructor {
                type_name: type_name.to_string(),
                signature: preferred.clone(),
            },
        })
    }

    fn choose_overload(
        &self,
        type_name: &str,
        args: &[Value],
        coercion: &dyn ArgumentCoercion,
    ) -> Option<(ConstructorHandle, Vec<Value>)> {
        let candidates = self.candidates(type_name, args.len());

        if let Some(exact) = candidates.iter().find(|c| c.signature().accepts(args)) {
            return Some((exact.clone(), args.to_vec()));
        }

        candidates.into_iter().find_map(|candidate| {
            coerce_all(coercion, args, candidate.signature())
                .ok()
                .map(|coerced| (candidate, coerced))
        })
    }
}

impl ConstructorLocator for TypeRegistry {
    fn find(&self, type_name: &str, params: &[ParamType]) -> Option<ConstructorHandle> {
        let metadata = self.get(type_name)?;
        let index = metadata.constructor(params)?.index;
        Some(ConstructorHandle { metadata, index })
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}

/// Coerce every argument to the matching parameter type
fn coerce_all(
    coercion: &dyn ArgumentCoercion,
    args: &[Value],
    signature: &Signature,
) -> Result<Vec<Value>, crate::coerce::CoercionError> {
    args.iter()
        .zip(signature.params())
        .map(|(arg, ty)| coercion.coerce(arg, *ty))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::{ExactCoercion, InvariantCoercion};

    struct Holder {
        value: String,
    }

    fn registry() -> TypeRegistry {
        let registry = TypeRegistry::new();
        registry.register(
            TypeMetadata::builder("Holder")
                .constructor(Visibility::Public, |(value,): (String,)| Holder { value })
                .constructor(Visibility::Private, |(n,): (i64,)| Holder {
                    value: format!("#{}", n),
                })
                .field::<Holder, _>("value", |h| Value::str(&h.value))
                .build(),
        );
        registry
    }

    #[test]
    fn test_register_and_find() {
        let registry = registry();
        assert!(registry.contains("Holder"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.type_names(), vec!["Holder".to_string()]);

        let handle = registry.find("Holder", &[ParamType::Str]).unwrap();
        assert_eq!(handle.type_name(), "Holder");
        assert_eq!(handle.signature().params(), &[ParamType::Str]);
        assert!(handle.visibility().is_public());

        assert!(registry.find("Holder", &[ParamType::Float]).is_none());
        assert!(registry.find("Missing", &[ParamType::Str]).is_none());
    }

    #[test]
    fn test_handle_invoke() {
        let registry = registry();
        let handle = registry.find("Holder", &[ParamType::Str]).unwrap();
        let inst = handle.invoke(&[Value::str("hi")]).unwrap();
        assert_eq!(inst.type_name(), "Holder");
        assert_eq!(inst.field("value"), Some(Value::str("hi")));
    }

    #[test]
    fn test_handle_invoke_mismatch() {
        let registry = registry();
        let handle = registry.find("Holder", &[ParamType::Str]).unwrap();
        let err = handle.invoke(&[Value::Bool(true)]).unwrap_err();
        assert!(matches!(err, ConstructionError::ArgumentMismatch { .. }));
    }

    #[test]
    fn test_activate_prefers_exact_overload() {
        let registry = registry();
        let inst = registry
            .activate("Holder", &[Value::Int(3)], &InvariantCoercion)
            .unwrap();
        assert_eq!(inst.field("value"), Some(Value::str("#3")));
    }

    #[test]
    fn test_activate_coerces() {
        let registry = registry();
        let inst = registry
            .activate("Holder", &[Value::Bool(true)], &InvariantCoercion)
            .unwrap();
        assert_eq!(inst.field("value"), Some(Value::str("true")));
    }

    #[test]
    fn test_activate_no_match() {
        let registry = registry();
        let err = registry
            .activate("Holder", &[Value::Bool(true)], &ExactCoercion)
            .unwrap_err();
        assert!(err.is_no_matching_constructor());

        let err = registry
            .activate("Holder", &[Value::str("a"), Value::str("b")], &ExactCoercion)
            .unwrap_err();
        assert!(err.is_no_matching_constructor());
    }

    #[test]
    fn test_activate_preferring_uses_preferred_overload() {
        let registry = registry();
        // Int coerces to str, but the preferred (int) constructor wins
        let preferred = Signature::from([ParamType::Int]);
        let inst = registry
            .activate_preferring("Holder", &preferred, &[Value::Int(3)], &InvariantCoercion)
            .unwrap();
        assert_eq!(inst.field("value"), Some(Value::str("#3")));

        // "4" coerces to the preferred int parameter before the exact str match
        let inst = registry
            .activate_preferring("Holder", &preferred, &[Value::str("4")], &InvariantCoercion)
            .unwrap();
        assert_eq!(inst.field("value"), Some(Value::str("#4")));
    }

    #[test]
    fn test_activate_preferring_falls_back() {
        let registry = registry();
        let preferred = Signature::from([ParamType::Int]);
        let inst = registry
            .activate_preferring("Holder", &preferred, &[Value::str("x")], &InvariantCoercion)
            .unwrap();
        assert_eq!(inst.field("value"), Some(Value::str("x")));

        let err = registry
            .activate_preferring("Holder", &preferred, &[], &InvariantCoercion)
            .unwrap_err();
        assert!(matches!(err, ConstructionError::ArgumentMismatch { .. }));

        let gone = Signature::from([ParamType::Float]);
        let err = registry
            .activate_preferring("Holder", &gone, &[Value::Null], &InvariantCoercion)
            .unwrap_err();
        assert_eq!(
            err,
            ConstructionError::NoMatchingConstructor {
                type_name: "Holder".to_string(),
                signature: gone,
            }
        );
    }

    #[test]
    fn test_register_replaces() {
        let registry = registry();
        registry.register(
            TypeMetadata::builder("Holder")
                .constructor(Visibility::Public, |(): ()| Holder {
                    value: String::new(),
                })
                .build(),
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.generation(), 2);
        assert!(registry.find("Holder", &[ParamType::Str]).is_none());
        assert!(registry.find("Holder", &[]).is_some());
    }
}
