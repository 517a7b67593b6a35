use std::io::Write;
use std::sync::Arc;

use instantia_engine::{
    CoercionConfig, CoercionError, ConfigError, ConstructionSpec, EmitterKind, FactoryConfig, ObjectFactory, StrategyKind,
    TypeMetadata, TypeRegistry, Visibility,
};
use instantia_sdk::{ParamType, Value};

struct Measurement {
    amount: f64,
}

fn registry() -> Arc<TypeRegistry> {
    let registry = TypeRegistry::new();
    registry.register(
        TypeMetadata::builder("Measurement")
            .constructor(Visibility::Public, |(amount,): (f64,)| Measurement { amount })
            .field::<Measurement, _>("amount", |m| Value::Float(m.amount))
            .build(),
    );
    Arc::new(registry)
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
default_strategy = "emit"
cache_generated = true

[coercion]
kind = "locale"
decimal_separator = ","
group_separator = " "
"#
    )
    .unwrap();

    let config = FactoryConfig::load(file.path()).unwrap();
    assert_eq!(
        config.default_strategy,
        StrategyKind::GeneratedCallable(EmitterKind::Instructions)
    );
    assert!(config.cache_generated);

    let factories = ObjectFactory::with_config(registry(), config).unwrap();
    let spec = ConstructionSpec::new("Measurement", [ParamType::Float]);

    let emitted = factories.build_default(&spec).unwrap();
    assert_eq!(
        emitted.invoke(&[Value::Float(2.5)]).unwrap().field("amount"),
        Some(Value::Float(2.5))
    );
    assert_eq!(factories.cached_count(), 1);

    // Generic activation parses with the configured separators
    let generic = factories.build(&spec, StrategyKind::ReflectiveGeneric).unwrap();
    assert_eq!(
        generic.invoke(&[Value::str("1 234,75")]).unwrap().field("amount"),
        Some(Value::Float(1234.75))
    );
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = FactoryConfig::load(dir.path().join("instantia.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("instantia.toml"));
}

#[test]
fn test_invalid_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "skip_visibility = \"sometimes\"").unwrap();
    let err = FactoryConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
}

#[test]
fn test_clashing_separators_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[coercion]\nkind = \"locale\"\ndecimal_separator = \",\"\ngroup_separator = \",\""
    )
    .unwrap();
    let err = FactoryConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Coercion(CoercionError::SeparatorClash(','))));

    let config = FactoryConfig {
        coercion: CoercionConfig::Locale {
            decimal_separator: ',',
            group_separator: Some(','),
        },
        ..FactoryConfig::default()
    };
    assert!(ObjectFactory::with_config(registry(), config).is_err());
}

#[test]
fn test_default_coercion_is_invariant() {
    let config = FactoryConfig::default();
    assert_eq!(config.coercion, CoercionConfig::Invariant);
    assert_eq!(config.default_strategy, StrategyKind::ReflectiveDirect);

    let factories = ObjectFactory::new(registry());
    let spec = ConstructionSpec::new("Measurement", [ParamType::Float]);
    let generic = factories.build(&spec, StrategyKind::ReflectiveGeneric).unwrap();
    assert_eq!(
        generic.invoke(&[Value::str("0.5")]).unwrap().field("amount"),
        Some(Value::Float(0.5))
    );
    assert!(generic.invoke(&[Value::str("0,5")]).is_err());
}
