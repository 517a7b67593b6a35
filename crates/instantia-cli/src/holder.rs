//! The single-field type every construction path builds.

use instantia_engine::{TypeMetadata, TypeRegistry, Visibility};
use instantia_sdk::Value;

pub const TYPE_NAME: &str = "ValueHolder";

pub struct ValueHolder {
    value: String,
}

impl ValueHolder {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Register `ValueHolder(str)` with its `value` field
pub fn register(registry: &TypeRegistry) {
    registry.register(
        TypeMetadata::builder(TYPE_NAME)
            .constructor(Visibility::Public, |(value,): (String,)| ValueHolder::new(value))
            .field::<ValueHolder, _>("value", |h| Value::str(h.value()))
            .build(),
    );
}
