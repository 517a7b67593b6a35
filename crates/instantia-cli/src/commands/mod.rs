pub mod compare;
pub mod demo;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use instantia_engine::{ConstructionSpec, FactoryConfig, ObjectFactory, TypeRegistry};
use instantia_sdk::ParamType;

use crate::holder;

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG: &str = "instantia.toml";

/// Load `--config`, else `instantia.toml` if present, else defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<FactoryConfig> {
    let path: PathBuf = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG);
            if !default.exists() {
                tracing::debug!("no {} found, using defaults", DEFAULT_CONFIG);
                return Ok(FactoryConfig::default());
            }
            default
        }
    };
    FactoryConfig::load(&path).with_context(|| format!("loading {}", path.display()))
}

/// Factory builder over a registry holding `ValueHolder`
pub fn holder_factories(config: FactoryConfig) -> anyhow::Result<ObjectFactory> {
    let registry = TypeRegistry::new();
    holder::register(&registry);
    Ok(ObjectFactory::with_config(Arc::new(registry), config)?)
}

pub fn holder_spec() -> ConstructionSpec {
    ConstructionSpec::new(holder::TYPE_NAME, [ParamType::Str])
}
