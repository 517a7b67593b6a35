//! Factory configuration
//!
//! Every field has a default, so an empty file is a valid configuration:
//!
//! ```toml
//! default_strategy = "expression"
//! skip_visibility = false
//! cache_generated = true
//!
//! [coercion]
//! kind = "locale"
//! decimal_separator = ","
//! group_separator = "."
//!
//! [emitter]
//! enabled = true
//! max_stack_depth = 16
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::coerce::{CoercionConfig, CoercionError};
use crate::emit::EmitterOptions;
use crate::factory::StrategyKind;

/// Errors loading a configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid configuration
    #[error("Invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// The coercion section describes an unusable policy
    #[error("Invalid coercion policy: {0}")]
    Coercion(#[from] CoercionError),
}

/// Object factory configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct FactoryConfig {
    /// Strategy used by `ObjectFactory::build_default`
    pub default_strategy: StrategyKind,
    /// Let generated callables bind non-public constructors
    pub skip_visibility: bool,
    /// Memoise generated factories per spec and strategy
    pub cache_generated: bool,
    /// Argument coercion for generic activation
    pub coercion: CoercionConfig,
    /// Code emitter limits
    pub emitter: EmitterOptions,
}

impl FactoryConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that the file format alone cannot rule out
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.coercion.build()?;
        Ok(())
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), ?config, "loaded factory config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::EmitterKind;

    #[test]
    fn test_empty_is_default() {
        assert_eq!(FactoryConfig::from_toml_str("").unwrap(), FactoryConfig::default());
    }

    #[test]
    fn test_full_config() {
        let config = FactoryConfig::from_toml_str(
            r#"
            default_strategy = "expression"
            skip_visibility = true
            cache_generated = true

            [coercion]
            kind = "locale"
            decimal_separator = ","
            group_separator = "."

            [emitter]
            max_stack_depth = 4
            "#,
        )
        .unwrap();
        assert_eq!(
            config.default_strategy,
            StrategyKind::GeneratedCallable(EmitterKind::Expression)
        );
        assert!(config.skip_visibility);
        assert!(config.cache_generated);
        assert_eq!(
            config.coercion,
            CoercionConfig::Locale {
                decimal_separator: ',',
                group_separator: Some('.')
            }
        );
        assert!(config.emitter.enabled);
        assert_eq!(config.emitter.max_stack_depth, 4);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(FactoryConfig::from_toml_str(r#"default_strategy = "magic""#).is_err());
        assert!(FactoryConfig::from_toml_str("unknown_key = 1").is_err());
        assert!(FactoryConfig::from_toml_str("[coercion]\nkind = \"fuzzy\"").is_err());
    }
}
