//! Construction specs and strategy selection

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use instantia_sdk::Signature;

use crate::emit::EmitterKind;

/// The target type plus the exact parameter types of the constructor to bind
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstructionSpec {
    /// Target type name
    pub target: Arc<str>,
    /// Ordered parameter types
    pub params: Signature,
}

impl ConstructionSpec {
    /// Create a spec for `target` with the given parameter types
    pub fn new(target: &str, params: impl Into<Signature>) -> Self {
        Self {
            target: Arc::from(target),
            params: params.into(),
        }
    }
}

impl fmt::Display for ConstructionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.target, self.params)
    }
}

/// How a factory turns arguments into an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Default)]
#[serde(try_from = "String")]
pub enum StrategyKind {
    /// Ordinary construction in code; no runtime factory exists for it
    Direct,
    /// Resolve and coerce on every call
    ReflectiveGeneric,
    /// Bind the constructor handle once, call it directly
    #[default]
    ReflectiveDirect,
    /// Synthesize a callable ahead of use
    GeneratedCallable(EmitterKind),
}

impl StrategyKind {
    /// Every strategy, in the order the demo harness walks them
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::Direct,
        StrategyKind::ReflectiveGeneric,
        StrategyKind::ReflectiveDirect,
        StrategyKind::GeneratedCallable(EmitterKind::Instructions),
        StrategyKind::GeneratedCallable(EmitterKind::Expression),
    ];

    /// Short name, as accepted by `FromStr`
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Direct => "direct",
            StrategyKind::ReflectiveGeneric => "generic",
            StrategyKind::ReflectiveDirect => "reflective-direct",
            StrategyKind::GeneratedCallable(EmitterKind::Instructions) => "emit",
            StrategyKind::GeneratedCallable(EmitterKind::Expression) => "expression",
        }
    }

    /// Whether build synthesizes code
    pub fn is_generated(&self) -> bool {
        matches!(self, StrategyKind::GeneratedCallable(_))
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown strategy name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown strategy '{0}' (expected one of: direct, generic, reflective-direct, emit, expression)")]
pub struct ParseStrategyError(pub String);

impl FromStr for StrategyKind {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(StrategyKind::Direct),
            "generic" | "reflective-generic" => Ok(StrategyKind::ReflectiveGeneric),
            "reflective-direct" => Ok(StrategyKind::ReflectiveDirect),
            "emit" | "instructions" => Ok(StrategyKind::GeneratedCallable(EmitterKind::Instructions)),
            "expression" => Ok(StrategyKind::GeneratedCallable(EmitterKind::Expression)),
            _ => Err(ParseStrategyError(s.to_string())),
        }
    }
}

impl TryFrom<String> for StrategyKind {
    type Error = ParseStrategyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use instantia_sdk::ParamType;

    #[test]
    fn test_strategy_names_round_trip() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.name().parse::<StrategyKind>(), Ok(kind));
        }
        assert_eq!(
            "Reflective-Generic".parse::<StrategyKind>(),
            Ok(StrategyKind::ReflectiveGeneric)
        );
        assert!("reflection".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_spec_display() {
        let spec = ConstructionSpec::new("ValueHolder", [ParamType::Str, ParamType::Int]);
        assert_eq!(spec.to_string(), "ValueHolder(str, int)");
        assert_eq!(spec, ConstructionSpec::new("ValueHolder", vec![ParamType::Str, ParamType::Int]));
    }
}
