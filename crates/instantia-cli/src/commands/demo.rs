//! `instantia demo`: Construct a `ValueHolder` every possible way.

use std::io::Read;

use anyhow::Context;
use instantia_engine::{EmitterKind, FactoryConfig, StrategyKind};
use instantia_sdk::Value;

use super::{holder_factories, holder_spec};
use crate::holder::ValueHolder;
use crate::output::StyledOutput;

/// One line per construction path, in walk order
pub fn demo_lines(config: FactoryConfig) -> anyhow::Result<Vec<String>> {
    let mut lines = Vec::with_capacity(5);

    let direct = ValueHolder::new("Oh look, an instance");
    lines.push(direct.value().to_string());

    let factories = holder_factories(config)?;
    let spec = holder_spec();
    let untyped = [
        (StrategyKind::ReflectiveGeneric, "This is slooooow"),
        (StrategyKind::ReflectiveDirect, "We're invoking the constructor!"),
        (
            StrategyKind::GeneratedCallable(EmitterKind::Instructions),
            "Hey, we did this the hard way!",
        ),
    ];
    for (strategy, text) in untyped {
        let factory = factories
            .build(&spec, strategy)
            .with_context(|| format!("building {} factory", strategy))?;
        let instance = factory.invoke(&[Value::str(text)])?;
        let value = instance
            .field("value")
            .and_then(|v| v.as_str().map(str::to_string))
            .with_context(|| format!("{} instance has no value", strategy))?;
        lines.push(value);
    }

    let strategy = StrategyKind::GeneratedCallable(EmitterKind::Expression);
    let create = factories
        .build(&spec, strategy)
        .with_context(|| format!("building {} factory", strategy))?
        .typed::<(String,), ValueHolder>()?;
    let holder = create.call(("This is much easier".to_string(),))?;
    lines.push(holder.value().to_string());

    Ok(lines)
}

pub fn execute(config: FactoryConfig, wait: bool, out: &mut StyledOutput) -> anyhow::Result<()> {
    for line in demo_lines(config)? {
        out.line(&line);
    }

    if wait {
        out.line("Press any key to exit.");
        out.flush();
        let mut byte = [0u8; 1];
        std::io::stdin().read(&mut byte).context("reading stdin")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use instantia_engine::EmitterOptions;

    #[test]
    fn test_demo_lines_in_order() {
        let lines = demo_lines(FactoryConfig::default()).unwrap();
        assert_eq!(
            lines,
            vec![
                "Oh look, an instance",
                "This is slooooow",
                "We're invoking the constructor!",
                "Hey, we did this the hard way!",
                "This is much easier",
            ]
        );
    }

    #[test]
    fn test_demo_fails_without_emission() {
        let config = FactoryConfig {
            emitter: EmitterOptions {
                enabled: false,
                ..EmitterOptions::default()
            },
            ..FactoryConfig::default()
        };
        let err = demo_lines(config).unwrap_err();
        assert!(format!("{:#}", err).contains("building emit factory"));
    }
}
