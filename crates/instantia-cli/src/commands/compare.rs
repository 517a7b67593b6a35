//! `instantia compare`: Relative build and per-call cost of each strategy.

use std::hint::black_box;
use std::time::{Duration, Instant};

use anyhow::Context;
use instantia_engine::{FactoryConfig, StrategyKind};
use instantia_sdk::Value;

use super::{holder_factories, holder_spec};
use crate::holder::ValueHolder;
use crate::output::StyledOutput;

const WARMUP: usize = 1_000;

/// Timing for one strategy
#[derive(Debug, Clone)]
pub struct Measurement {
    pub strategy: StrategyKind,
    /// `None` for direct construction, which has nothing to build
    pub build: Option<Duration>,
    pub per_call: Duration,
}

fn mean(total: Duration, iterations: usize) -> Duration {
    let nanos = total.as_nanos() / iterations.max(1) as u128;
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

fn time_calls(iterations: usize, mut call: impl FnMut() -> anyhow::Result<()>) -> anyhow::Result<Duration> {
    for _ in 0..WARMUP.min(iterations) {
        call()?;
    }
    let start = Instant::now();
    for _ in 0..iterations {
        call()?;
    }
    Ok(mean(start.elapsed(), iterations))
}

/// Measure every strategy over `iterations` calls each
pub fn measure(config: FactoryConfig, iterations: usize) -> anyhow::Result<Vec<Measurement>> {
    let factories = holder_factories(config)?;
    let spec = holder_spec();
    let args = [Value::str("hello")];
    let mut results = Vec::with_capacity(StrategyKind::ALL.len());

    for strategy in StrategyKind::ALL {
        if strategy == StrategyKind::Direct {
            let per_call = time_calls(iterations, || {
                black_box(ValueHolder::new(black_box("hello")));
                Ok(())
            })?;
            results.push(Measurement {
                strategy,
                build: None,
                per_call,
            });
            continue;
        }

        let start = Instant::now();
        let factory = factories
            .build(&spec, strategy)
            .with_context(|| format!("building {} factory", strategy))?;
        let build = start.elapsed();

        let per_call = time_calls(iterations, || {
            black_box(factory.invoke(black_box(&args))?);
            Ok(())
        })?;
        tracing::debug!(%strategy, ?build, ?per_call, "measured");
        results.push(Measurement {
            strategy,
            build: Some(build),
            per_call,
        });
    }
    Ok(results)
}

pub fn execute(config: FactoryConfig, iterations: usize, out: &mut StyledOutput) -> anyhow::Result<()> {
    let results = measure(config, iterations)?;
    let baseline = results
        .iter()
        .find(|m| m.strategy == StrategyKind::Direct)
        .map(|m| m.per_call.as_nanos().max(1) as f64)
        .unwrap_or(1.0);

    out.bold(&format!(
        "{:<20}{:>14}{:>14}{:>10}",
        "strategy", "build", "per call", "vs direct"
    ));
    out.newline();
    for m in &results {
        out.info(&format!("{:<20}", m.strategy.to_string()));
        let build = m.build.map_or_else(|| "-".to_string(), |d| format!("{:.1?}", d));
        out.plain(&format!("{:>14}{:>14}", build, format!("{:.1?}", m.per_call)));
        let ratio = m.per_call.as_nanos() as f64 / baseline;
        let ratio = format!("{:>9.1}x", ratio);
        if m.strategy == StrategyKind::ReflectiveGeneric {
            out.warning(&ratio);
        } else {
            out.success(&ratio);
        }
        out.newline();
    }
    out.flush();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_covers_every_strategy() {
        let results = measure(FactoryConfig::default(), 100).unwrap();
        let strategies: Vec<_> = results.iter().map(|m| m.strategy).collect();
        assert_eq!(strategies, StrategyKind::ALL.to_vec());
        assert!(results[0].build.is_none());
        assert!(results[1..].iter().all(|m| m.build.is_some()));
    }

    #[test]
    fn test_mean_of_zero_iterations() {
        assert_eq!(mean(Duration::from_micros(5), 0), Duration::from_micros(5));
        assert_eq!(mean(Duration::from_micros(10), 5), Duration::from_micros(2));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_mean_beyond_u32_iterations() {
        assert_eq!(
            mean(Duration::from_secs(10_000), 5_000_000_000),
            Duration::from_micros(2)
        );
    }
}
