//! Static table of runnable strategy types.
//!
//! Adding a strategy means writing its module and appending one
//! `StrategyDescriptor` to `DESCRIPTORS`.

#[cfg(test)]
#[path = "registry_test.rs"]
mod registry_test;

use serde::Serialize;

use super::ema_crossover::{self, EmaCrossover, EmaCrossoverParams};
use super::{Strategy, StrategyError};

type Constructor = fn(&serde_json::Value) -> Result<Box<dyn Strategy>, StrategyError>;

pub struct StrategyDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub default_params: fn() -> serde_json::Value,
    construct: Constructor,
}

/// Listing entry for `/api/strategies/available`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailableStrategy {
    pub name: &'static str,
    pub description: &'static str,
    pub default_params: serde_json::Value,
}

static DESCRIPTORS: &[StrategyDescriptor] = &[StrategyDescriptor {
    name: ema_crossover::NAME,
    description: ema_crossover::DESCRIPTION,
    default_params: ema_crossover::default_params,
    construct: build_ema_crossover,
}];

fn build_ema_crossover(params: &serde_json::Value) -> Result<Box<dyn Strategy>, StrategyError> {
    let params = EmaCrossoverParams::from_json(params)?;
    Ok(Box::new(EmaCrossover::new(params)))
}

#[must_use]
pub fn lookup(name: &str) -> Option<&'static StrategyDescriptor> {
    DESCRIPTORS.iter().find(|d| d.name == name)
}

#[must_use]
pub fn available() -> Vec<AvailableStrategy> {
    DESCRIPTORS
        .iter()
        .map(|d| AvailableStrategy { name: d.name, description: d.description, default_params: (d.default_params)() })
        .collect()
}

/// Instantiate a strategy by registry key.
///
/// # Errors
///
/// `StrategyError::Unknown` lists the registered names when `name` is not
/// one of them; params errors come from the strategy itself.
pub fn build(name: &str, params: &serde_json::Value) -> Result<Box<dyn Strategy>, StrategyError> {
    let descriptor = lookup(name).ok_or_else(|| StrategyError::Unknown {
        name: name.to_owned(),
        available: DESCRIPTORS.iter().map(|d| d.name).collect::<Vec<_>>().join(", "),
    })?;
    (descriptor.construct)(params)
}
