//! Environmental modifiers that perturb resource production.
//!
//! A weather provider reports a condition and temperature; the condition is
//! turned into a set of buffs, each nudging the yield of one resource. The
//! engine only ever sees the buffs, never the provider.

use crate::board::Resource;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuffKind {
    Bonus,
    Penalty,
}

/// A signed adjustment to one resource's per-tile yield
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buff {
    pub kind: BuffKind,
    pub target: Resource,
    pub amount: i32,
    /// Human readable explanation shown to players
    pub reason: String,
}

impl Buff {
    pub fn bonus(target: Resource, amount: i32, reason: impl Into<String>) -> Self {
        Self {
            kind: BuffKind::Bonus,
            target,
            amount,
            reason: reason.into(),
        }
    }

    pub fn penalty(target: Resource, amount: i32, reason: impl Into<String>) -> Self {
        Self {
            kind: BuffKind::Penalty,
            target,
            amount,
            reason: reason.into(),
        }
    }
}

/// Snapshot of the environment applied to a production roll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EnvironmentalModifiers {
    pub condition: String,
    pub temp_c: f64,
    pub buffs: Vec<Buff>,
}

impl EnvironmentalModifiers {
    /// Derive buffs from a reported weather condition
    pub fn from_conditions(condition: &str, temp_c: f64) -> Self {
        let buffs = match condition.trim().to_ascii_lowercase().as_str() {
            "rain" | "drizzle" | "thunderstorm" => {
                vec![Buff::bonus(Resource::Wood, 1, "Rain: Forest growth +1")]
            }
            "clear" | "sun" | "sunny" => {
                vec![Buff::bonus(Resource::Wheat, 1, "Sunny: Bumper harvest +1")]
            }
            "snow" => vec![Buff::penalty(
                Resource::Sheep,
                -1,
                "Snow: Livestock struggling -1",
            )],
            _ => Vec::new(),
        };

        Self {
            condition: condition.trim().to_string(),
            temp_c,
            buffs,
        }
    }

    /// Sum of all buff amounts targeting a resource
    pub fn adjustment_for(&self, resource: Resource) -> i32 {
        self.buffs
            .iter()
            .filter(|b| b.target == resource)
            .map(|b| b.amount)
            .sum()
    }
}

/// Source of the current environmental modifiers.
///
/// `None` means no modifiers apply.
pub trait EnvironmentProvider {
    fn current(&self) -> Option<EnvironmentalModifiers>;
}

/// Provider returning the same snapshot every time (or none at all)
#[derive(Debug, Clone, Default)]
pub struct FixedEnvironment(pub Option<EnvironmentalModifiers>);

impl EnvironmentProvider for FixedEnvironment {
    fn current(&self) -> Option<EnvironmentalModifiers> {
        self.0.clone()
    }
}
