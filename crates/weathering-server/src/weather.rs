//! Process-wide weather report.

use std::sync::RwLock;
use weathering_core::{EnvironmentProvider, EnvironmentalModifiers};

/// Current conditions, swappable at runtime
#[derive(Debug, Default)]
pub struct WeatherStation {
    current: RwLock<Option<EnvironmentalModifiers>>,
}

impl WeatherStation {
    pub fn new(initial: Option<EnvironmentalModifiers>) -> Self {
        Self {
            current: RwLock::new(initial),
        }
    }

    /// Report new conditions and return the resulting modifiers
    pub fn report(&self, condition: &str, temp_c: f64) -> EnvironmentalModifiers {
        let modifiers = EnvironmentalModifiers::from_conditions(condition, temp_c);
        let mut current = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = Some(modifiers.clone());
        tracing::info!(condition, temp_c, buffs = modifiers.buffs.len(), "weather updated");
        modifiers
    }
}

impl EnvironmentProvider for WeatherStation {
    fn current(&self) -> Option<EnvironmentalModifiers> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
