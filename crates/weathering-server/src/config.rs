//! Server configuration read from the environment.

use std::net::SocketAddr;
use thiserror::Error;
use weathering_core::EnvironmentalModifiers;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_TEMP_C: f64 = 20.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SERVER_ADDR `{value}` is not a socket address")]
    InvalidAddr { value: String },

    #[error("WEATHER_TEMP_C `{value}` is not a number")]
    InvalidTemperature { value: String },

    #[error("GAME_SEED `{value}` is not an unsigned integer")]
    InvalidSeed { value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Weather reported at startup; `None` disables modifiers
    pub weather: Option<EnvironmentalModifiers>,
    /// Fixed RNG seed for reproducible games
    pub seed: Option<u64>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key/value source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let addr_text = lookup("SERVER_ADDR").unwrap_or_else(|| DEFAULT_ADDR.into());
        let addr = addr_text
            .parse()
            .map_err(|_| ConfigError::InvalidAddr { value: addr_text })?;

        let temp_c = match lookup("WEATHER_TEMP_C") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTemperature { value })?,
            None => DEFAULT_TEMP_C,
        };

        let weather = lookup("WEATHER_CONDITION")
            .filter(|condition| !condition.trim().is_empty())
            .map(|condition| EnvironmentalModifiers::from_conditions(&condition, temp_c));

        let seed = lookup("GAME_SEED")
            .map(|value| {
                value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidSeed { value })
            })
            .transpose()?;

        Ok(Self {
            addr,
            weather,
            seed,
        })
    }
}
