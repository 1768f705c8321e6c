//! Game sessions: the engine service plus per-game serialization.

use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;
use weathering_core::{
    ActionResponse, AiStep, EnvironmentalModifiers, GameAction, GameError, GameId, GameService,
    GameState, MemoryRepository,
};

use crate::config::ServerConfig;
use crate::weather::WeatherStation;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Game(#[from] GameError),

    #[error("Malformed message: {0}")]
    Malformed(String),
}

impl SessionError {
    /// Stable code sent to clients
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::Game(err) => err.kind(),
            SessionError::Malformed(_) => "malformed_message",
        }
    }
}

pub struct GameSessions {
    service: GameService<MemoryRepository>,
    weather: Arc<WeatherStation>,
    /// Held across load, apply and save so one game never runs two actions at once
    locks: DashMap<GameId, Arc<Mutex<()>>>,
}

impl GameSessions {
    pub fn new(config: &ServerConfig) -> Self {
        let weather = Arc::new(WeatherStation::new(config.weather.clone()));
        let service = GameService::new(MemoryRepository::new(), weather.clone(), config.seed);
        Self {
            service,
            weather,
            locks: DashMap::new(),
        }
    }

    /// Lock of a game created by this session; unknown ids never get one
    fn lock_for(&self, game_id: &str) -> Result<Arc<Mutex<()>>, SessionError> {
        self.locks
            .get(game_id)
            .map(|lock| Arc::clone(lock.value()))
            .ok_or_else(|| {
                GameError::GameNotFound {
                    game_id: game_id.to_string(),
                }
                .into()
            })
    }

    pub async fn create_game(&self, player_names: Vec<String>) -> Result<GameState, SessionError> {
        let game_id = format!("g_{}", Uuid::new_v4().simple());
        let state = self.service.create_game(game_id, player_names)?;
        self.locks.insert(state.game_id.clone(), Arc::default());
        Ok(state)
    }

    pub async fn state(&self, game_id: &str) -> Result<GameState, SessionError> {
        let lock = self.lock_for(game_id)?;
        let _guard = lock.lock().await;
        Ok(self.service.load(game_id)?)
    }

    /// Parse and apply one action for the active player
    pub async fn perform(
        &self,
        game_id: &str,
        action: serde_json::Value,
    ) -> Result<ActionResponse, SessionError> {
        let action = GameAction::from_json(action)?;
        let lock = self.lock_for(game_id)?;
        let _guard = lock.lock().await;
        Ok(self.service.perform(game_id, action)?)
    }

    pub async fn ai_step(&self, game_id: &str) -> Result<AiStep, SessionError> {
        let lock = self.lock_for(game_id)?;
        let _guard = lock.lock().await;
        Ok(self.service.ai_step(game_id)?)
    }

    pub fn set_weather(&self, condition: &str, temp_c: f64) -> EnvironmentalModifiers {
        self.weather.report(condition, temp_c)
    }
}
