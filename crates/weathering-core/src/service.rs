//! Game service: one request, one action.
//!
//! Every call loads the full game from the repository, applies a single
//! engine operation and saves the result. The repository's version check
//! rejects a save that raced with another writer.

use crate::actions::{ActionResult, GameAction};
use crate::bot::GreedyBot;
use crate::game::{GameError, GameState};
use crate::repository::GameRepository;
use crate::scoring::WinCheck;
use crate::weather::EnvironmentProvider;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// What the caller gets back after an action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub state: GameState,
    pub result: ActionResult,
    pub win: WinCheck,
}

/// Result of asking the AI to move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AiStep {
    /// The active seat is human (or has nothing to do)
    Waiting { state: GameState },
    Acted {
        action: GameAction,
        response: ActionResponse,
    },
}

pub struct GameService<R: GameRepository> {
    repo: R,
    rng: Mutex<StdRng>,
    environment: Arc<dyn EnvironmentProvider + Send + Sync>,
    bot: GreedyBot,
}

impl<R: GameRepository> GameService<R> {
    /// Create a service; a seed makes every board, deck and roll reproducible
    pub fn new(
        repo: R,
        environment: Arc<dyn EnvironmentProvider + Send + Sync>,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            repo,
            rng: Mutex::new(rng),
            environment,
            bot: GreedyBot::default(),
        }
    }

    /// Replace the AI used by `ai_step`
    pub fn with_bot(mut self, bot: GreedyBot) -> Self {
        self.bot = bot;
        self
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }

    /// Generate and store a new game
    pub fn create_game(
        &self,
        game_id: impl Into<String>,
        player_names: Vec<String>,
    ) -> Result<GameState, GameError> {
        let state = self.with_rng(|rng| GameState::new(game_id, player_names, rng))?;
        self.repo.create_game(&state)?;
        tracing::info!(game_id = %state.game_id, players = state.player_count(), "game created");
        Ok(state)
    }

    pub fn load(&self, game_id: &str) -> Result<GameState, GameError> {
        self.repo.load_game(game_id)
    }

    /// Load, apply one action for the active player, save
    pub fn perform(&self, game_id: &str, action: GameAction) -> Result<ActionResponse, GameError> {
        let mut state = self.repo.load_game(game_id)?;
        let modifiers = self.environment.current();
        let name = action.name();

        let outcome = self
            .with_rng(|rng| state.apply_action(action, rng, modifiers.as_ref()))
            .map_err(|err| {
                tracing::debug!(game_id, action = name, error = %err, "action rejected");
                err
            })?;

        self.repo.save_game(&mut state)?;
        tracing::info!(
            game_id,
            action = name,
            player = state.active_player_index,
            version = state.version,
            "action applied"
        );

        Ok(ActionResponse {
            state,
            result: outcome.result,
            win: outcome.win,
        })
    }

    /// Let the bot take one action for the active player
    pub fn ai_step(&self, game_id: &str) -> Result<AiStep, GameError> {
        let state = self.repo.load_game(game_id)?;
        match self.bot.choose_action(&state) {
            Some(action) => {
                let response = self.perform(game_id, action.clone())?;
                Ok(AiStep::Acted { action, response })
            }
            None => Ok(AiStep::Waiting { state }),
        }
    }
}
