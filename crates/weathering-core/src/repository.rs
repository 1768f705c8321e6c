//! Storage contract for games.
//!
//! The engine only needs whole-game load and save; the finer-grained
//! operations are provided as upserts on the owning game so any backend that
//! implements the three core methods gets them for free. Saves are guarded by
//! an optimistic version check so two writers can never interleave on the
//! same game.

use crate::board::{Construction, ConstructionKind, Site, Tile};
use crate::game::{GameError, GameId, GameState};
use crate::player::Player;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Narrow persistence interface used by the game service
pub trait GameRepository: Send + Sync {
    /// Store a brand new game
    fn create_game(&self, state: &GameState) -> Result<(), GameError>;

    /// Load the full state of a game
    fn load_game(&self, game_id: &str) -> Result<GameState, GameError>;

    /// Replace a stored game.
    ///
    /// `state.version` must equal the stored version; on success it is
    /// incremented in both the store and `state`.
    fn save_game(&self, state: &mut GameState) -> Result<(), GameError>;

    /// Replace one player record
    fn save_player(&self, game_id: &str, player: &Player) -> Result<(), GameError> {
        let mut state = self.load_game(game_id)?;
        let index = player.id as usize;
        let slot = state
            .players
            .get_mut(index)
            .ok_or(GameError::PlayerNotFound { index })?;
        *slot = player.clone();
        self.save_game(&mut state)
    }

    /// Add a construction; its site must be free
    fn insert_construction(
        &self,
        game_id: &str,
        construction: &Construction,
    ) -> Result<(), GameError> {
        let mut state = self.load_game(game_id)?;
        if state.constructions.at(&construction.site).is_some() {
            return Err(GameError::LocationOccupied);
        }
        state.constructions.insert(construction.clone());
        self.save_game(&mut state)
    }

    /// Change the kind of the construction at a site
    fn update_construction_type(
        &self,
        game_id: &str,
        site: &Site,
        kind: ConstructionKind,
    ) -> Result<(), GameError> {
        let mut state = self.load_game(game_id)?;
        if !state.constructions.set_kind(site, kind) {
            return Err(GameError::InvalidLocation {
                location: site.to_string(),
            });
        }
        self.save_game(&mut state)
    }

    /// Add or replace a board tile
    fn insert_tile(&self, game_id: &str, tile: &Tile) -> Result<(), GameError> {
        let mut state = self.load_game(game_id)?;
        state.board.upsert_tile(tile.clone());
        self.save_game(&mut state)
    }
}

struct StoredGame {
    version: u64,
    document: String,
}

/// In-process repository keeping each game as a JSON document
#[derive(Default)]
pub struct MemoryRepository {
    games: Mutex<HashMap<GameId, StoredGame>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored games
    pub fn len(&self) -> usize {
        self.lock().map(|games| games.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<GameId, StoredGame>>, GameError> {
        self.games.lock().map_err(|_| GameError::StorageError {
            reason: "repository lock poisoned".to_string(),
        })
    }

    fn encode(state: &GameState) -> Result<String, GameError> {
        serde_json::to_string(state).map_err(|e| GameError::StorageError {
            reason: e.to_string(),
        })
    }
}

impl GameRepository for MemoryRepository {
    fn create_game(&self, state: &GameState) -> Result<(), GameError> {
        let document = Self::encode(state)?;
        let mut games = self.lock()?;
        if games.contains_key(&state.game_id) {
            return Err(GameError::StorageError {
                reason: format!("game `{}` already exists", state.game_id),
            });
        }
        games.insert(
            state.game_id.clone(),
            StoredGame {
                version: state.version,
                document,
            },
        );
        Ok(())
    }

    fn load_game(&self, game_id: &str) -> Result<GameState, GameError> {
        let games = self.lock()?;
        let stored = games.get(game_id).ok_or_else(|| GameError::GameNotFound {
            game_id: game_id.to_string(),
        })?;
        serde_json::from_str(&stored.document).map_err(|e| GameError::StorageError {
            reason: e.to_string(),
        })
    }

    fn save_game(&self, state: &mut GameState) -> Result<(), GameError> {
        let mut games = self.lock()?;
        let stored = games
            .get_mut(&state.game_id)
            .ok_or_else(|| GameError::GameNotFound {
                game_id: state.game_id.clone(),
            })?;
        if stored.version != state.version {
            return Err(GameError::StorageError {
                reason: format!(
                    "stale write to `{}`: stored version {}, got {}",
                    state.game_id, stored.version, state.version
                ),
            });
        }

        let mut next = state.clone();
        next.version += 1;
        stored.document = Self::encode(&next)?;
        stored.version = next.version;
        state.version = next.version;
        Ok(())
    }
}
