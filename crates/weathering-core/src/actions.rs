//! Game actions that players can take.
//!
//! This module defines the action surface accepted by `GameState::apply_action`
//! and the results those actions produce. Both travel as tagged JSON.

use crate::board::{ConstructionKind, PlayerId, Resource};
use crate::dev_cards::{DevCardEffect, DevCardPlay};
use crate::game::{GameError, RollOutcome};
use crate::player::DevCardKind;
use crate::placement::BuildOutcome;
use crate::scoring::WinCheck;
use serde::{Deserialize, Serialize};

/// All possible actions a player can take, always on behalf of the active player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum GameAction {
    /// Roll the dice (must be done at start of turn)
    RollDice,
    /// Place a road, settlement or city at a raw location id
    Build {
        kind: ConstructionKind,
        location_id: String,
    },
    /// Trade four `offer` with the bank for one `want`
    Trade { offer: Resource, want: Resource },
    /// Buy a development card from the deck
    BuyDevCard,
    /// Play a development card with its payload
    PlayDevCard(DevCardPlay),
    /// End your turn
    EndTurn,
}

impl GameAction {
    /// Parse an action from client JSON
    pub fn from_json(value: serde_json::Value) -> Result<Self, GameError> {
        serde_json::from_value(value).map_err(|e| GameError::UnknownAction {
            detail: e.to_string(),
        })
    }

    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            GameAction::RollDice => "roll_dice",
            GameAction::Build { .. } => "build",
            GameAction::Trade { .. } => "trade",
            GameAction::BuyDevCard => "buy_dev_card",
            GameAction::PlayDevCard(_) => "play_dev_card",
            GameAction::EndTurn => "end_turn",
        }
    }
}

/// What an action did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionResult {
    Rolled(RollOutcome),
    Built(BuildOutcome),
    Traded { offer: Resource, want: Resource },
    DevCardBought { card: DevCardKind },
    DevCardPlayed(DevCardEffect),
    TurnEnded { next_player: PlayerId, turn_count: u32 },
}

/// Result of a successful action plus the win check that followed it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub result: ActionResult,
    pub win: WinCheck,
}
