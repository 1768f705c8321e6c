//! Greedy AI player.
//!
//! The bot is an ordinary client of the engine: it inspects the public
//! state, picks one action and hands it back to be applied like any other.
//! - Setup: first legal settlement, then a road next to one of its buildings
//! - Roll phase: roll
//! - Main phase: the first affordable build of City > Settlement > Road, else end turn

use crate::actions::GameAction;
use crate::board::{ConstructionKind, Site};
use crate::game::{GameState, TurnPhase};
use serde::{Deserialize, Serialize};

/// Build preference in the main phase
const BUILD_PRIORITY: [ConstructionKind; 3] = [
    ConstructionKind::City,
    ConstructionKind::Settlement,
    ConstructionKind::Road,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreedyBot {
    /// Seat played by a human; the bot never moves for it
    pub human_seat: Option<usize>,
}

impl Default for GreedyBot {
    fn default() -> Self {
        Self {
            human_seat: Some(0),
        }
    }
}

impl GreedyBot {
    /// A bot that plays every seat
    pub fn all_seats() -> Self {
        Self { human_seat: None }
    }

    /// Choose the next action for the active player, or `None` when it is
    /// the human's turn or nothing legal remains
    pub fn choose_action(&self, game: &GameState) -> Option<GameAction> {
        let player = game.active_player_index;
        if self.human_seat == Some(player) {
            return None;
        }

        match game.phase {
            TurnPhase::Setup1 | TurnPhase::Setup2 => self.choose_setup(game, player),
            TurnPhase::Roll => Some(GameAction::RollDice),
            TurnPhase::Main => Some(self.choose_main(game, player)),
        }
    }

    fn choose_setup(&self, game: &GameState, player: usize) -> Option<GameAction> {
        let limit = game.phase.setup_limit()?;
        let owner = game.player(player).ok()?.id;

        if game.constructions.count(owner, ConstructionKind::Settlement) < limit {
            return game
                .legal_locations(player, ConstructionKind::Settlement)
                .into_iter()
                .next()
                .map(|location_id| build(ConstructionKind::Settlement, location_id));
        }

        self.road_next_to_building(game, player)
            .or_else(|| {
                game.legal_locations(player, ConstructionKind::Road)
                    .into_iter()
                    .next()
            })
            .map(|location_id| build(ConstructionKind::Road, location_id))
    }

    /// First legal road touching one of the player's settlements or cities
    fn road_next_to_building(&self, game: &GameState, player: usize) -> Option<String> {
        let owner = game.player(player).ok()?.id;
        game.constructions
            .iter()
            .filter(|c| c.owner == owner && c.kind.is_building())
            .filter_map(|c| match c.site {
                Site::Vertex(v) => Some(v),
                Site::Edge(_) => None,
            })
            .flat_map(|v| v.attached_edges())
            .map(|e| e.to_string())
            .find(|id| game.can_build(player, ConstructionKind::Road, id).is_ok())
    }

    fn choose_main(&self, game: &GameState, player: usize) -> GameAction {
        let affordable = game
            .player(player)
            .map(|p| p.affordable())
            .unwrap_or_default();

        BUILD_PRIORITY
            .into_iter()
            .filter(|kind| affordable.contains(kind))
            .find_map(|kind| {
                game.legal_locations(player, kind)
                    .into_iter()
                    .next()
                    .map(|location_id| build(kind, location_id))
            })
            .unwrap_or(GameAction::EndTurn)
    }
}

fn build(kind: ConstructionKind, location_id: String) -> GameAction {
    GameAction::Build { kind, location_id }
}
