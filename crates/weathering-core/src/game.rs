//! Core game state machine.
//!
//! This module contains the `GameState` aggregate, the turn phases and the
//! error type shared by every rules operation. Placement, production,
//! development cards and scoring add their own `impl GameState` blocks in
//! sibling modules.

use crate::actions::{ActionOutcome, ActionResult, GameAction};
use crate::board::{Board, ConstructionKind, Constructions, PlayerId, Resource};
use crate::hex::{HexCoord, ParseLocationError};
use crate::player::{DevCardKind, Player};
use crate::production::ProductionReport;
use crate::weather::EnvironmentalModifiers;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use thiserror::Error;

/// Identifier of a stored game
pub type GameId = String;

/// Cards offered to the bank for one card in return
pub const BANK_TRADE_RATE: u32 = 4;

/// A hand larger than this is halved when a 7 is rolled
pub const DISCARD_THRESHOLD: u32 = 7;

/// Game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnPhase {
    /// First placement round, players in seat order
    #[serde(rename = "setup_1")]
    Setup1,
    /// Second placement round, players in reverse order
    #[serde(rename = "setup_2")]
    Setup2,
    /// Start of a turn, dice not rolled yet
    #[serde(rename = "roll")]
    Roll,
    /// Dice rolled: build, trade, buy and play cards, end turn
    #[serde(rename = "main")]
    Main,
}

impl TurnPhase {
    /// Settlements and roads each player owns once the current setup round is done
    pub fn setup_limit(&self) -> Option<usize> {
        match self {
            TurnPhase::Setup1 => Some(1),
            TurnPhase::Setup2 => Some(2),
            TurnPhase::Roll | TurnPhase::Main => None,
        }
    }

    pub fn is_setup(&self) -> bool {
        self.setup_limit().is_some()
    }
}

/// Errors that can occur when applying actions
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("invalid location `{location}`")]
    InvalidLocation { location: String },

    #[error("location is already occupied")]
    LocationOccupied,

    #[error("a city must replace one of your own settlements")]
    MustUpgradeOwnSettlement,

    #[error("that construction belongs to another player")]
    NotYourConstruction,

    #[error("too close to another building")]
    TooCloseToAnotherBuilding,

    #[error("already placed that piece this round")]
    AlreadyPlacedThisRound,

    #[error("road must connect to your road or building")]
    RoadMustConnect,

    #[error("settlement must connect to one of your roads")]
    SettlementMustConnect,

    #[error("not enough {resource}: need {needed}, have {have}")]
    InsufficientResource {
        resource: Resource,
        needed: u32,
        have: u32,
    },

    #[error("you must roll the dice first")]
    MustRollFirst,

    #[error("dice already rolled this turn")]
    AlreadyRolledThisTurn,

    #[error("only placements are allowed during setup")]
    SetupInProgress,

    #[error("no development cards left in the deck")]
    DeckExhausted,

    #[error("no playable {card:?} card this turn")]
    CardNotPlayableThisTurn { card: DevCardKind },

    #[error("invalid card payload: {reason}")]
    InvalidPayload { reason: String },

    #[error("invalid trade")]
    InvalidTrade,

    #[error("a game needs 2 to 4 players, got {count}")]
    InvalidPlayerCount { count: usize },

    #[error("unknown action: {detail}")]
    UnknownAction { detail: String },

    #[error("game `{game_id}` not found")]
    GameNotFound { game_id: GameId },

    #[error("no player at index {index}")]
    PlayerNotFound { index: usize },

    #[error("storage error: {reason}")]
    StorageError { reason: String },
}

impl GameError {
    /// Stable snake_case code for clients
    pub fn kind(&self) -> &'static str {
        match self {
            GameError::InvalidLocation { .. } => "invalid_location",
            GameError::LocationOccupied => "location_occupied",
            GameError::MustUpgradeOwnSettlement => "must_upgrade_own_settlement",
            GameError::NotYourConstruction => "not_your_construction",
            GameError::TooCloseToAnotherBuilding => "too_close_to_another_building",
            GameError::AlreadyPlacedThisRound => "already_placed_this_round",
            GameError::RoadMustConnect => "road_must_connect",
            GameError::SettlementMustConnect => "settlement_must_connect",
            GameError::InsufficientResource { .. } => "insufficient_resource",
            GameError::MustRollFirst => "must_roll_first",
            GameError::AlreadyRolledThisTurn => "already_rolled_this_turn",
            GameError::SetupInProgress => "setup_in_progress",
            GameError::DeckExhausted => "deck_exhausted",
            GameError::CardNotPlayableThisTurn { .. } => "card_not_playable_this_turn",
            GameError::InvalidPayload { .. } => "invalid_payload",
            GameError::InvalidTrade => "invalid_trade",
            GameError::InvalidPlayerCount { .. } => "invalid_player_count",
            GameError::UnknownAction { .. } => "unknown_action",
            GameError::GameNotFound { .. } => "game_not_found",
            GameError::PlayerNotFound { .. } => "player_not_found",
            GameError::StorageError { .. } => "storage_error",
        }
    }

    pub(crate) fn payload(reason: impl Into<String>) -> Self {
        GameError::InvalidPayload {
            reason: reason.into(),
        }
    }
}

impl From<ParseLocationError> for GameError {
    fn from(err: ParseLocationError) -> Self {
        GameError::InvalidLocation { location: err.0 }
    }
}

/// What happened when the dice were rolled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollOutcome {
    pub dice: [u8; 2],
    pub total: u8,
    /// Resources credited per player (empty on a 7)
    #[serde(with = "crate::production::by_player")]
    pub production: ProductionReport,
    /// Cards discarded per player (only on a 7)
    #[serde(with = "crate::production::by_player")]
    pub discarded: BTreeMap<PlayerId, u32>,
}

/// The complete game state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub game_id: GameId,
    /// Incremented by the repository on every successful save
    pub version: u64,
    /// 0 during setup, 1 on the first regular turn
    pub turn_count: u32,
    pub phase: TurnPhase,
    pub active_player_index: usize,
    /// Modifiers applied to the most recent production roll
    pub environment: Option<EnvironmentalModifiers>,
    pub last_roll: Option<[u8; 2]>,
    pub players: Vec<Player>,
    pub board: Board,
    pub constructions: Constructions,
    pub dev_deck: VecDeque<DevCardKind>,
    pub longest_road_holder: Option<PlayerId>,
    pub largest_army_holder: Option<PlayerId>,
    /// Starts on the desert and stays there
    pub robber_tile: HexCoord,
}

impl GameState {
    /// Create a new game for 2 to 4 named players
    pub fn new<R: Rng>(
        game_id: impl Into<GameId>,
        player_names: Vec<String>,
        rng: &mut R,
    ) -> Result<Self, GameError> {
        if !(2..=4).contains(&player_names.len()) {
            return Err(GameError::InvalidPlayerCount {
                count: player_names.len(),
            });
        }

        let players = player_names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Player::new(i as PlayerId, name))
            .collect();

        let board = Board::generate(rng);
        let robber_tile = board.desert().map(|t| t.coord).unwrap_or_default();
        let dev_deck = DevCardKind::shuffled_deck(rng);

        Ok(Self {
            game_id: game_id.into(),
            version: 0,
            turn_count: 0,
            phase: TurnPhase::Setup1,
            active_player_index: 0,
            environment: None,
            last_roll: None,
            players,
            board,
            constructions: Constructions::new(),
            dev_deck,
            longest_road_holder: None,
            largest_army_holder: None,
            robber_tile,
        })
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn player(&self, index: usize) -> Result<&Player, GameError> {
        self.players
            .get(index)
            .ok_or(GameError::PlayerNotFound { index })
    }

    pub(crate) fn player_mut(&mut self, index: usize) -> Result<&mut Player, GameError> {
        self.players
            .get_mut(index)
            .ok_or(GameError::PlayerNotFound { index })
    }

    /// The player whose turn it is
    pub fn active_player(&self) -> Result<&Player, GameError> {
        self.player(self.active_player_index)
    }

    /// Apply one action for the active player.
    ///
    /// All-or-nothing: on error the state is exactly what it was before the
    /// call. The win condition is evaluated after every successful action.
    pub fn apply_action<R: Rng>(
        &mut self,
        action: GameAction,
        rng: &mut R,
        modifiers: Option<&EnvironmentalModifiers>,
    ) -> Result<ActionOutcome, GameError> {
        let snapshot = self.clone();
        match self.dispatch(action, rng, modifiers) {
            Ok(result) => {
                let win = self.check_win_condition();
                Ok(ActionOutcome { result, win })
            }
            Err(err) => {
                *self = snapshot;
                Err(err)
            }
        }
    }

    fn dispatch<R: Rng>(
        &mut self,
        action: GameAction,
        rng: &mut R,
        modifiers: Option<&EnvironmentalModifiers>,
    ) -> Result<ActionResult, GameError> {
        let player = self.active_player_index;
        match action {
            GameAction::RollDice => self.roll_dice(rng, modifiers).map(ActionResult::Rolled),
            GameAction::Build { kind, location_id } => self
                .build(player, kind, &location_id)
                .map(ActionResult::Built),
            GameAction::Trade { offer, want } => {
                self.bank_trade(player, offer, want)?;
                Ok(ActionResult::Traded { offer, want })
            }
            GameAction::BuyDevCard => self
                .buy_dev_card(player)
                .map(|card| ActionResult::DevCardBought { card }),
            GameAction::PlayDevCard(play) => self
                .play_dev_card(player, play)
                .map(ActionResult::DevCardPlayed),
            GameAction::EndTurn => {
                self.end_turn()?;
                Ok(ActionResult::TurnEnded {
                    next_player: self.active_player_index as PlayerId,
                    turn_count: self.turn_count,
                })
            }
        }
    }

    // ==================== Dice ====================

    /// Roll two dice and resolve the result
    pub fn roll_dice<R: Rng>(
        &mut self,
        rng: &mut R,
        modifiers: Option<&EnvironmentalModifiers>,
    ) -> Result<RollOutcome, GameError> {
        self.check_can_roll()?;
        let dice = [rng.gen_range(1..=6), rng.gen_range(1..=6)];
        self.apply_roll(dice, rng, modifiers)
    }

    /// Resolve a known pair of dice: production, or the discard on a 7
    pub fn apply_roll<R: Rng>(
        &mut self,
        dice: [u8; 2],
        rng: &mut R,
        modifiers: Option<&EnvironmentalModifiers>,
    ) -> Result<RollOutcome, GameError> {
        self.check_can_roll()?;
        if dice.iter().any(|die| !(1..=6).contains(die)) {
            return Err(GameError::payload(format!("dice out of range: {dice:?}")));
        }
        let total = dice[0] + dice[1];

        let (production, discarded) = if total == 7 {
            (ProductionReport::new(), self.discard_half(rng))
        } else {
            (self.resolve_production(total, modifiers), BTreeMap::new())
        };

        self.last_roll = Some(dice);
        self.environment = modifiers.cloned();
        self.phase = TurnPhase::Main;

        tracing::debug!(
            game_id = %self.game_id,
            player = self.active_player_index,
            total,
            "dice rolled"
        );

        Ok(RollOutcome {
            dice,
            total,
            production,
            discarded,
        })
    }

    fn check_can_roll(&self) -> Result<(), GameError> {
        match self.phase {
            TurnPhase::Setup1 | TurnPhase::Setup2 => Err(GameError::SetupInProgress),
            TurnPhase::Main => Err(GameError::AlreadyRolledThisTurn),
            TurnPhase::Roll => Ok(()),
        }
    }

    /// Every player above the threshold keeps half their cards (rounded down)
    fn discard_half<R: Rng>(&mut self, rng: &mut R) -> BTreeMap<PlayerId, u32> {
        let mut discarded = BTreeMap::new();
        for player in &mut self.players {
            let total = player.resources.total();
            if total <= DISCARD_THRESHOLD {
                continue;
            }
            let keep = total / 2;
            let mut dropped = 0;
            while player.resources.total() > keep {
                if player.resources.remove_random(rng).is_none() {
                    break;
                }
                dropped += 1;
            }
            discarded.insert(player.id, dropped);
        }
        discarded
    }

    // ==================== Turn Management ====================

    /// Pass the turn to the next player
    pub fn end_turn(&mut self) -> Result<(), GameError> {
        match self.phase {
            TurnPhase::Setup1 | TurnPhase::Setup2 => return Err(GameError::SetupInProgress),
            TurnPhase::Roll => return Err(GameError::MustRollFirst),
            TurnPhase::Main => {}
        }

        self.active_player_index = (self.active_player_index + 1) % self.players.len();
        self.turn_count += 1;
        self.phase = TurnPhase::Roll;
        self.last_roll = None;

        tracing::debug!(
            game_id = %self.game_id,
            next_player = self.active_player_index,
            turn = self.turn_count,
            "turn ended"
        );
        Ok(())
    }

    /// Advance setup once the active player has placed both pieces for this round
    pub(crate) fn advance_setup(&mut self) {
        let Some(limit) = self.phase.setup_limit() else {
            return;
        };
        let owner = self.active_player_index as PlayerId;
        let settlements = self.constructions.count(owner, ConstructionKind::Settlement);
        let roads = self.constructions.count(owner, ConstructionKind::Road);
        if settlements < limit || roads < limit {
            return;
        }

        let last = self.players.len() - 1;
        match (self.phase, self.active_player_index) {
            (TurnPhase::Setup1, i) if i < last => self.active_player_index += 1,
            (TurnPhase::Setup1, _) => self.phase = TurnPhase::Setup2,
            (TurnPhase::Setup2, 0) => {
                self.phase = TurnPhase::Roll;
                self.turn_count = 1;
                tracing::info!(game_id = %self.game_id, "setup complete");
            }
            (TurnPhase::Setup2, _) => self.active_player_index -= 1,
            _ => {}
        }
    }

    // ==================== Trading ====================

    /// Trade four of one resource for one of another with the bank
    pub fn bank_trade(
        &mut self,
        player_index: usize,
        offer: Resource,
        want: Resource,
    ) -> Result<(), GameError> {
        match self.phase {
            TurnPhase::Setup1 | TurnPhase::Setup2 => return Err(GameError::SetupInProgress),
            TurnPhase::Roll => return Err(GameError::MustRollFirst),
            TurnPhase::Main => {}
        }
        if offer == want {
            return Err(GameError::InvalidTrade);
        }

        let hand = &mut self.player_mut(player_index)?.resources;
        let have = hand.get(offer);
        if have < BANK_TRADE_RATE {
            return Err(GameError::InsufficientResource {
                resource: offer,
                needed: BANK_TRADE_RATE,
                have,
            });
        }
        hand.remove(offer, BANK_TRADE_RATE);
        hand.add(want, 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::ResourceHand;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn names(n: usize) -> Vec<String> {
        ["Ada", "Bo", "Cy", "Di"][..n].iter().map(|s| s.to_string()).collect()
    }

    fn game_in(phase: TurnPhase) -> GameState {
        let mut game = GameState::new("g", names(3), &mut StdRng::seed_from_u64(1)).unwrap();
        game.phase = phase;
        if !phase.is_setup() {
            game.turn_count = 1;
        }
        game
    }

    #[test]
    fn test_new_game_starts_in_setup() {
        let game = game_in(TurnPhase::Setup1);
        assert_eq!(game.active_player_index, 0);
        assert_eq!(game.turn_count, 0);
        assert_eq!(game.dev_deck.len(), 25);
        assert!(game.constructions.is_empty());
        assert_eq!(Some(game.robber_tile), game.board.desert().map(|t| t.coord));
    }

    #[test]
    fn test_player_count_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            GameState::new("g", names(1), &mut rng).unwrap_err(),
            GameError::InvalidPlayerCount { count: 1 }
        );
        assert!(GameState::new("g", names(4), &mut rng).is_ok());
    }

    #[test]
    fn test_phase_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&TurnPhase::Setup1).unwrap(),
            "\"setup_1\""
        );
        assert_eq!(serde_json::to_string(&TurnPhase::Main).unwrap(), "\"main\"");
    }

    #[test]
    fn test_roll_moves_to_main() {
        let mut game = game_in(TurnPhase::Roll);
        let mut rng = StdRng::seed_from_u64(9);

        let outcome = game.roll_dice(&mut rng, None).unwrap();
        assert!((2..=12).contains(&outcome.total));
        assert_eq!(game.phase, TurnPhase::Main);
        assert_eq!(game.last_roll, Some(outcome.dice));

        assert_eq!(
            game.roll_dice(&mut rng, None).unwrap_err(),
            GameError::AlreadyRolledThisTurn
        );
    }

    #[test]
    fn test_roll_during_setup_is_rejected() {
        let mut game = game_in(TurnPhase::Setup2);
        let err = game.roll_dice(&mut StdRng::seed_from_u64(1), None).unwrap_err();
        assert_eq!(err, GameError::SetupInProgress);
    }

    #[test]
    fn test_seven_halves_large_hands() {
        let mut game = game_in(TurnPhase::Roll);
        game.players[0].resources = ResourceHand::with_amounts(2, 2, 2, 2, 1);
        game.players[1].resources = ResourceHand::with_amounts(7, 0, 0, 0, 0);
        game.players[2].resources = ResourceHand::with_amounts(8, 0, 0, 0, 0);

        let outcome = game
            .apply_roll([3, 4], &mut StdRng::seed_from_u64(5), None)
            .unwrap();

        assert_eq!(game.players[0].resources.total(), 4);
        assert_eq!(game.players[1].resources.total(), 7);
        assert_eq!(game.players[2].resources.total(), 4);
        assert_eq!(outcome.discarded, BTreeMap::from([(0, 5), (2, 4)]));
        assert!(outcome.production.is_empty());
        assert_eq!(game.phase, TurnPhase::Main);
    }

    #[test]
    fn test_dice_out_of_range_rejected() {
        let mut game = game_in(TurnPhase::Roll);
        let before = game.clone();
        for dice in [[0, 3], [7, 1], [200, 200]] {
            let err = game
                .apply_roll(dice, &mut StdRng::seed_from_u64(2), None)
                .unwrap_err();
            assert_eq!(err.kind(), "invalid_payload");
        }
        assert_eq!(game, before);
    }

    #[test]
    fn test_end_turn_rotates_players() {
        let mut game = game_in(TurnPhase::Roll);
        assert_eq!(game.end_turn().unwrap_err(), GameError::MustRollFirst);

        game.phase = TurnPhase::Main;
        game.active_player_index = 2;
        game.end_turn().unwrap();

        assert_eq!(game.active_player_index, 0);
        assert_eq!(game.turn_count, 2);
        assert_eq!(game.phase, TurnPhase::Roll);
    }

    #[test]
    fn test_bank_trade() {
        let mut game = game_in(TurnPhase::Main);
        game.players[0].resources = ResourceHand::with_amounts(5, 0, 0, 0, 0);

        game.bank_trade(0, Resource::Wood, Resource::Ore).unwrap();
        assert_eq!(
            game.players[0].resources,
            ResourceHand::with_amounts(1, 0, 0, 0, 1)
        );

        assert_eq!(
            game.bank_trade(0, Resource::Wood, Resource::Ore).unwrap_err(),
            GameError::InsufficientResource {
                resource: Resource::Wood,
                needed: 4,
                have: 1
            }
        );
        assert_eq!(
            game.bank_trade(0, Resource::Ore, Resource::Ore).unwrap_err(),
            GameError::InvalidTrade
        );
    }

    #[test]
    fn test_trade_before_roll() {
        let mut game = game_in(TurnPhase::Roll);
        assert_eq!(
            game.bank_trade(0, Resource::Wood, Resource::Ore).unwrap_err(),
            GameError::MustRollFirst
        );
    }

    #[test]
    fn test_failed_action_leaves_state_untouched() {
        let mut game = game_in(TurnPhase::Main);
        game.players[0].resources = ResourceHand::with_amounts(3, 0, 0, 0, 0);
        let before = game.clone();

        let err = game
            .apply_action(
                GameAction::Trade {
                    offer: Resource::Wood,
                    want: Resource::Brick,
                },
                &mut StdRng::seed_from_u64(1),
                None,
            )
            .unwrap_err();

        assert_eq!(err.kind(), "insufficient_resource");
        assert_eq!(game, before);
    }

    #[test]
    fn test_error_kind_and_message() {
        let err = GameError::from(ParseLocationError("x".into()));
        assert_eq!(err.kind(), "invalid_location");
        assert_eq!(err.to_string(), "invalid location `x`");
    }
}
