//! Player state and resource management.
//!
//! This module contains:
//! - Player struct with score, resources, and development cards
//! - ResourceHand for managing resource counts
//! - Development card types and deck creation
//! - Construction costs

use crate::board::{ConstructionKind, PlayerId, Resource};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Player color for UI rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    Red,
    Blue,
    Orange,
    White,
}

impl PlayerColor {
    /// Get color for a player index
    pub fn for_player(id: PlayerId) -> Self {
        match id % 4 {
            0 => PlayerColor::Red,
            1 => PlayerColor::Blue,
            2 => PlayerColor::Orange,
            _ => PlayerColor::White,
        }
    }
}

/// A hand of resources
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHand {
    pub wood: u32,
    pub brick: u32,
    pub sheep: u32,
    pub wheat: u32,
    pub ore: u32,
}

impl ResourceHand {
    /// Create an empty hand
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hand with specific amounts
    pub fn with_amounts(wood: u32, brick: u32, sheep: u32, wheat: u32, ore: u32) -> Self {
        Self {
            wood,
            brick,
            sheep,
            wheat,
            ore,
        }
    }

    /// Total number of resource cards
    pub fn total(&self) -> u32 {
        self.wood + self.brick + self.sheep + self.wheat + self.ore
    }

    /// Check if hand is empty
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Get count of a specific resource
    pub fn get(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Wood => self.wood,
            Resource::Brick => self.brick,
            Resource::Sheep => self.sheep,
            Resource::Wheat => self.wheat,
            Resource::Ore => self.ore,
        }
    }

    fn slot(&mut self, resource: Resource) -> &mut u32 {
        match resource {
            Resource::Wood => &mut self.wood,
            Resource::Brick => &mut self.brick,
            Resource::Sheep => &mut self.sheep,
            Resource::Wheat => &mut self.wheat,
            Resource::Ore => &mut self.ore,
        }
    }

    /// Add resources to hand
    pub fn add(&mut self, resource: Resource, amount: u32) {
        *self.slot(resource) += amount;
    }

    /// Remove up to `amount` of a resource, returning how many were removed
    pub fn remove(&mut self, resource: Resource, amount: u32) -> u32 {
        let slot = self.slot(resource);
        let removed = amount.min(*slot);
        *slot -= removed;
        removed
    }

    /// Empty one resource slot, returning what it held
    pub fn take_all(&mut self, resource: Resource) -> u32 {
        std::mem::take(self.slot(resource))
    }

    /// Non-zero entries in resource order
    pub fn iter(&self) -> impl Iterator<Item = (Resource, u32)> + '_ {
        Resource::ALL
            .into_iter()
            .map(|r| (r, self.get(r)))
            .filter(|&(_, n)| n > 0)
    }

    /// Check if can afford a cost
    pub fn can_afford(&self, cost: &ResourceHand) -> bool {
        self.first_shortfall(cost).is_none()
    }

    /// The first resource (in resource order) this hand lacks for a cost,
    /// as `(resource, needed, have)`
    pub fn first_shortfall(&self, cost: &ResourceHand) -> Option<(Resource, u32, u32)> {
        Resource::ALL
            .into_iter()
            .map(|r| (r, cost.get(r), self.get(r)))
            .find(|&(_, needed, have)| have < needed)
    }

    /// Subtract a cost; callers check `can_afford` first, counts never go below zero
    pub fn subtract(&mut self, cost: &ResourceHand) {
        for resource in Resource::ALL {
            self.remove(resource, cost.get(resource));
        }
    }

    /// Remove one card chosen uniformly from the whole hand
    pub fn remove_random<R: Rng>(&mut self, rng: &mut R) -> Option<Resource> {
        let total = self.total();
        if total == 0 {
            return None;
        }

        let mut pick = rng.gen_range(0..total);
        for resource in Resource::ALL {
            let held = self.get(resource);
            if pick < held {
                self.remove(resource, 1);
                return Some(resource);
            }
            pick -= held;
        }
        None
    }
}

/// Construction costs
pub mod costs {
    use super::ResourceHand;
    use crate::board::ConstructionKind;

    /// Cost to build a road: 1 wood, 1 brick
    pub fn road() -> ResourceHand {
        ResourceHand::with_amounts(1, 1, 0, 0, 0)
    }

    /// Cost to build a settlement: 1 wood, 1 brick, 1 sheep, 1 wheat
    pub fn settlement() -> ResourceHand {
        ResourceHand::with_amounts(1, 1, 1, 1, 0)
    }

    /// Cost to upgrade to city: 2 wheat, 3 ore
    pub fn city() -> ResourceHand {
        ResourceHand::with_amounts(0, 0, 0, 2, 3)
    }

    /// Cost to buy a development card: 1 sheep, 1 wheat, 1 ore
    pub fn development_card() -> ResourceHand {
        ResourceHand::with_amounts(0, 0, 1, 1, 1)
    }

    pub fn for_construction(kind: ConstructionKind) -> ResourceHand {
        match kind {
            ConstructionKind::Road => road(),
            ConstructionKind::Settlement => settlement(),
            ConstructionKind::City => city(),
        }
    }
}

/// Development card types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevCardKind {
    /// Counts toward Largest Army
    Knight,
    /// Worth 1 VP once played; playable the turn it is bought
    VictoryPoint,
    /// Build 2 roads for free
    RoadBuilding,
    /// Take any 2 resources from the bank
    YearOfPlenty,
    /// All other players give you all of one resource type
    Monopoly,
}

impl DevCardKind {
    /// Create the standard development card deck (25 cards), unshuffled
    pub fn standard_deck() -> Vec<DevCardKind> {
        let mut deck = Vec::with_capacity(25);
        deck.extend(std::iter::repeat(DevCardKind::Knight).take(14));
        deck.extend(std::iter::repeat(DevCardKind::VictoryPoint).take(5));
        deck.extend(std::iter::repeat(DevCardKind::RoadBuilding).take(2));
        deck.extend(std::iter::repeat(DevCardKind::YearOfPlenty).take(2));
        deck.extend(std::iter::repeat(DevCardKind::Monopoly).take(2));
        deck
    }

    /// The standard deck, shuffled once; drawn from the front
    pub fn shuffled_deck<R: Rng>(rng: &mut R) -> VecDeque<DevCardKind> {
        let mut deck = Self::standard_deck();
        deck.shuffle(rng);
        deck.into()
    }
}

/// A development card held by a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevCard {
    pub kind: DevCardKind,
    /// Turn counter value when the card was bought
    pub bought_turn: u32,
    pub played: bool,
}

impl DevCard {
    /// Whether the card may be played during `turn`
    pub fn is_playable_on(&self, turn: u32) -> bool {
        !self.played && (self.kind == DevCardKind::VictoryPoint || self.bought_turn < turn)
    }
}

/// A single player's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Player ID, equal to the player's index
    pub id: PlayerId,
    /// Display name
    pub name: String,
    pub color: PlayerColor,
    /// Points from buildings and played VP cards; titles are added on query
    pub score: u32,
    /// Current resources
    pub resources: ResourceHand,
    pub dev_cards: Vec<DevCard>,
    /// Number of knights played (for Largest Army)
    pub knights_played: u32,
}

impl Player {
    /// Create a new player
    pub fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            color: PlayerColor::for_player(id),
            score: 0,
            resources: ResourceHand::new(),
            dev_cards: Vec::new(),
            knights_played: 0,
        }
    }

    /// Index of a card of `kind` that may be played during `turn`
    pub fn playable_card(&self, kind: DevCardKind, turn: u32) -> Option<usize> {
        self.dev_cards
            .iter()
            .position(|c| c.kind == kind && c.is_playable_on(turn))
    }

    /// Construction kinds the player can currently pay for
    pub fn affordable(&self) -> Vec<ConstructionKind> {
        [
            ConstructionKind::City,
            ConstructionKind::Settlement,
            ConstructionKind::Road,
        ]
        .into_iter()
        .filter(|&kind| self.resources.can_afford(&costs::for_construction(kind)))
        .collect()
    }
}
