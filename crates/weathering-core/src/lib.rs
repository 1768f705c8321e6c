//! Weathering - a weather-perturbed Catan rules engine
//!
//! This crate provides the core game logic, including:
//! - Hex coordinate system with canonical vertex and edge ids
//! - Board generation with tiles and number tokens
//! - Placement rules, resource production and the turn state machine
//! - Development cards, longest road, largest army and the win check
//! - Environmental modifiers that shift production with the weather
//!
//! # Architecture
//!
//! `GameState` is the aggregate root; every rules operation is a method on it
//! and either fully applies or leaves the state untouched. `GameService`
//! wraps the engine in a load → apply → save unit of work over a
//! `GameRepository`, and `GreedyBot` plays seats through the same action API
//! a human client uses.
//!
//! # Modules
//!
//! - [`hex`]: Coordinate system for hex tiles, vertices, and edges
//! - [`board`]: Tiles, resources and constructions
//! - [`player`]: Player state, resources, costs and development cards
//! - [`game`]: Game state machine and errors
//! - [`placement`], [`production`], [`dev_cards`], [`scoring`]: the rules
//! - [`weather`]: Environmental modifiers
//! - [`actions`]: Action surface and results
//! - [`repository`], [`service`]: Storage contract and the per-action unit of work
//! - [`bot`]: Greedy AI player

pub mod actions;
pub mod board;
pub mod bot;
pub mod dev_cards;
pub mod game;
pub mod hex;
pub mod placement;
pub mod player;
pub mod production;
pub mod repository;
pub mod scoring;
pub mod service;
pub mod weather;

// Re-export commonly used types
pub use actions::{ActionOutcome, ActionResult, GameAction};
pub use board::{
    Board, Construction, ConstructionKind, Constructions, PlayerId, Resource, Site, Tile, TileType,
};
pub use bot::GreedyBot;
pub use dev_cards::{DevCardEffect, DevCardPlay};
pub use game::{GameError, GameId, GameState, RollOutcome, TurnPhase};
pub use hex::{
    EdgeDirection, EdgeId, EdgeRef, HexCoord, ParseLocationError, VertexDirection, VertexId,
    VertexRef,
};
pub use placement::BuildOutcome;
pub use player::{DevCard, DevCardKind, Player, PlayerColor, ResourceHand};
pub use production::ProductionReport;
pub use repository::{GameRepository, MemoryRepository};
pub use scoring::WinCheck;
pub use service::{ActionResponse, AiStep, GameService};
pub use weather::{Buff, BuffKind, EnvironmentProvider, EnvironmentalModifiers, FixedEnvironment};
