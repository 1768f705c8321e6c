//! Placement legality and construction.
//!
//! Checks run in a fixed order so that the first failing rule is the one
//! reported: location, occupancy, distance rule, then phase specific rules
//! (setup limits, cost, connectivity).

use crate::board::{Construction, ConstructionKind, PlayerId, Site};
use crate::game::{GameError, GameState, TurnPhase};
use crate::hex::{all_edges, all_vertices, EdgeId, EdgeRef, VertexId, VertexRef};
use crate::player::{costs, ResourceHand};
use serde::{Deserialize, Serialize};

/// Result of a successful build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOutcome {
    pub kind: ConstructionKind,
    /// Canonical id of the site built on
    pub location_id: String,
    /// Starting resources granted by a second setup settlement
    pub granted: ResourceHand,
}

/// Parse a raw location id into the canonical site for a construction kind
pub fn resolve_site(kind: ConstructionKind, location_id: &str) -> Result<Site, GameError> {
    let invalid = || GameError::InvalidLocation {
        location: location_id.to_string(),
    };
    let site = match kind {
        ConstructionKind::Road => location_id
            .parse::<EdgeRef>()?
            .canonical()
            .map(Site::Edge),
        ConstructionKind::Settlement | ConstructionKind::City => location_id
            .parse::<VertexRef>()?
            .canonical()
            .map(Site::Vertex),
    };
    site.ok_or_else(invalid)
}

impl GameState {
    /// Check whether a player may build `kind` at `location_id` right now.
    ///
    /// Returns the canonical site on success.
    pub fn can_build(
        &self,
        player_index: usize,
        kind: ConstructionKind,
        location_id: &str,
    ) -> Result<Site, GameError> {
        let player = self.player(player_index)?;
        let owner = player.id;
        let site = resolve_site(kind, location_id)?;

        self.check_occupancy(owner, kind, &site)?;

        if let (ConstructionKind::Settlement, Site::Vertex(vertex)) = (kind, &site) {
            if !self.constructions.satisfies_distance_rule(vertex) {
                return Err(GameError::TooCloseToAnotherBuilding);
            }
        }

        match self.phase {
            TurnPhase::Setup1 | TurnPhase::Setup2 => self.check_setup_rules(owner, kind, &site)?,
            TurnPhase::Roll => return Err(GameError::MustRollFirst),
            TurnPhase::Main => {
                let cost = costs::for_construction(kind);
                if let Some((resource, needed, have)) = player.resources.first_shortfall(&cost) {
                    return Err(GameError::InsufficientResource {
                        resource,
                        needed,
                        have,
                    });
                }
                self.check_connectivity(owner, &site)?;
            }
        }

        Ok(site)
    }

    fn check_occupancy(
        &self,
        owner: PlayerId,
        kind: ConstructionKind,
        site: &Site,
    ) -> Result<(), GameError> {
        let existing = self.constructions.at(site);
        match (kind, existing) {
            (ConstructionKind::City, Some(c))
                if c.owner == owner && c.kind == ConstructionKind::Settlement =>
            {
                Ok(())
            }
            (ConstructionKind::City, Some(c)) if c.owner != owner => {
                Err(GameError::NotYourConstruction)
            }
            (ConstructionKind::City, _) => Err(GameError::MustUpgradeOwnSettlement),
            (_, Some(_)) => Err(GameError::LocationOccupied),
            (_, None) => Ok(()),
        }
    }

    fn check_setup_rules(
        &self,
        owner: PlayerId,
        kind: ConstructionKind,
        site: &Site,
    ) -> Result<(), GameError> {
        let limit = self.phase.setup_limit().unwrap_or(0);
        match kind {
            ConstructionKind::City => Err(GameError::MustRollFirst),
            ConstructionKind::Settlement | ConstructionKind::Road => {
                if self.constructions.count(owner, kind) >= limit {
                    return Err(GameError::AlreadyPlacedThisRound);
                }
                if kind == ConstructionKind::Road {
                    self.check_connectivity(owner, site)?;
                }
                Ok(())
            }
        }
    }

    fn check_connectivity(&self, owner: PlayerId, site: &Site) -> Result<(), GameError> {
        match site {
            Site::Edge(edge) if !self.road_connected(owner, edge) => {
                Err(GameError::RoadMustConnect)
            }
            Site::Vertex(vertex)
                if self.constructions.building_at(vertex).is_none()
                    && !self.settlement_connected(owner, vertex) =>
            {
                Err(GameError::SettlementMustConnect)
            }
            _ => Ok(()),
        }
    }

    /// A road connects if either endpoint holds the owner's building or
    /// touches another of the owner's roads
    pub fn road_connected(&self, owner: PlayerId, edge: &EdgeId) -> bool {
        edge.endpoints().iter().any(|endpoint| {
            self.constructions.building_owner(endpoint) == Some(owner)
                || endpoint
                    .attached_edges()
                    .iter()
                    .any(|e| e != edge && self.constructions.road_owner(e) == Some(owner))
        })
    }

    /// A settlement connects if one of the owner's roads ends at the vertex
    pub fn settlement_connected(&self, owner: PlayerId, vertex: &VertexId) -> bool {
        vertex
            .attached_edges()
            .iter()
            .any(|e| self.constructions.road_owner(e) == Some(owner))
    }

    /// Validate and place a construction for a player
    pub fn build(
        &mut self,
        player_index: usize,
        kind: ConstructionKind,
        location_id: &str,
    ) -> Result<BuildOutcome, GameError> {
        let site = self.can_build(player_index, kind, location_id)?;
        let phase = self.phase;
        let board = &self.board;
        let player = self
            .players
            .get_mut(player_index)
            .ok_or(GameError::PlayerNotFound {
                index: player_index,
            })?;

        if phase == TurnPhase::Main {
            player.resources.subtract(&costs::for_construction(kind));
        }

        let mut granted = ResourceHand::new();
        if let (TurnPhase::Setup2, ConstructionKind::Settlement, Site::Vertex(vertex)) =
            (phase, kind, &site)
        {
            for hex in vertex.touching_hexes() {
                if let Some(resource) = board.get_tile(&hex).and_then(|t| t.resource()) {
                    granted.add(resource, 1);
                }
            }
            for (resource, amount) in granted.iter() {
                player.resources.add(resource, amount);
            }
        }

        // A city is worth one more point than the settlement it replaces
        player.score += match kind {
            ConstructionKind::Road => 0,
            ConstructionKind::Settlement | ConstructionKind::City => 1,
        };
        let owner = player.id;

        if kind == ConstructionKind::City {
            self.constructions.set_kind(&site, ConstructionKind::City);
        } else {
            self.constructions.insert(Construction {
                kind,
                site,
                raw_location: location_id.trim().to_string(),
                owner,
            });
        }

        tracing::debug!(
            game_id = %self.game_id,
            player = owner,
            ?kind,
            location = %site,
            "construction placed"
        );

        if phase.is_setup() {
            self.advance_setup();
        }

        Ok(BuildOutcome {
            kind,
            location_id: site.to_string(),
            granted,
        })
    }

    /// Place a road without cost or phase checks (Road Building card).
    /// Occupancy and connectivity still apply.
    pub(crate) fn place_free_road(
        &mut self,
        player_index: usize,
        location_id: &str,
    ) -> Result<EdgeId, GameError> {
        let owner = self.player(player_index)?.id;
        let site = resolve_site(ConstructionKind::Road, location_id)?;
        self.check_occupancy(owner, ConstructionKind::Road, &site)?;
        self.check_connectivity(owner, &site)?;

        let Site::Edge(edge) = site else {
            return Err(GameError::InvalidLocation {
                location: location_id.to_string(),
            });
        };
        self.constructions.insert(Construction {
            kind: ConstructionKind::Road,
            site,
            raw_location: location_id.trim().to_string(),
            owner,
        });
        Ok(edge)
    }

    /// Every canonical location where `can_build` currently succeeds
    pub fn legal_locations(&self, player_index: usize, kind: ConstructionKind) -> Vec<String> {
        let candidates: Vec<String> = match kind {
            ConstructionKind::Road => all_edges().iter().map(ToString::to_string).collect(),
            ConstructionKind::Settlement | ConstructionKind::City => {
                all_vertices().iter().map(ToString::to_string).collect()
            }
        };
        candidates
            .into_iter()
            .filter(|id| self.can_build(player_index, kind, id).is_ok())
            .collect()
    }
}
