//! Resource production for a dice roll.
//!
//! Each tile whose token matches the roll yields `1 + adjustment` cards of its
//! resource (never below zero), where the adjustment is the sum of the
//! environmental buffs targeting that resource. Every settlement on the tile
//! receives the yield once, every city twice.

use crate::board::{PlayerId, Resource, Tile};
use crate::game::GameState;
use crate::weather::EnvironmentalModifiers;
use std::collections::BTreeMap;

/// Resources credited per player for one roll; only non-zero entries appear
pub type ProductionReport = BTreeMap<PlayerId, BTreeMap<Resource, u32>>;

/// Serde adapter writing player-keyed maps as `[player, value]` pairs.
///
/// JSON object keys are strings, and tagged enums buffer their content, so a
/// `u8` key would not survive a round trip.
pub(crate) mod by_player {
    use crate::board::PlayerId;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<V, S>(map: &BTreeMap<PlayerId, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        V: Serialize,
        S: Serializer,
    {
        serializer.collect_seq(map)
    }

    pub fn deserialize<'de, V, D>(deserializer: D) -> Result<BTreeMap<PlayerId, V>, D::Error>
    where
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let entries = Vec::<(PlayerId, V)>::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}

/// Cards a tile yields per settlement, after environmental adjustment
pub fn tile_yield(tile: &Tile, modifiers: Option<&EnvironmentalModifiers>) -> u32 {
    let Some(resource) = tile.resource() else {
        return 0;
    };
    let adjustment = modifiers.map_or(0, |m| m.adjustment_for(resource));
    (1 + adjustment).max(0) as u32
}

impl GameState {
    /// Credit every player for the tiles matching `roll` and report what was given
    pub fn resolve_production(
        &mut self,
        roll: u8,
        modifiers: Option<&EnvironmentalModifiers>,
    ) -> ProductionReport {
        let report = self.production_for(roll, modifiers);

        for (&owner, gains) in &report {
            if let Some(player) = self.players.get_mut(owner as usize) {
                for (&resource, &amount) in gains {
                    player.resources.add(resource, amount);
                }
            }
        }

        tracing::debug!(game_id = %self.game_id, roll, ?report, "production resolved");
        report
    }

    /// What a roll would produce, without crediting anyone
    pub fn production_for(
        &self,
        roll: u8,
        modifiers: Option<&EnvironmentalModifiers>,
    ) -> ProductionReport {
        let mut report = ProductionReport::new();
        if roll == 7 {
            return report;
        }

        for tile in self.board.tiles_with_token(roll) {
            let Some(resource) = tile.resource() else {
                continue;
            };
            let amount = tile_yield(tile, modifiers);
            if amount == 0 {
                continue;
            }

            for vertex in tile.coord.vertices() {
                let Some(building) = self.constructions.building_at(&vertex) else {
                    continue;
                };
                *report
                    .entry(building.owner)
                    .or_default()
                    .entry(resource)
                    .or_insert(0) += amount * building.kind.resource_multiplier();
            }
        }

        report
    }
}
