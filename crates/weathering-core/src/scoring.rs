//! Longest road, largest army and the win check.

use crate::board::PlayerId;
use crate::game::GameState;
use crate::hex::{EdgeId, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Minimum road length for Longest Road
pub const MIN_LONGEST_ROAD: u32 = 5;

/// Minimum knights for Largest Army
pub const MIN_LARGEST_ARMY: u32 = 3;

/// Victory points needed to win
pub const VICTORY_POINTS_TO_WIN: u32 = 10;

/// Points each title is worth
pub const TITLE_BONUS: u32 = 2;

/// Result of the win check run after every action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinCheck {
    pub over: bool,
    pub winner: Option<PlayerId>,
    /// Effective victory points per player, in seat order
    pub scores: Vec<u32>,
}

impl GameState {
    /// Length of the longest simple path through a player's roads
    pub fn longest_road_for_player(&self, owner: PlayerId) -> u32 {
        let roads: BTreeSet<EdgeId> = self.constructions.roads_of(owner).into_iter().collect();

        let mut longest = 0;
        for &root in &roads {
            for tip in root.endpoints() {
                let mut visited = HashSet::from([root]);
                let length = 1 + self.extend_road(owner, &roads, tip, &mut visited);
                longest = longest.max(length);
            }
        }
        longest
    }

    /// DFS from `tip`, counting only edges not yet on the current path
    fn extend_road(
        &self,
        owner: PlayerId,
        roads: &BTreeSet<EdgeId>,
        tip: VertexId,
        visited: &mut HashSet<EdgeId>,
    ) -> u32 {
        // Can't pass through enemy building
        if self
            .constructions
            .building_owner(&tip)
            .is_some_and(|o| o != owner)
        {
            return 0;
        }

        let mut best = 0;
        for next in tip.attached_edges() {
            if !roads.contains(&next) || visited.contains(&next) {
                continue;
            }
            let [a, b] = next.endpoints();
            let far = if a == tip { b } else { a };

            visited.insert(next);
            best = best.max(1 + self.extend_road(owner, roads, far, visited));
            visited.remove(&next);
        }
        best
    }

    /// Move Longest Road to whoever strictly beats the current holder
    pub fn update_longest_road(&mut self) -> Option<PlayerId> {
        let lengths: Vec<u32> = self
            .players
            .iter()
            .map(|p| self.longest_road_for_player(p.id))
            .collect();
        let holder = award_title(self.longest_road_holder, &lengths, MIN_LONGEST_ROAD);

        if holder != self.longest_road_holder {
            tracing::info!(
                game_id = %self.game_id,
                previous = ?self.longest_road_holder,
                current = ?holder,
                "longest road changed"
            );
            self.longest_road_holder = holder;
        }
        holder
    }

    /// Move Largest Army to whoever strictly beats the current holder
    pub fn update_largest_army(&mut self) -> Option<PlayerId> {
        let knights: Vec<u32> = self.players.iter().map(|p| p.knights_played).collect();
        let holder = award_title(self.largest_army_holder, &knights, MIN_LARGEST_ARMY);

        if holder != self.largest_army_holder {
            tracing::info!(
                game_id = %self.game_id,
                previous = ?self.largest_army_holder,
                current = ?holder,
                "largest army changed"
            );
            self.largest_army_holder = holder;
        }
        holder
    }

    /// Score plus title bonuses
    pub fn effective_score(&self, player: PlayerId) -> u32 {
        let Some(p) = self.players.get(player as usize) else {
            return 0;
        };
        let mut points = p.score;
        if self.longest_road_holder == Some(player) {
            points += TITLE_BONUS;
        }
        if self.largest_army_holder == Some(player) {
            points += TITLE_BONUS;
        }
        points
    }

    /// Refresh both titles and report whether someone has reached 10 points
    pub fn check_win_condition(&mut self) -> WinCheck {
        self.update_longest_road();
        self.update_largest_army();

        let scores: Vec<u32> = self
            .players
            .iter()
            .map(|p| self.effective_score(p.id))
            .collect();
        let winner = scores
            .iter()
            .position(|&s| s >= VICTORY_POINTS_TO_WIN)
            .map(|i| i as PlayerId);

        if let Some(winner) = winner {
            tracing::info!(game_id = %self.game_id, winner, "game won");
        }

        WinCheck {
            over: winner.is_some(),
            winner,
            scores,
        }
    }
}

/// Players are checked in seat order; a title needs at least `minimum` and
/// strictly more than the current best, so ties keep the holder.
fn award_title(current: Option<PlayerId>, values: &[u32], minimum: u32) -> Option<PlayerId> {
    let mut holder = current;
    let mut best = current
        .and_then(|h| values.get(h as usize).copied())
        .unwrap_or(0);

    for (index, &value) in values.iter().enumerate() {
        if value >= minimum && value > best {
            holder = Some(index as PlayerId);
            best = value;
        }
    }
    holder
}
