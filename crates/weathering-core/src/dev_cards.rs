//! Development cards: buying from the deck and playing card effects.

use crate::board::{PlayerId, Resource};
use crate::game::{GameError, GameState, TurnPhase};
use crate::player::{costs, DevCard, DevCardKind, ResourceHand};
use serde::{Deserialize, Serialize};

/// A card play together with its payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "card", rename_all = "snake_case")]
pub enum DevCardPlay {
    Knight,
    VictoryPoint,
    /// Two edge location ids, placed in order
    RoadBuilding { roads: Vec<String> },
    /// Exactly two resources, repeats allowed
    YearOfPlenty { resources: Vec<Resource> },
    Monopoly { resource: Resource },
}

impl DevCardPlay {
    pub fn kind(&self) -> DevCardKind {
        match self {
            DevCardPlay::Knight => DevCardKind::Knight,
            DevCardPlay::VictoryPoint => DevCardKind::VictoryPoint,
            DevCardPlay::RoadBuilding { .. } => DevCardKind::RoadBuilding,
            DevCardPlay::YearOfPlenty { .. } => DevCardKind::YearOfPlenty,
            DevCardPlay::Monopoly { .. } => DevCardKind::Monopoly,
        }
    }
}

/// The effect a played card had
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "card", rename_all = "snake_case")]
pub enum DevCardEffect {
    Knight { knights_played: u32 },
    VictoryPoint { score: u32 },
    /// Canonical ids of the two roads built
    RoadBuilding { roads: Vec<String> },
    YearOfPlenty { gained: ResourceHand },
    Monopoly {
        resource: Resource,
        collected: u32,
    },
}

impl GameState {
    /// Buy the top card of the deck
    pub fn buy_dev_card(&mut self, player_index: usize) -> Result<DevCardKind, GameError> {
        match self.phase {
            TurnPhase::Setup1 | TurnPhase::Setup2 => return Err(GameError::SetupInProgress),
            TurnPhase::Roll => return Err(GameError::MustRollFirst),
            TurnPhase::Main => {}
        }

        let cost = costs::development_card();
        let turn = self.turn_count;
        let hand = &self.player(player_index)?.resources;
        if let Some((resource, needed, have)) = hand.first_shortfall(&cost) {
            return Err(GameError::InsufficientResource {
                resource,
                needed,
                have,
            });
        }

        let kind = self.dev_deck.pop_front().ok_or(GameError::DeckExhausted)?;
        let player = self.player_mut(player_index)?;
        player.resources.subtract(&cost);
        player.dev_cards.push(DevCard {
            kind,
            bought_turn: turn,
            played: false,
        });

        tracing::debug!(game_id = %self.game_id, player = player_index, ?kind, "card bought");
        Ok(kind)
    }

    /// Play a development card.
    ///
    /// The payload is validated and the effect applied before the card is
    /// marked played; on error nothing changes.
    pub fn play_dev_card(
        &mut self,
        player_index: usize,
        play: DevCardPlay,
    ) -> Result<DevCardEffect, GameError> {
        if self.phase.is_setup() {
            return Err(GameError::SetupInProgress);
        }

        let kind = play.kind();
        let card_index = self
            .player(player_index)?
            .playable_card(kind, self.turn_count)
            .ok_or(GameError::CardNotPlayableThisTurn { card: kind })?;

        let effect = match play {
            DevCardPlay::Knight => {
                let player = self.player_mut(player_index)?;
                player.knights_played += 1;
                DevCardEffect::Knight {
                    knights_played: player.knights_played,
                }
            }
            DevCardPlay::VictoryPoint => {
                let player = self.player_mut(player_index)?;
                player.score += 1;
                DevCardEffect::VictoryPoint {
                    score: player.score,
                }
            }
            DevCardPlay::YearOfPlenty { resources } => {
                if resources.len() != 2 {
                    return Err(GameError::payload(
                        "year of plenty takes exactly two resources",
                    ));
                }
                let mut gained = ResourceHand::new();
                for resource in resources {
                    gained.add(resource, 1);
                }
                let player = self.player_mut(player_index)?;
                for (resource, amount) in gained.iter() {
                    player.resources.add(resource, amount);
                }
                DevCardEffect::YearOfPlenty { gained }
            }
            DevCardPlay::Monopoly { resource } => {
                let owner = self.player(player_index)?.id;
                let collected = self.collect_monopoly(owner, resource);
                self.player_mut(player_index)?
                    .resources
                    .add(resource, collected);
                DevCardEffect::Monopoly {
                    resource,
                    collected,
                }
            }
            DevCardPlay::RoadBuilding { roads } => {
                let roads = self.build_free_roads(player_index, &roads)?;
                DevCardEffect::RoadBuilding { roads }
            }
        };

        let player = self.player_mut(player_index)?;
        if let Some(card) = player.dev_cards.get_mut(card_index) {
            card.played = true;
        }

        tracing::debug!(game_id = %self.game_id, player = player_index, ?kind, "card played");
        Ok(effect)
    }

    fn collect_monopoly(&mut self, owner: PlayerId, resource: Resource) -> u32 {
        self.players
            .iter_mut()
            .filter(|p| p.id != owner)
            .map(|p| p.resources.take_all(resource))
            .sum()
    }

    /// Place both roads or neither
    fn build_free_roads(
        &mut self,
        player_index: usize,
        roads: &[String],
    ) -> Result<Vec<String>, GameError> {
        if roads.len() != 2 {
            return Err(GameError::payload("road building takes exactly two roads"));
        }

        let before = self.constructions.clone();
        let mut placed = Vec::with_capacity(2);
        for raw in roads {
            match self.place_free_road(player_index, raw) {
                Ok(edge) => placed.push(edge.to_string()),
                Err(err) => {
                    self.constructions = before;
                    return Err(err);
                }
            }
        }
        Ok(placed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Construction, ConstructionKind, Site};
    use crate::placement::resolve_site;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn main_game() -> GameState {
        let names = vec!["A".into(), "B".into(), "C".into()];
        let mut game = GameState::new("cards", names, &mut StdRng::seed_from_u64(4)).unwrap();
        game.phase = TurnPhase::Main;
        game.turn_count = 3;
        game
    }

    fn give_card(game: &mut GameState, player: usize, kind: DevCardKind, bought_turn: u32) {
        game.players[player].dev_cards.push(DevCard {
            kind,
            bought_turn,
            played: false,
        });
    }

    #[test]
    fn test_buy_dev_card() {
        let mut game = main_game();
        game.players[0].resources = ResourceHand::with_amounts(0, 0, 1, 1, 1);
        let top = game.dev_deck[0];

        let kind = game.buy_dev_card(0).unwrap();

        assert_eq!(kind, top);
        assert_eq!(game.dev_deck.len(), 24);
        assert!(game.players[0].resources.is_empty());
        assert_eq!(
            game.players[0].dev_cards,
            vec![DevCard {
                kind,
                bought_turn: 3,
                played: false
            }]
        );
    }

    #[test]
    fn test_buy_checks_cost_before_deck() {
        let mut game = main_game();
        game.dev_deck.clear();
        assert_eq!(
            game.buy_dev_card(0).unwrap_err(),
            GameError::InsufficientResource {
                resource: Resource::Sheep,
                needed: 1,
                have: 0
            }
        );

        game.players[0].resources = costs::development_card();
        assert_eq!(game.buy_dev_card(0).unwrap_err(), GameError::DeckExhausted);
        assert_eq!(game.players[0].resources, costs::development_card());
    }

    #[test]
    fn test_buy_before_roll() {
        let mut game = main_game();
        game.phase = TurnPhase::Roll;
        assert_eq!(game.buy_dev_card(0).unwrap_err(), GameError::MustRollFirst);
    }

    #[test]
    fn test_card_not_playable_on_purchase_turn() {
        let mut game = main_game();
        give_card(&mut game, 0, DevCardKind::Knight, 3);
        assert_eq!(
            game.play_dev_card(0, DevCardPlay::Knight).unwrap_err(),
            GameError::CardNotPlayableThisTurn {
                card: DevCardKind::Knight
            }
        );

        game.turn_count = 4;
        let effect = game.play_dev_card(0, DevCardPlay::Knight).unwrap();
        assert_eq!(effect, DevCardEffect::Knight { knights_played: 1 });
        assert!(game.players[0].dev_cards[0].played);
    }

    #[test]
    fn test_knight_playable_before_roll() {
        let mut game = main_game();
        game.phase = TurnPhase::Roll;
        give_card(&mut game, 0, DevCardKind::Knight, 1);
        assert!(game.play_dev_card(0, DevCardPlay::Knight).is_ok());
    }

    #[test]
    fn test_victory_point_same_turn() {
        let mut game = main_game();
        give_card(&mut game, 0, DevCardKind::VictoryPoint, 3);

        game.play_dev_card(0, DevCardPlay::VictoryPoint).unwrap();
        assert_eq!(game.players[0].score, 1);
        assert!(game.play_dev_card(0, DevCardPlay::VictoryPoint).is_err());
    }

    #[test]
    fn test_monopoly_collects_from_everyone() {
        let mut game = main_game();
        give_card(&mut game, 0, DevCardKind::Monopoly, 1);
        game.players[0].resources.wheat = 3;
        game.players[1].resources.wheat = 5;
        game.players[2].resources.wheat = 0;

        let effect = game
            .play_dev_card(
                0,
                DevCardPlay::Monopoly {
                    resource: Resource::Wheat,
                },
            )
            .unwrap();

        assert_eq!(
            effect,
            DevCardEffect::Monopoly {
                resource: Resource::Wheat,
                collected: 5
            }
        );
        let wheat: Vec<u32> = game.players.iter().map(|p| p.resources.wheat).collect();
        assert_eq!(wheat, vec![8, 0, 0]);
    }

    #[test]
    fn test_year_of_plenty_payload() {
        let mut game = main_game();
        give_card(&mut game, 0, DevCardKind::YearOfPlenty, 1);

        let err = game
            .play_dev_card(
                0,
                DevCardPlay::YearOfPlenty {
                    resources: vec![Resource::Ore],
                },
            )
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_payload");
        assert!(!game.players[0].dev_cards[0].played);

        game.play_dev_card(
            0,
            DevCardPlay::YearOfPlenty {
                resources: vec![Resource::Ore, Resource::Ore],
            },
        )
        .unwrap();
        assert_eq!(game.players[0].resources.ore, 2);
        assert!(game.players[0].dev_cards[0].played);
    }

    #[test]
    fn test_road_building_places_both_or_neither() {
        let mut game = main_game();
        give_card(&mut game, 0, DevCardKind::RoadBuilding, 1);
        let site = resolve_site(ConstructionKind::Settlement, "0_0_v_0").unwrap();
        game.constructions.insert(Construction {
            kind: ConstructionKind::Settlement,
            site,
            raw_location: "0_0_v_0".into(),
            owner: 0,
        });

        // Second road is disconnected
        let err = game
            .play_dev_card(
                0,
                DevCardPlay::RoadBuilding {
                    roads: vec!["0_0_e_0".into(), "1_1_e_3".into()],
                },
            )
            .unwrap_err();
        assert_eq!(err, GameError::RoadMustConnect);
        assert_eq!(game.constructions.len(), 1);
        assert!(!game.players[0].dev_cards[0].played);

        // Second road connects through the first
        let effect = game
            .play_dev_card(
                0,
                DevCardPlay::RoadBuilding {
                    roads: vec!["0_0_e_0".into(), "0_0_e_1".into()],
                },
            )
            .unwrap();
        assert_eq!(
            effect,
            DevCardEffect::RoadBuilding {
                roads: vec!["0_0_e_0".into(), "0_0_e_1".into()]
            }
        );
        assert_eq!(game.constructions.count(0, ConstructionKind::Road), 2);
        assert!(game.players[0].resources.is_empty());
        assert!(matches!(
            game.constructions.iter().last().map(|c| c.site),
            Some(Site::Edge(_))
        ));
    }

    #[test]
    fn test_card_play_json_shape() {
        let play: DevCardPlay =
            serde_json::from_str(r#"{"card":"monopoly","resource":"ore"}"#).unwrap();
        assert_eq!(
            play,
            DevCardPlay::Monopoly {
                resource: Resource::Ore
            }
        );
        let knight: DevCardPlay = serde_json::from_str(r#"{"card":"knight"}"#).unwrap();
        assert_eq!(knight.kind(), DevCardKind::Knight);
    }
}
