//! Integration tests for the Weathering rules engine.
//!
//! These tests drive the engine through its public API only: setup order,
//! placement rules, production, cards, titles and whole bot-played games.

use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeMap, HashSet};
use weathering_core::hex::{all_edges, all_vertices, board_hexes};
use weathering_core::player::costs;
use weathering_core::*;

fn new_game(players: usize, seed: u64) -> GameState {
    let names = (0..players).map(|i| format!("Player {i}")).collect();
    GameState::new("it", names, &mut StdRng::seed_from_u64(seed)).unwrap()
}

fn build(kind: ConstructionKind, location_id: &str) -> GameAction {
    GameAction::Build {
        kind,
        location_id: location_id.to_string(),
    }
}

/// Play the whole setup with the greedy bot, returning the seat of every
/// settlement placement in order
fn complete_setup(game: &mut GameState, rng: &mut StdRng) -> Vec<usize> {
    let bot = GreedyBot::all_seats();
    let mut settlement_seats = Vec::new();

    for _ in 0..100 {
        if !game.phase.is_setup() {
            break;
        }
        let seat = game.active_player_index;
        let action = bot.choose_action(game).expect("bot always finds a setup move");
        if matches!(
            action,
            GameAction::Build {
                kind: ConstructionKind::Settlement,
                ..
            }
        ) {
            settlement_seats.push(seat);
        }
        game.apply_action(action, rng, None).unwrap();
    }

    assert!(!game.phase.is_setup(), "setup should finish");
    settlement_seats
}

/// A fixed board: centre wood-8, everything else brick-3 except a desert
fn fixed_board() -> Board {
    let mut tiles: Vec<Tile> = board::STANDARD_LAYOUT
        .iter()
        .map(|&c| Tile::new_resource(c, Resource::Brick, 3))
        .collect();
    tiles[0] = Tile::new_resource(HexCoord::new(0, 0), Resource::Wood, 8);
    tiles[18] = Tile::desert(HexCoord::new(1, 1));
    Board::from_tiles(tiles)
}

fn main_phase(mut game: GameState) -> GameState {
    game.phase = TurnPhase::Main;
    game.turn_count = 1;
    game.active_player_index = 0;
    game
}

#[test]
fn test_setup_snake_order_four_players() {
    let mut game = new_game(4, 1);
    let mut rng = StdRng::seed_from_u64(1);

    let seats = complete_setup(&mut game, &mut rng);

    assert_eq!(seats, vec![0, 1, 2, 3, 3, 2, 1, 0]);
    assert_eq!(game.phase, TurnPhase::Roll);
    assert_eq!(game.active_player_index, 0);
    assert_eq!(game.turn_count, 1);
    for player in &game.players {
        assert_eq!(player.score, 2);
        assert_eq!(game.constructions.count(player.id, ConstructionKind::Road), 2);
    }
}

#[test]
fn test_canonical_ids_are_consistent_over_the_board() {
    let vertices = all_vertices();
    let edges = all_edges();
    assert_eq!(vertices.len(), 54);
    assert_eq!(edges.len(), 72);

    for hex in board_hexes() {
        for corner in VertexDirection::ALL {
            let raw = VertexRef::new(hex, corner);
            let id = raw.canonical().unwrap();
            assert_eq!(id.raw().canonical(), Some(id), "idempotent for {raw}");
            for eq in raw.equivalents() {
                if eq.hex.is_on_board() {
                    assert_eq!(eq.canonical(), Some(id), "{eq} and {raw} disagree");
                }
            }
        }
    }

    for edge in &edges {
        for endpoint in edge.endpoints() {
            assert!(endpoint.attached_edges().contains(edge));
        }
    }
    let total_incidences: usize = vertices.iter().map(|v| v.attached_edges().len()).sum();
    assert_eq!(total_incidences, 2 * edges.len());
}

#[test]
fn test_distance_rule_applies_to_every_neighbor() {
    for vertex in all_vertices() {
        let mut game = new_game(2, 2);
        game.build(0, ConstructionKind::Settlement, &vertex.to_string())
            .unwrap();

        for neighbor in vertex.neighbor_vertices() {
            assert_eq!(
                game.can_build(1, ConstructionKind::Settlement, &neighbor.to_string()),
                Err(GameError::TooCloseToAnotherBuilding),
                "{neighbor} next to {vertex}"
            );
        }
    }
}

#[test]
fn test_occupancy_through_a_different_raw_id() {
    let mut game = new_game(2, 3);
    let mut rng = StdRng::seed_from_u64(3);
    game.apply_action(build(ConstructionKind::Settlement, "0_0_v_0"), &mut rng, None)
        .unwrap();
    game.apply_action(build(ConstructionKind::Road, "0_0_e_0"), &mut rng, None)
        .unwrap();

    // Player 1 names the same corner and side from neighbouring hexes
    assert_eq!(
        game.apply_action(build(ConstructionKind::Settlement, "1_-1_v_4"), &mut rng, None)
            .unwrap_err(),
        GameError::LocationOccupied
    );
    assert_eq!(
        game.apply_action(build(ConstructionKind::Road, "1_-1_e_3"), &mut rng, None)
            .unwrap_err(),
        GameError::LocationOccupied
    );
}

#[test]
fn test_city_on_wood_eight() {
    let mut game = main_phase(new_game(2, 4));
    game.board = fixed_board();
    let mut rng = StdRng::seed_from_u64(4);

    game.constructions.insert(Construction {
        kind: ConstructionKind::Settlement,
        site: placement::resolve_site(ConstructionKind::Settlement, "0_0_v_3").unwrap(),
        raw_location: "0_0_v_3".into(),
        owner: 0,
    });
    game.players[0].score = 1;
    game.players[0].resources = costs::city();

    game.apply_action(build(ConstructionKind::City, "0_1_v_5"), &mut rng, None)
        .unwrap();
    assert_eq!(game.players[0].score, 2);
    assert!(game.players[0].resources.is_empty());

    game.phase = TurnPhase::Roll;
    let outcome = game.apply_roll([5, 3], &mut rng, None).unwrap();

    assert_eq!(
        outcome.production,
        BTreeMap::from([(0, BTreeMap::from([(Resource::Wood, 2)]))])
    );
    assert_eq!(game.players[0].resources.wood, 2);
}

#[test]
fn test_rain_adds_to_every_wood_tile() {
    let mut game = main_phase(new_game(2, 5));
    game.board = fixed_board();
    game.phase = TurnPhase::Roll;
    game.constructions.insert(Construction {
        kind: ConstructionKind::City,
        site: placement::resolve_site(ConstructionKind::City, "0_0_v_3").unwrap(),
        raw_location: "0_0_v_3".into(),
        owner: 1,
    });
    let rain = EnvironmentalModifiers::from_conditions("Thunderstorm", 17.5);

    let outcome = game
        .apply_roll([6, 2], &mut StdRng::seed_from_u64(5), Some(&rain))
        .unwrap();

    assert_eq!(outcome.production[&1][&Resource::Wood], 4);
    assert_eq!(game.environment, Some(rain));
}

#[test]
fn test_seven_discard_nine_to_four() {
    let mut game = new_game(2, 6);
    game.phase = TurnPhase::Roll;
    game.turn_count = 1;
    game.players[0].resources = ResourceHand::with_amounts(3, 2, 2, 1, 1);

    let outcome = game
        .apply_roll([1, 6], &mut StdRng::seed_from_u64(6), None)
        .unwrap();

    assert_eq!(game.players[0].resources.total(), 4);
    assert_eq!(outcome.discarded.get(&0), Some(&5));
    assert!(outcome.production.is_empty());
}

#[test]
fn test_cost_conservation() {
    let mut game = main_phase(new_game(2, 7));
    let mut rng = StdRng::seed_from_u64(7);
    game.constructions.insert(Construction {
        kind: ConstructionKind::Road,
        site: placement::resolve_site(ConstructionKind::Road, "0_0_e_0").unwrap(),
        raw_location: "0_0_e_0".into(),
        owner: 0,
    });
    game.players[0].resources = ResourceHand::with_amounts(2, 3, 1, 4, 5);
    let before = game.players[0].resources.clone();

    game.apply_action(build(ConstructionKind::Settlement, "0_0_v_1"), &mut rng, None)
        .unwrap();

    let after = &game.players[0].resources;
    let cost = costs::settlement();
    for resource in Resource::ALL {
        assert_eq!(before.get(resource) - after.get(resource), cost.get(resource));
    }
    assert_eq!(before.total() - after.total(), 4);
}

#[test]
fn test_monopoly_action() {
    let mut game = main_phase(new_game(3, 8));
    let mut rng = StdRng::seed_from_u64(8);
    game.players[0].dev_cards.push(DevCard {
        kind: DevCardKind::Monopoly,
        bought_turn: 0,
        played: false,
    });
    game.players[0].resources.ore = 3;
    game.players[1].resources.ore = 5;
    game.players[2].resources.ore = 0;

    let outcome = game
        .apply_action(
            GameAction::PlayDevCard(DevCardPlay::Monopoly {
                resource: Resource::Ore,
            }),
            &mut rng,
            None,
        )
        .unwrap();

    assert!(matches!(
        outcome.result,
        ActionResult::DevCardPlayed(DevCardEffect::Monopoly { collected: 5, .. })
    ));
    let ore: Vec<u32> = game.players.iter().map(|p| p.resources.ore).collect();
    assert_eq!(ore, vec![8, 0, 0]);
}

#[test]
fn test_longest_road_title_via_actions() {
    let mut game = main_phase(new_game(2, 9));
    let mut rng = StdRng::seed_from_u64(9);
    game.constructions.insert(Construction {
        kind: ConstructionKind::Settlement,
        site: placement::resolve_site(ConstructionKind::Settlement, "0_0_v_0").unwrap(),
        raw_location: "0_0_v_0".into(),
        owner: 0,
    });
    game.players[0].score = 1;
    game.players[0].resources = ResourceHand::with_amounts(5, 5, 0, 0, 0);

    let mut last = None;
    for side in 0..5 {
        let outcome = game
            .apply_action(
                build(ConstructionKind::Road, &format!("0_0_e_{side}")),
                &mut rng,
                None,
            )
            .unwrap();
        last = Some(outcome);
    }

    let outcome = last.unwrap();
    assert_eq!(game.longest_road_for_player(0), 5);
    assert_eq!(game.longest_road_holder, Some(0));
    assert_eq!(outcome.win.scores[0], 3);
    assert!(game.players[0].resources.is_empty());
}

#[test]
fn test_turn_cycle_through_actions() {
    let mut game = new_game(3, 10);
    let mut rng = StdRng::seed_from_u64(10);
    complete_setup(&mut game, &mut rng);

    assert_eq!(
        game.apply_action(GameAction::EndTurn, &mut rng, None).unwrap_err(),
        GameError::MustRollFirst
    );
    let rolled = game.apply_action(GameAction::RollDice, &mut rng, None).unwrap();
    assert!(matches!(rolled.result, ActionResult::Rolled(_)));
    assert_eq!(
        game.apply_action(GameAction::RollDice, &mut rng, None).unwrap_err(),
        GameError::AlreadyRolledThisTurn
    );

    let ended = game.apply_action(GameAction::EndTurn, &mut rng, None).unwrap();
    assert_eq!(
        ended.result,
        ActionResult::TurnEnded {
            next_player: 1,
            turn_count: 2
        }
    );
}

#[test]
fn test_bot_games_stay_consistent() {
    for seed in 0..4 {
        let mut game = new_game(4, seed);
        let mut rng = StdRng::seed_from_u64(seed);
        let bot = GreedyBot::all_seats();

        for _ in 0..3000 {
            let Some(action) = bot.choose_action(&game) else {
                break;
            };
            let outcome = game.apply_action(action, &mut rng, None).unwrap();
            if outcome.win.over {
                break;
            }
        }

        let sites: HashSet<Site> = game.constructions.iter().map(|c| c.site).collect();
        assert_eq!(sites.len(), game.constructions.len(), "one construction per site");

        for player in &game.players {
            let building_points: u32 = game
                .constructions
                .iter()
                .filter(|c| c.owner == player.id)
                .map(|c| c.kind.victory_points())
                .sum();
            assert_eq!(player.score, building_points, "seed {seed}");
        }

        for construction in game.constructions.iter() {
            if let Site::Vertex(v) = construction.site {
                assert!(game.constructions.satisfies_distance_rule(&v));
            }
        }
    }
}

#[test]
fn test_service_round_trip_through_repository() {
    let service = GameService::new(
        MemoryRepository::new(),
        std::sync::Arc::new(FixedEnvironment(None)),
        Some(11),
    )
    .with_bot(GreedyBot::all_seats());
    service
        .create_game("svc", vec!["A".into(), "B".into(), "C".into()])
        .unwrap();

    let mut version = 0;
    for _ in 0..12 {
        match service.ai_step("svc").unwrap() {
            AiStep::Acted { response, .. } => {
                assert_eq!(response.state.version, version + 1);
                version = response.state.version;
            }
            AiStep::Waiting { .. } => panic!("every seat is a bot"),
        }
    }

    let state = service.load("svc").unwrap();
    assert_eq!(state.version, version);
    assert_eq!(state.phase, TurnPhase::Roll);
}
