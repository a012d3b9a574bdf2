//! End-to-end mining lines: miner -> belts -> chest.
//!
//! These scenarios drive the engine only through its public surface
//! (place/remove/tick and the snapshot accessors), the way an embedding
//! game client would.

use smeltworks_core::building::BuildingKind;
use smeltworks_core::grid::{Direction, GridPosition};
use smeltworks_core::item::ItemKind;
use smeltworks_core::terrain::TerrainKind;
use smeltworks_core::test_utils::*;

#[test]
fn iron_line_delivers_one_token_end_to_end() {
    let mut engine = engine_with_ore(&[(0, 0, TerrainKind::IronOre)]);
    assert!(engine.place(0, 0, BuildingKind::Miner, None));
    place_belt_line(&mut engine, 1, 0, Direction::Right, 2);
    assert!(engine.place(3, 0, BuildingKind::Chest, None));

    let interval = engine.config().mining_interval;
    run_ticks(&mut engine, interval);
    assert_eq!(engine.total_item_count(), 1);
    assert_eq!(engine.produced(ItemKind::Iron), 1);

    // Three transport steps: miner -> belt, belt -> belt, belt -> chest.
    let cadence = engine.config().belt_move_interval;
    run_ticks(&mut engine, cadence * 3);

    assert_eq!(engine.collected(ItemKind::Iron), 1);
    assert_eq!(engine.total_item_count(), 0);
}

#[test]
fn line_turns_corners() {
    let mut engine = engine_with_ore(&[(5, 5, TerrainKind::CopperOre)]);
    assert!(engine.place(5, 5, BuildingKind::Miner, None));
    // Right two cells, then down two cells, into a chest.
    place_belt_line(&mut engine, 6, 5, Direction::Right, 2);
    place_belt_line(&mut engine, 8, 5, Direction::Down, 2);
    assert!(engine.place(8, 7, BuildingKind::Chest, None));

    let interval = engine.config().mining_interval;
    let cadence = engine.config().belt_move_interval;
    run_ticks(&mut engine, interval + cadence * 5);

    assert_eq!(engine.collected(ItemKind::Copper), 1);
    assert_eq!(engine.total_item_count(), 0);
}

#[test]
fn tokens_accumulate_behind_a_missing_chest() {
    let mut engine = engine_with_ore(&[(0, 0, TerrainKind::Coal)]);
    assert!(engine.place(0, 0, BuildingKind::Miner, None));
    place_belt_line(&mut engine, 1, 0, Direction::Right, 2);

    let interval = engine.config().mining_interval;
    // Two full mining cycles with plenty of transport steps in between.
    run_ticks(&mut engine, interval * 2 + 60);

    // Nothing collects them; both tokens are still on the grid, parked on
    // the line's final belt.
    assert_eq!(engine.produced(ItemKind::Coal), 2);
    assert_eq!(engine.collected(ItemKind::Coal), 0);
    assert_eq!(engine.total_item_count(), 2);
    assert_eq!(engine.items.items_at(GridPosition::new(2, 0)).len(), 2);
}

#[test]
fn removing_a_belt_drops_tokens_onto_open_ground() {
    let mut engine = engine_with_ore(&[(0, 5, TerrainKind::IronOre)]);
    assert!(engine.place(0, 5, BuildingKind::Miner, None));
    place_belt_line(&mut engine, 1, 5, Direction::Right, 3);

    let interval = engine.config().mining_interval;
    let cadence = engine.config().belt_move_interval;
    // The mining interval is a multiple of the cadence, so the emission
    // tick also runs a transport step: the token lands on the first belt.
    run_ticks(&mut engine, interval);
    assert_eq!(engine.items.items_at(GridPosition::new(1, 5)).len(), 1);

    // Tear out the rest of the line under the token's feet.
    assert!(engine.remove(2, 5));
    assert!(engine.remove(3, 5));

    // The token still on the first belt now has no downstream belt, so it
    // stalls there.
    run_ticks(&mut engine, cadence * 2);
    assert_eq!(engine.items.items_at(GridPosition::new(1, 5)).len(), 1);
}

#[test]
fn mining_interval_paces_production() {
    let mut engine = engine_with_ore(&[(0, 0, TerrainKind::IronOre)]);
    assert!(engine.place(0, 0, BuildingKind::Miner, None));

    let interval = engine.config().mining_interval;
    run_ticks(&mut engine, interval * 5);
    assert_eq!(engine.produced(ItemKind::Iron), 5);
}

#[test]
fn two_miners_share_one_line() {
    let mut engine = engine_with_ore(&[
        (0, 0, TerrainKind::IronOre),
        (0, 1, TerrainKind::CopperOre),
    ]);
    assert!(engine.place(0, 0, BuildingKind::Miner, None));
    assert!(engine.place(0, 1, BuildingKind::Miner, None));
    // The top miner feeds right; the bottom miner feeds right into its own
    // belt; both lines merge on a shared down-column into one chest.
    place_belt_line(&mut engine, 1, 0, Direction::Right, 1);
    place_belt_line(&mut engine, 1, 1, Direction::Right, 1);
    place_belt_line(&mut engine, 2, 0, Direction::Down, 3);
    assert!(engine.place(2, 3, BuildingKind::Chest, None));
    // The (2,1) cell of the down-column accepts the bottom line's tokens.

    let interval = engine.config().mining_interval;
    let cadence = engine.config().belt_move_interval;
    run_ticks(&mut engine, interval + cadence * 6);

    assert_eq!(engine.collected(ItemKind::Iron), 1);
    assert_eq!(engine.collected(ItemKind::Copper), 1);
    assert_eq!(engine.total_item_count(), 0);
}

#[test]
fn efficiency_ratios_track_the_line() {
    let mut engine = engine_with_ore(&[(0, 0, TerrainKind::IronOre)]);
    assert!(engine.place(0, 0, BuildingKind::Miner, None));
    assert_eq!(
        smeltworks_stats::miner_active_ratio(&engine.buildings),
        fixed(0.0)
    );

    place_belt_line(&mut engine, 1, 0, Direction::Right, 2);
    assert_eq!(
        smeltworks_stats::miner_active_ratio(&engine.buildings),
        fixed(1.0)
    );

    let interval = engine.config().mining_interval;
    let cadence = engine.config().belt_move_interval;
    run_ticks(&mut engine, interval + cadence);
    // One token on two belts.
    assert_eq!(
        smeltworks_stats::belt_utilization(&engine.items, &engine.buildings),
        fixed(0.5)
    );
}
