//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::building::BuildingRegistry;
use crate::config::WorldConfig;
use crate::engine::Engine;
use crate::fixed::{Fixed64, Ticks};
use crate::grid::{Direction, GridPosition};
use crate::item::ItemKind;
use crate::terrain::{Terrain, TerrainKind};

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// World builders
// ===========================================================================

/// An engine over an all-grass default-sized world.
pub fn grass_engine() -> Engine {
    let config = WorldConfig::default();
    let terrain = Terrain::filled(config.width, config.height, TerrainKind::Grass);
    Engine::with_terrain(config, terrain)
}

/// An engine over an all-grass world with the given cells overridden.
pub fn engine_with_ore(ores: &[(i32, i32, TerrainKind)]) -> Engine {
    let config = WorldConfig::default();
    let mut terrain = Terrain::filled(config.width, config.height, TerrainKind::Grass);
    for &(x, y, kind) in ores {
        terrain.set(x, y, kind);
    }
    Engine::with_terrain(config, terrain)
}

// ===========================================================================
// Scenario helpers
// ===========================================================================

/// Run `n` ticks.
pub fn run_ticks(engine: &mut Engine, n: Ticks) {
    for _ in 0..n {
        engine.tick();
    }
}

/// Place `len` belts in a row, starting at `(x, y)` and stepping `dir`,
/// each facing `dir`. Panics if any placement fails.
pub fn place_belt_line(engine: &mut Engine, x: i32, y: i32, dir: Direction, len: i32) {
    let mut pos = GridPosition::new(x, y);
    for _ in 0..len {
        assert!(
            engine.place(pos.x, pos.y, crate::building::BuildingKind::Belt, Some(dir)),
            "belt placement failed at ({}, {})",
            pos.x,
            pos.y
        );
        pos = pos.step(dir);
    }
}

/// Fill the smelter at `(x, y)` with one `ore` and one coal.
pub fn load_smelter(engine: &mut Engine, x: i32, y: i32, ore: ItemKind) {
    let building = engine
        .buildings
        .get_mut(x, y)
        .unwrap_or_else(|| panic!("no building at ({x}, {y})"));
    BuildingRegistry::add_item_to_smelter(building, ore);
    BuildingRegistry::add_item_to_smelter(building, ItemKind::Coal);
}

/// Cloned smelter sub-state of the building at `(x, y)`.
pub fn smelter_state(engine: &Engine, x: i32, y: i32) -> crate::building::SmelterState {
    engine
        .buildings
        .get(x, y)
        .and_then(|b| b.smelter.clone())
        .unwrap_or_else(|| panic!("no smelter at ({x}, {y})"))
}
