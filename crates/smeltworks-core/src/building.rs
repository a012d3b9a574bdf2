//! Buildings and the building registry.
//!
//! Buildings live in a slotmap arena with a position index on top, so the
//! registry supports both stable iteration and O(log n) tile lookup. At most
//! one building occupies a cell.
//!
//! Transport code dispatches on the capability predicates of
//! [`BuildingKind`] (`is_router`, `is_sink`, `is_processor`) rather than on
//! concrete kinds, so a new kind only has to answer the capability questions
//! to participate in transport.

use crate::fixed::Ticks;
use crate::grid::{Direction, GridPosition};
use crate::item::ItemKind;
use crate::terrain::Terrain;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

slotmap::new_key_type! {
    /// Identifies a placed building.
    pub struct BuildingId;
}

// ---------------------------------------------------------------------------
// Kinds and capabilities
// ---------------------------------------------------------------------------

/// Kind of a placed building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingKind {
    /// Extracts the resource under it on a fixed interval.
    Miner,
    /// Carries tokens one cell downstream per transport step.
    Belt,
    /// Collects arriving tokens into the per-kind counters.
    Chest,
    /// Consumes one ore + one coal, produces a plate.
    Smelter,
}

impl BuildingKind {
    pub fn is_miner(&self) -> bool {
        matches!(self, BuildingKind::Miner)
    }

    /// Routes tokens along its own direction.
    pub fn is_router(&self) -> bool {
        matches!(self, BuildingKind::Belt)
    }

    /// Removes arriving tokens from the grid and tallies them.
    pub fn is_sink(&self) -> bool {
        matches!(self, BuildingKind::Chest)
    }

    /// Consumes arriving tokens into internal slots.
    pub fn is_processor(&self) -> bool {
        matches!(self, BuildingKind::Smelter)
    }
}

// ---------------------------------------------------------------------------
// Buildings
// ---------------------------------------------------------------------------

/// Mutable smelter sub-state. One ore slot (iron or copper, never both) and
/// one coal slot; progress 0 means idle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmelterState {
    pub input_ore: Option<ItemKind>,
    pub input_coal: bool,
    pub progress: Ticks,
    /// Finished plate awaiting ejection onto an adjacent belt.
    pub output: Option<ItemKind>,
}

impl SmelterState {
    /// Actively producing or holding output: the utilization criterion.
    pub fn is_active(&self) -> bool {
        self.progress > 0 || self.output.is_some()
    }
}

/// One placed building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub kind: BuildingKind,
    pub pos: GridPosition,
    /// Tick counter toward the next mining emission. Miners only.
    pub timer: Ticks,
    /// Resource bound at placement from the terrain cell. Miners only.
    pub resource: Option<ItemKind>,
    /// Transport direction. Meaningful for belts; defaults to `Right`
    /// elsewhere.
    pub direction: Direction,
    /// Present iff `kind` is a processor.
    pub smelter: Option<SmelterState>,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// The sparse set of placed buildings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildingRegistry {
    buildings: slotmap::SlotMap<BuildingId, Building>,
    tiles: BTreeMap<GridPosition, BuildingId>,
}

impl BuildingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a building at `(x, y)`.
    ///
    /// Fails without mutation when the cell is occupied or out of bounds,
    /// when a miner targets a non-mineable cell, or when a smelter targets
    /// anything but grass. A belt records `direction` (default `Right`).
    pub fn place(
        &mut self,
        x: i32,
        y: i32,
        kind: BuildingKind,
        terrain: &Terrain,
        direction: Option<Direction>,
    ) -> bool {
        let pos = GridPosition::new(x, y);
        if self.tiles.contains_key(&pos) {
            return false;
        }
        let Some(cell) = terrain.kind_at(x, y) else {
            return false;
        };

        let resource = match kind {
            BuildingKind::Miner => {
                let Some(resource) = cell.resource() else {
                    return false;
                };
                Some(resource)
            }
            BuildingKind::Smelter => {
                if cell.is_mineable() {
                    return false;
                }
                None
            }
            BuildingKind::Belt | BuildingKind::Chest => None,
        };

        let building = Building {
            kind,
            pos,
            timer: 0,
            resource,
            direction: direction.unwrap_or_default(),
            smelter: kind.is_processor().then(SmelterState::default),
        };

        let id = self.buildings.insert(building);
        self.tiles.insert(pos, id);
        true
    }

    /// Remove the building at `(x, y)`. Returns whether one was removed.
    /// Tokens above the cell are untouched; they fall through to the
    /// no-building movement rule on the next transport step.
    pub fn remove(&mut self, x: i32, y: i32) -> bool {
        let Some(id) = self.tiles.remove(&GridPosition::new(x, y)) else {
            return false;
        };
        self.buildings.remove(id).is_some()
    }

    /// The building at `(x, y)`, if any.
    pub fn get(&self, x: i32, y: i32) -> Option<&Building> {
        let id = self.tiles.get(&GridPosition::new(x, y))?;
        self.buildings.get(*id)
    }

    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut Building> {
        let id = self.tiles.get(&GridPosition::new(x, y))?;
        self.buildings.get_mut(*id)
    }

    /// Iterate all buildings in arena order.
    pub fn all(&self) -> impl Iterator<Item = (BuildingId, &Building)> {
        self.buildings.iter()
    }

    pub fn all_mut(&mut self) -> impl Iterator<Item = (BuildingId, &mut Building)> {
        self.buildings.iter_mut()
    }

    pub fn by_id(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(id)
    }

    pub fn by_id_mut(&mut self, id: BuildingId) -> Option<&mut Building> {
        self.buildings.get_mut(id)
    }

    /// Number of placed buildings.
    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    /// Number of buildings of one kind.
    pub fn count_by_kind(&self, kind: BuildingKind) -> usize {
        self.buildings.values().filter(|b| b.kind == kind).count()
    }

    /// Remove every building.
    pub fn clear(&mut self) {
        self.buildings.clear();
        self.tiles.clear();
    }

    // -- Adjacency --

    /// Whether the single neighbor of `(x, y)` in `direction` holds a belt,
    /// facing anywhere. Used by efficiency statistics, not by transport.
    pub fn has_adjacent_belt(&self, x: i32, y: i32, direction: Direction) -> bool {
        let neighbor = GridPosition::new(x, y).step(direction);
        self.get(neighbor.x, neighbor.y)
            .is_some_and(|b| b.kind.is_router())
    }

    /// The first neighbor of `pos` (scan order right, down, left, up)
    /// holding a belt oriented **away** from `pos` -- a belt that carries a
    /// handed-off token further instead of back. The required orientation
    /// per neighbor offset:
    ///
    /// | neighbor    | belt direction |
    /// |-------------|----------------|
    /// | right cell  | `Right`        |
    /// | below cell  | `Down`         |
    /// | left cell   | `Left`         |
    /// | above cell  | `Up`           |
    pub fn outgoing_belt(&self, pos: GridPosition) -> Option<GridPosition> {
        Direction::all().into_iter().map(|dir| (dir, pos.step(dir))).find_map(
            |(dir, neighbor)| {
                let building = self.get(neighbor.x, neighbor.y)?;
                (building.kind.is_router() && building.direction == dir).then_some(neighbor)
            },
        )
    }

    // -- Smelter slots --

    /// Whether `building` is a smelter with a free slot for `kind`: coal
    /// goes to the coal slot, iron or copper to the single ore slot.
    pub fn can_smelter_receive(building: &Building, kind: ItemKind) -> bool {
        let Some(state) = &building.smelter else {
            return false;
        };
        match kind {
            ItemKind::Coal => !state.input_coal,
            k if k.is_ore() => state.input_ore.is_none(),
            _ => false,
        }
    }

    /// Write `kind` into its smelter slot, unconditionally. Callers must
    /// have checked [`can_smelter_receive`](Self::can_smelter_receive)
    /// first; an already-filled slot is silently overwritten.
    pub fn add_item_to_smelter(building: &mut Building, kind: ItemKind) {
        let Some(state) = &mut building.smelter else {
            return;
        };
        match kind {
            ItemKind::Coal => state.input_coal = true,
            other => state.input_ore = Some(other),
        }
    }

    /// Rounded percentage of smelters that are actively producing or hold
    /// buffered output. 0 when there are no smelters.
    pub fn smelter_utilization(&self) -> u32 {
        let smelters: Vec<&SmelterState> = self
            .buildings
            .values()
            .filter_map(|b| b.smelter.as_ref())
            .collect();
        let total = smelters.len() as u64;
        if total == 0 {
            return 0;
        }
        let active = smelters.iter().filter(|s| s.is_active()).count() as u64;
        ((active * 100 + total / 2) / total) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::TerrainKind;

    fn terrain_with_iron_at_origin() -> Terrain {
        let mut terrain = Terrain::filled(20, 15, TerrainKind::Grass);
        terrain.set(0, 0, TerrainKind::IronOre);
        terrain
    }

    #[test]
    fn miner_on_ore_succeeds_and_binds_resource() {
        let terrain = terrain_with_iron_at_origin();
        let mut registry = BuildingRegistry::new();

        assert!(registry.place(0, 0, BuildingKind::Miner, &terrain, None));
        let miner = registry.get(0, 0).unwrap();
        assert_eq!(miner.kind, BuildingKind::Miner);
        assert_eq!(miner.resource, Some(ItemKind::Iron));
        assert_eq!(miner.timer, 0);
    }

    #[test]
    fn miner_on_grass_fails_without_mutation() {
        let terrain = terrain_with_iron_at_origin();
        let mut registry = BuildingRegistry::new();

        assert!(!registry.place(1, 1, BuildingKind::Miner, &terrain, None));
        assert!(registry.get(1, 1).is_none());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn occupied_cell_rejects_any_kind() {
        let terrain = terrain_with_iron_at_origin();
        let mut registry = BuildingRegistry::new();

        assert!(registry.place(0, 0, BuildingKind::Miner, &terrain, None));
        assert!(!registry.place(0, 0, BuildingKind::Belt, &terrain, None));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn out_of_bounds_placement_fails() {
        let terrain = terrain_with_iron_at_origin();
        let mut registry = BuildingRegistry::new();
        assert!(!registry.place(-1, 0, BuildingKind::Belt, &terrain, None));
        assert!(!registry.place(20, 0, BuildingKind::Chest, &terrain, None));
    }

    #[test]
    fn smelter_requires_grass() {
        let terrain = terrain_with_iron_at_origin();
        let mut registry = BuildingRegistry::new();

        assert!(!registry.place(0, 0, BuildingKind::Smelter, &terrain, None));
        assert!(registry.place(5, 5, BuildingKind::Smelter, &terrain, None));

        let smelter = registry.get(5, 5).unwrap();
        let state = smelter.smelter.as_ref().unwrap();
        assert_eq!(state.input_ore, None);
        assert!(!state.input_coal);
        assert_eq!(state.progress, 0);
        assert_eq!(state.output, None);
    }

    #[test]
    fn belt_records_direction_with_right_default() {
        let terrain = terrain_with_iron_at_origin();
        let mut registry = BuildingRegistry::new();

        assert!(registry.place(3, 3, BuildingKind::Belt, &terrain, Some(Direction::Up)));
        assert_eq!(registry.get(3, 3).unwrap().direction, Direction::Up);

        assert!(registry.place(4, 3, BuildingKind::Belt, &terrain, None));
        assert_eq!(registry.get(4, 3).unwrap().direction, Direction::Right);
    }

    #[test]
    fn remove_reports_whether_something_was_there() {
        let terrain = terrain_with_iron_at_origin();
        let mut registry = BuildingRegistry::new();

        assert!(registry.place(0, 0, BuildingKind::Miner, &terrain, None));
        assert!(registry.remove(0, 0));
        assert!(registry.get(0, 0).is_none());
        assert!(!registry.remove(0, 0));
    }

    #[test]
    fn count_by_kind_and_clear() {
        let terrain = terrain_with_iron_at_origin();
        let mut registry = BuildingRegistry::new();

        assert!(registry.place(0, 0, BuildingKind::Miner, &terrain, None));
        assert!(registry.place(1, 1, BuildingKind::Belt, &terrain, None));
        assert!(registry.place(2, 2, BuildingKind::Belt, &terrain, None));

        assert_eq!(registry.count_by_kind(BuildingKind::Miner), 1);
        assert_eq!(registry.count_by_kind(BuildingKind::Belt), 2);
        assert_eq!(registry.count_by_kind(BuildingKind::Chest), 0);

        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.get(1, 1).is_none());
    }

    #[test]
    fn has_adjacent_belt_checks_one_neighbor() {
        let terrain = terrain_with_iron_at_origin();
        let mut registry = BuildingRegistry::new();
        assert!(registry.place(5, 5, BuildingKind::Belt, &terrain, Some(Direction::Left)));

        assert!(registry.has_adjacent_belt(4, 5, Direction::Right));
        assert!(!registry.has_adjacent_belt(4, 5, Direction::Left));
        assert!(!registry.has_adjacent_belt(6, 6, Direction::Up));
    }

    #[test]
    fn outgoing_belt_requires_away_orientation() {
        let terrain = terrain_with_iron_at_origin();
        let pos = GridPosition::new(5, 5);
        let cases = [
            (GridPosition::new(6, 5), Direction::Right),
            (GridPosition::new(5, 6), Direction::Down),
            (GridPosition::new(4, 5), Direction::Left),
            (GridPosition::new(5, 4), Direction::Up),
        ];
        for (belt_at, away) in cases {
            let mut registry = BuildingRegistry::new();
            assert!(registry.place(belt_at.x, belt_at.y, BuildingKind::Belt, &terrain, Some(away)));
            assert_eq!(registry.outgoing_belt(pos), Some(belt_at), "offset {away:?}");

            // The same belt turned toward the center must not qualify.
            let mut registry = BuildingRegistry::new();
            assert!(registry.place(
                belt_at.x,
                belt_at.y,
                BuildingKind::Belt,
                &terrain,
                Some(away.opposite())
            ));
            assert_eq!(registry.outgoing_belt(pos), None, "offset {away:?}");
        }
    }

    #[test]
    fn outgoing_belt_prefers_scan_order() {
        let terrain = terrain_with_iron_at_origin();
        let mut registry = BuildingRegistry::new();
        // Qualifying belts both below and to the right; right wins.
        assert!(registry.place(6, 5, BuildingKind::Belt, &terrain, Some(Direction::Right)));
        assert!(registry.place(5, 6, BuildingKind::Belt, &terrain, Some(Direction::Down)));
        assert_eq!(
            registry.outgoing_belt(GridPosition::new(5, 5)),
            Some(GridPosition::new(6, 5))
        );
    }

    #[test]
    fn smelter_slot_rules() {
        let terrain = terrain_with_iron_at_origin();
        let mut registry = BuildingRegistry::new();
        assert!(registry.place(5, 5, BuildingKind::Smelter, &terrain, None));

        let smelter = registry.get_mut(5, 5).unwrap();
        assert!(BuildingRegistry::can_smelter_receive(smelter, ItemKind::Iron));
        BuildingRegistry::add_item_to_smelter(smelter, ItemKind::Iron);
        assert_eq!(smelter.smelter.as_ref().unwrap().input_ore, Some(ItemKind::Iron));

        // One ore slot regardless of subtype.
        assert!(!BuildingRegistry::can_smelter_receive(smelter, ItemKind::Iron));
        assert!(!BuildingRegistry::can_smelter_receive(smelter, ItemKind::Copper));

        assert!(BuildingRegistry::can_smelter_receive(smelter, ItemKind::Coal));
        BuildingRegistry::add_item_to_smelter(smelter, ItemKind::Coal);
        assert!(smelter.smelter.as_ref().unwrap().input_coal);
        assert!(!BuildingRegistry::can_smelter_receive(smelter, ItemKind::Coal));

        // Plates never enter a smelter.
        assert!(!BuildingRegistry::can_smelter_receive(smelter, ItemKind::IronPlate));
    }

    #[test]
    fn non_smelters_never_receive() {
        let terrain = terrain_with_iron_at_origin();
        let mut registry = BuildingRegistry::new();
        assert!(registry.place(5, 5, BuildingKind::Belt, &terrain, None));
        let belt = registry.get(5, 5).unwrap();
        assert!(!BuildingRegistry::can_smelter_receive(belt, ItemKind::Iron));
    }

    #[test]
    fn utilization_zero_without_smelters() {
        let registry = BuildingRegistry::new();
        assert_eq!(registry.smelter_utilization(), 0);
    }

    #[test]
    fn utilization_rounds_active_over_total() {
        let terrain = terrain_with_iron_at_origin();
        let mut registry = BuildingRegistry::new();
        assert!(registry.place(5, 5, BuildingKind::Smelter, &terrain, None));
        assert!(registry.place(7, 7, BuildingKind::Smelter, &terrain, None));

        assert_eq!(registry.smelter_utilization(), 0);

        registry.get_mut(5, 5).unwrap().smelter.as_mut().unwrap().progress = 50;
        assert_eq!(registry.smelter_utilization(), 50);

        // Buffered output counts as active too.
        registry.get_mut(7, 7).unwrap().smelter.as_mut().unwrap().output =
            Some(ItemKind::IronPlate);
        assert_eq!(registry.smelter_utilization(), 100);
    }

    #[test]
    fn utilization_rounds_to_nearest() {
        let terrain = terrain_with_iron_at_origin();
        let mut registry = BuildingRegistry::new();
        for x in 0..3 {
            assert!(registry.place(x * 2 + 1, 5, BuildingKind::Smelter, &terrain, None));
        }
        registry.get_mut(1, 5).unwrap().smelter.as_mut().unwrap().progress = 10;
        // 1 of 3 -> 33.33 -> 33
        assert_eq!(registry.smelter_utilization(), 33);

        registry.get_mut(3, 5).unwrap().smelter.as_mut().unwrap().progress = 10;
        // 2 of 3 -> 66.67 -> 67
        assert_eq!(registry.smelter_utilization(), 67);
    }
}
