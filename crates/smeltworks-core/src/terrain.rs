//! Terrain generation and queries.
//!
//! The terrain is generated once per world and read-only afterwards.
//! Resources are stamped as connected blobs grown from random seed cells
//! rather than scattered uniformly, so miners compete for a handful of
//! contiguous patches.

use crate::config::WorldConfig;
use crate::grid::{Direction, GridPosition};
use crate::item::ItemKind;
use crate::rng::SimRng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Clusters average this many cells; cluster count = ceil(target / 7).
const CLUSTER_DIVISOR: u32 = 7;
/// Cluster size quota is `CLUSTER_SIZE_MIN + rand(0..CLUSTER_SIZE_SPREAD)`,
/// i.e. 5 to 9 cells.
const CLUSTER_SIZE_MIN: u32 = 5;
const CLUSTER_SIZE_SPREAD: u32 = 5;
/// Attempts to find a grass seed cell before giving up on a cluster.
const SEED_ATTEMPTS: u32 = 100;

// ---------------------------------------------------------------------------
// Cell kinds
// ---------------------------------------------------------------------------

/// Kind of one terrain cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerrainKind {
    Grass,
    IronOre,
    CopperOre,
    Coal,
}

impl TerrainKind {
    /// Whether a miner may be placed on this cell.
    pub fn is_mineable(&self) -> bool {
        matches!(
            self,
            TerrainKind::IronOre | TerrainKind::CopperOre | TerrainKind::Coal
        )
    }

    /// The resource a miner on this cell extracts, if any.
    pub fn resource(&self) -> Option<ItemKind> {
        match self {
            TerrainKind::IronOre => Some(ItemKind::Iron),
            TerrainKind::CopperOre => Some(ItemKind::Copper),
            TerrainKind::Coal => Some(ItemKind::Coal),
            TerrainKind::Grass => None,
        }
    }
}

/// Per-kind cell counts over the whole map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainCensus {
    pub iron: usize,
    pub copper: usize,
    pub coal: usize,
    pub grass: usize,
}

// ---------------------------------------------------------------------------
// Terrain
// ---------------------------------------------------------------------------

/// A fixed-size 2D map of terrain cells, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terrain {
    width: i32,
    height: i32,
    cells: Vec<TerrainKind>,
}

impl Terrain {
    /// A terrain filled with a single kind. World generation starts from all
    /// grass; tests build fixtures from it.
    pub fn filled(width: i32, height: i32, kind: TerrainKind) -> Self {
        let len = (width.max(0) as usize) * (height.max(0) as usize);
        Self {
            width,
            height,
            cells: vec![kind; len],
        }
    }

    /// Generate a terrain for the configured grid: all grass, then the
    /// target count of each resource stamped in clusters.
    ///
    /// Deterministic for a given `rng` seed.
    pub fn generate(config: &WorldConfig, rng: &mut SimRng) -> Self {
        let mut terrain = Terrain::filled(config.width, config.height, TerrainKind::Grass);
        let stamps = [
            (TerrainKind::IronOre, config.targets.iron),
            (TerrainKind::CopperOre, config.targets.copper),
            (TerrainKind::Coal, config.targets.coal),
        ];
        for (kind, target) in stamps {
            terrain.stamp_clusters(kind, target, config, rng);
        }
        terrain
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Cell kind at `(x, y)`, or `None` out of bounds. Never panics.
    pub fn kind_at(&self, x: i32, y: i32) -> Option<TerrainKind> {
        self.index(x, y).map(|i| self.cells[i])
    }

    /// Whether `(x, y)` is in bounds and holds a mineable resource.
    pub fn is_mineable(&self, x: i32, y: i32) -> bool {
        self.kind_at(x, y).is_some_and(|k| k.is_mineable())
    }

    /// Overwrite one cell. Used by generation and by test fixtures; once a
    /// world owns the terrain it is only handed out by shared reference.
    pub fn set(&mut self, x: i32, y: i32, kind: TerrainKind) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = kind;
        }
    }

    /// Count cells of every kind.
    pub fn count_resource_areas(&self) -> TerrainCensus {
        let mut census = TerrainCensus::default();
        for kind in &self.cells {
            match kind {
                TerrainKind::IronOre => census.iron += 1,
                TerrainKind::CopperOre => census.copper += 1,
                TerrainKind::Coal => census.coal += 1,
                TerrainKind::Grass => census.grass += 1,
            }
        }
        census
    }

    /// Total mineable cells, all resource kinds together.
    pub fn total_ore_areas(&self) -> usize {
        let census = self.count_resource_areas();
        census.iron + census.copper + census.coal
    }

    // -- Generation internals --

    fn random_position(&self, rng: &mut SimRng) -> GridPosition {
        GridPosition::new(
            rng.next_below(self.width.max(0) as u32) as i32,
            rng.next_below(self.height.max(0) as u32) as i32,
        )
    }

    /// Stamp `target` cells of `kind` in clusters, topping up on random
    /// grass cells if frontier growth falls short.
    fn stamp_clusters(
        &mut self,
        kind: TerrainKind,
        target: u32,
        config: &WorldConfig,
        rng: &mut SimRng,
    ) {
        let mut placed = 0u32;
        let cluster_count = target.div_ceil(CLUSTER_DIVISOR);

        for _ in 0..cluster_count {
            if placed >= target {
                break;
            }

            let mut seed = None;
            for _ in 0..SEED_ATTEMPTS {
                let pos = self.random_position(rng);
                if self.kind_at(pos.x, pos.y) == Some(TerrainKind::Grass) {
                    seed = Some(pos);
                    break;
                }
            }
            let Some(seed) = seed else {
                continue;
            };

            let quota = (target - placed)
                .min(CLUSTER_SIZE_MIN + rng.next_below(CLUSTER_SIZE_SPREAD));
            placed += self.grow_cluster(kind, seed, quota, config, rng);
        }

        // Frontier starvation can leave the total short; scatter the rest.
        while placed < target && self.cells.contains(&TerrainKind::Grass) {
            let pos = self.random_position(rng);
            if self.kind_at(pos.x, pos.y) == Some(TerrainKind::Grass) {
                self.set(pos.x, pos.y, kind);
                placed += 1;
            }
        }
    }

    /// Grow one cluster from `seed` with a frontier queue: pop a cell, skip
    /// it unless it is in-bounds grass, stamp it, then push each orthogonal
    /// neighbor with independent probability until the quota is met or the
    /// queue runs dry. Returns the number of cells stamped.
    fn grow_cluster(
        &mut self,
        kind: TerrainKind,
        seed: GridPosition,
        quota: u32,
        config: &WorldConfig,
        rng: &mut SimRng,
    ) -> u32 {
        let mut placed = 0u32;
        let mut frontier = VecDeque::from([seed]);

        while let Some(pos) = frontier.pop_front() {
            if placed >= quota {
                break;
            }
            // Skips revisits too: a stamped cell is no longer grass.
            if self.kind_at(pos.x, pos.y) != Some(TerrainKind::Grass) {
                continue;
            }
            self.set(pos.x, pos.y, kind);
            placed += 1;

            for dir in Direction::all() {
                if rng.chance(config.cluster_growth_chance) {
                    frontier.push_back(pos.step(dir));
                }
            }
        }
        placed
    }
}
