//! World configuration.
//!
//! All timing values are in ticks. The reference game runs 60 ticks per
//! second, so the defaults below mean: mine every 2 seconds, smelt for
//! 4 seconds, move belts every half second.

use crate::fixed::{Fixed64, Ticks};
use serde::{Deserialize, Serialize};

/// How many cells of each resource the terrain generator stamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTargets {
    pub iron: u32,
    pub copper: u32,
    pub coal: u32,
}

impl Default for ResourceTargets {
    fn default() -> Self {
        Self {
            iron: 25,
            copper: 20,
            coal: 15,
        }
    }
}

/// Static world parameters, fixed at world creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Grid width in cells.
    pub width: i32,
    /// Grid height in cells.
    pub height: i32,
    /// Ticks between two emissions of the same miner.
    pub mining_interval: Ticks,
    /// Ticks a smelter needs to turn one ore + one coal into a plate.
    pub smelting_time: Ticks,
    /// Transport runs once every this many ticks.
    pub belt_move_interval: Ticks,
    /// Resource cell counts stamped at generation.
    pub targets: ResourceTargets,
    /// Probability that a cluster frontier expands into each neighbor.
    pub cluster_growth_chance: Fixed64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 20,
            height: 15,
            mining_interval: 120,
            smelting_time: 240,
            belt_move_interval: 30,
            targets: ResourceTargets::default(),
            cluster_growth_chance: Fixed64::from_num(0.7),
        }
    }
}

impl WorldConfig {
    /// Whether `(x, y)` lies inside the grid.
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_defaults() {
        let config = WorldConfig::default();
        assert_eq!(config.width, 20);
        assert_eq!(config.height, 15);
        assert_eq!(config.mining_interval, 120);
        assert_eq!(config.smelting_time, 240);
        assert_eq!(config.belt_move_interval, 30);
        assert_eq!(config.targets.iron, 25);
        assert_eq!(config.targets.copper, 20);
        assert_eq!(config.targets.coal, 15);
    }

    #[test]
    fn bounds_are_half_open() {
        let config = WorldConfig::default();
        assert!(config.in_bounds(0, 0));
        assert!(config.in_bounds(19, 14));
        assert!(!config.in_bounds(20, 0));
        assert!(!config.in_bounds(0, 15));
        assert!(!config.in_bounds(-1, 0));
    }
}
