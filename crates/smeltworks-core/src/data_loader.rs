//! Data-driven world configuration from JSON.
//!
//! Feature-gated behind `data-loader`. Overrides are sparse: absent fields
//! keep their [`WorldConfig::default`] values, so a data file only states
//! what it changes.

use crate::config::{ResourceTargets, WorldConfig};
use crate::fixed::f64_to_fixed64;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

// ---------------------------------------------------------------------------
// JSON data structures
// ---------------------------------------------------------------------------

/// Top-level world config document.
#[derive(Debug, serde::Deserialize)]
pub struct WorldConfigData {
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub mining_interval: Option<u64>,
    pub smelting_time: Option<u64>,
    pub belt_move_interval: Option<u64>,
    #[serde(default)]
    pub targets: Option<ResourceTargetsData>,
    pub cluster_growth_chance: Option<f64>,
}

/// JSON representation of per-resource cell targets.
#[derive(Debug, serde::Deserialize)]
pub struct ResourceTargetsData {
    pub iron: Option<u32>,
    pub copper: Option<u32>,
    pub coal: Option<u32>,
}

// ---------------------------------------------------------------------------
// Loading functions
// ---------------------------------------------------------------------------

/// Load a world configuration from a JSON string, applying overrides on top
/// of the defaults.
pub fn load_config_from_json(json: &str) -> Result<WorldConfig, DataLoadError> {
    let data: WorldConfigData = serde_json::from_str(json)?;
    let mut config = WorldConfig::default();

    if let Some(width) = data.width {
        config.width = width;
    }
    if let Some(height) = data.height {
        config.height = height;
    }
    if config.width <= 0 || config.height <= 0 {
        return Err(DataLoadError::InvalidConfig(format!(
            "grid must be positive, got {}x{}",
            config.width, config.height
        )));
    }

    if let Some(interval) = data.mining_interval {
        config.mining_interval = interval;
    }
    if let Some(time) = data.smelting_time {
        config.smelting_time = time;
    }
    if let Some(interval) = data.belt_move_interval {
        config.belt_move_interval = interval;
    }

    if let Some(targets) = data.targets {
        let ResourceTargets { iron, copper, coal } = config.targets;
        config.targets = ResourceTargets {
            iron: targets.iron.unwrap_or(iron),
            copper: targets.copper.unwrap_or(copper),
            coal: targets.coal.unwrap_or(coal),
        };
    }
    let cell_count = config.width as u64 * config.height as u64;
    let target_total = config.targets.iron as u64 + config.targets.copper as u64
        + config.targets.coal as u64;
    if target_total > cell_count {
        return Err(DataLoadError::InvalidConfig(format!(
            "resource targets ({target_total}) exceed grid capacity ({cell_count})"
        )));
    }

    if let Some(chance) = data.cluster_growth_chance {
        if !(0.0..=1.0).contains(&chance) {
            return Err(DataLoadError::InvalidConfig(format!(
                "cluster_growth_chance must be in [0, 1], got {chance}"
            )));
        }
        config.cluster_growth_chance = f64_to_fixed64(chance);
    }

    Ok(config)
}
