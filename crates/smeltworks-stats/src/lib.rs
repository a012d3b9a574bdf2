//! Production statistics for the Smeltworks engine.
//!
//! Tracks per-kind production and collection throughput over configurable
//! tick windows. Listens to core events ([`Event::ItemMined`],
//! [`Event::PlateSmelted`], [`Event::ItemsCollected`]) and aggregates them
//! into rolling rates using [`Fixed64`] arithmetic. Also derives the
//! efficiency ratios dashboards display from read-only engine snapshots.
//!
//! The core never writes into this module; a presentation layer owns a
//! [`ProductionStats`], feeds it drained events each tick, and queries it.
//!
//! # Usage
//!
//! ```ignore
//! let mut stats = ProductionStats::new(StatsConfig::default());
//! engine.tick();
//! for event in engine.drain_events() {
//!     stats.record_event(&event);
//! }
//! stats.end_tick(engine.current_tick());
//! let rate = stats.production_rate(ItemKind::IronPlate);
//! ```

use std::collections::BTreeMap;

use smeltworks_core::building::BuildingRegistry;
use smeltworks_core::event::Event;
use smeltworks_core::fixed::{Fixed64, Ticks};
use smeltworks_core::item::{ItemKind, ItemMap};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the statistics module.
#[derive(Debug, Clone)]
pub struct StatsConfig {
    /// Window size in ticks for rolling averages (e.g., 60 ticks).
    pub window_size: Ticks,
    /// Maximum number of historical rate samples to retain per kind.
    pub history_capacity: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            window_size: 60,
            history_capacity: 256,
        }
    }
}

// ---------------------------------------------------------------------------
// RingBuffer — fixed-capacity history of rate samples
// ---------------------------------------------------------------------------

/// A fixed-capacity ring buffer storing [`Fixed64`] values for trend display.
///
/// When full, the oldest entry is overwritten. Iterates oldest-to-newest.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    data: Vec<Fixed64>,
    head: usize,
    len: usize,
}

impl RingBuffer {
    /// Create a new ring buffer with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be > 0");
        Self {
            data: vec![Fixed64::ZERO; capacity],
            head: 0,
            len: 0,
        }
    }

    /// Push a value, overwriting the oldest entry if at capacity.
    pub fn push(&mut self, value: Fixed64) {
        self.data[self.head] = value;
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        }
    }

    /// Number of values currently stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total capacity.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Get the most recently pushed value, if any.
    pub fn latest(&self) -> Option<Fixed64> {
        if self.len == 0 {
            return None;
        }
        let idx = if self.head == 0 {
            self.capacity() - 1
        } else {
            self.head - 1
        };
        Some(self.data[idx])
    }

    /// Iterate values from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = Fixed64> + '_ {
        let start = if self.len < self.capacity() {
            0
        } else {
            self.head
        };
        (0..self.len).map(move |i| self.data[(start + i) % self.capacity()])
    }
}

// ---------------------------------------------------------------------------
// ProductionStats
// ---------------------------------------------------------------------------

/// Rolling production and collection rates, fed by drained core events.
#[derive(Debug, Clone)]
pub struct ProductionStats {
    config: StatsConfig,
    window_start: Ticks,
    produced_in_window: BTreeMap<ItemKind, u64>,
    collected_in_window: BTreeMap<ItemKind, u64>,
    production_rates: BTreeMap<ItemKind, Fixed64>,
    collection_rates: BTreeMap<ItemKind, Fixed64>,
    production_history: BTreeMap<ItemKind, RingBuffer>,
}

impl ProductionStats {
    pub fn new(config: StatsConfig) -> Self {
        Self {
            config,
            window_start: 0,
            produced_in_window: BTreeMap::new(),
            collected_in_window: BTreeMap::new(),
            production_rates: BTreeMap::new(),
            collection_rates: BTreeMap::new(),
            production_history: BTreeMap::new(),
        }
    }

    /// Fold one drained core event into the current window.
    pub fn record_event(&mut self, event: &Event) {
        match event {
            Event::ItemMined { kind, .. } | Event::PlateSmelted { kind, .. } => {
                *self.produced_in_window.entry(*kind).or_insert(0) += 1;
            }
            Event::ItemsCollected { kind, count, .. } => {
                *self.collected_in_window.entry(*kind).or_insert(0) += count;
            }
            Event::SmeltingStarted { .. } | Event::OutputEjected { .. } => {}
        }
    }

    /// Close the current window if `window_size` ticks have elapsed,
    /// converting its counts into rates and history samples.
    pub fn end_tick(&mut self, tick: Ticks) {
        let window = self.config.window_size;
        if window == 0 || tick.saturating_sub(self.window_start) < window {
            return;
        }
        let span = Fixed64::from_num(window);

        for kind in ItemKind::all() {
            let produced = self.produced_in_window.remove(&kind).unwrap_or(0);
            let rate = Fixed64::from_num(produced) / span;
            self.production_rates.insert(kind, rate);
            self.production_history
                .entry(kind)
                .or_insert_with(|| RingBuffer::new(self.config.history_capacity))
                .push(rate);

            let collected = self.collected_in_window.remove(&kind).unwrap_or(0);
            self.collection_rates
                .insert(kind, Fixed64::from_num(collected) / span);
        }
        self.window_start = tick;
    }

    /// Items of `kind` produced per tick over the last closed window.
    pub fn production_rate(&self, kind: ItemKind) -> Fixed64 {
        self.production_rates
            .get(&kind)
            .copied()
            .unwrap_or(Fixed64::ZERO)
    }

    /// Items of `kind` collected per tick over the last closed window.
    pub fn collection_rate(&self, kind: ItemKind) -> Fixed64 {
        self.collection_rates
            .get(&kind)
            .copied()
            .unwrap_or(Fixed64::ZERO)
    }

    /// Historical production-rate samples for `kind`, oldest first.
    pub fn rate_history(&self, kind: ItemKind) -> Option<&RingBuffer> {
        self.production_history.get(&kind)
    }
}

// ---------------------------------------------------------------------------
// Snapshot ratios
// ---------------------------------------------------------------------------

/// Fraction of miners that can actually hand off: a miner counts as active
/// when some neighbor holds a belt oriented away from it. 0 with no miners.
pub fn miner_active_ratio(buildings: &BuildingRegistry) -> Fixed64 {
    let miners: Vec<_> = buildings
        .all()
        .filter(|(_, b)| b.kind.is_miner())
        .map(|(_, b)| b.pos)
        .collect();
    if miners.is_empty() {
        return Fixed64::ZERO;
    }
    let active = miners
        .iter()
        .filter(|pos| buildings.outgoing_belt(**pos).is_some())
        .count();
    Fixed64::from_num(active) / Fixed64::from_num(miners.len())
}

/// Tokens sitting on belts divided by belt count. 0 with no belts. Values
/// above 1 mean belts are backing up.
pub fn belt_utilization(items: &ItemMap, buildings: &BuildingRegistry) -> Fixed64 {
    let belts = buildings.count_by_kind(smeltworks_core::building::BuildingKind::Belt);
    if belts == 0 {
        return Fixed64::ZERO;
    }
    Fixed64::from_num(items.count_on_belts(buildings)) / Fixed64::from_num(belts)
}

/// Rounded percentage of smelters currently producing or holding output.
/// Thin re-export of the registry's own figure so dashboards have one
/// statistics entry point.
pub fn smelter_utilization(buildings: &BuildingRegistry) -> u32 {
    buildings.smelter_utilization()
}
