//! Simulation events.
//!
//! Events are pushed into a buffer as the tick runs and delivered in batch
//! when the caller drains them. Passive consumers (dashboards, audio, the
//! stats crate) read them without ever reaching back into the core.

use crate::fixed::Ticks;
use crate::grid::GridPosition;
use crate::item::ItemKind;

/// A simulation event. All events carry the tick at which they occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // -- Production --
    /// A miner emitted one token onto its own cell.
    ItemMined {
        pos: GridPosition,
        kind: ItemKind,
        tick: Ticks,
    },
    /// A smelter with both inputs went from idle to progress 1.
    SmeltingStarted { pos: GridPosition, tick: Ticks },
    /// A smelter finished its cycle and buffered a plate.
    PlateSmelted {
        pos: GridPosition,
        kind: ItemKind,
        tick: Ticks,
    },
    /// A buffered plate left a smelter onto the adjacent belt at `to`.
    OutputEjected {
        from: GridPosition,
        to: GridPosition,
        kind: ItemKind,
        tick: Ticks,
    },

    // -- Transport --
    /// A transport step delivered `count` tokens of `kind` into chests.
    ItemsCollected {
        kind: ItemKind,
        count: u64,
        tick: Ticks,
    },
}

impl Event {
    /// The tick the event occurred on.
    pub fn tick(&self) -> Ticks {
        match self {
            Event::ItemMined { tick, .. }
            | Event::SmeltingStarted { tick, .. }
            | Event::PlateSmelted { tick, .. }
            | Event::OutputEjected { tick, .. }
            | Event::ItemsCollected { tick, .. } => *tick,
        }
    }
}
