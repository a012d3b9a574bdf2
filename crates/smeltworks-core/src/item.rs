//! Item tokens and the transport step.
//!
//! An [`ItemToken`] is one discrete unit of a resource or product sitting on
//! a grid cell. Tokens are owned exclusively by the [`ItemMap`]; buildings
//! never hold tokens directly (a smelter's input slots are separate
//! sub-state, not tokens).
//!
//! [`ItemMap::move_items`] performs one transport step over every tracked
//! token. Moves are computed against the pre-step cell map and written into
//! a scratch buffer that is swapped in at the end of the step, so no move
//! decision can observe another token's already-updated position.

use crate::building::BuildingRegistry;
use crate::fixed::Ticks;
use crate::grid::{Direction, GridPosition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Item kinds
// ---------------------------------------------------------------------------

/// Kind of a resource or product moving on the grid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ItemKind {
    Iron,
    Copper,
    Coal,
    IronPlate,
    CopperPlate,
}

impl ItemKind {
    /// Raw ore kinds, the ones a smelter's ore slot accepts.
    pub fn is_ore(&self) -> bool {
        matches!(self, ItemKind::Iron | ItemKind::Copper)
    }

    /// The plate produced by smelting this ore, if it is one.
    pub fn plate(&self) -> Option<ItemKind> {
        match self {
            ItemKind::Iron => Some(ItemKind::IronPlate),
            ItemKind::Copper => Some(ItemKind::CopperPlate),
            _ => None,
        }
    }

    /// Whether chests tally this kind on collection.
    ///
    /// Kinds outside the tallied set are discarded at chests, not
    /// accumulated. Today every kind is tallied; the predicate is the single
    /// place a new kind has to opt in.
    pub fn is_tallied(&self) -> bool {
        matches!(
            self,
            ItemKind::Iron
                | ItemKind::Copper
                | ItemKind::Coal
                | ItemKind::IronPlate
                | ItemKind::CopperPlate
        )
    }

    /// All kinds, in counter display order.
    pub fn all() -> [ItemKind; 5] {
        [
            ItemKind::Iron,
            ItemKind::Copper,
            ItemKind::Coal,
            ItemKind::IronPlate,
            ItemKind::CopperPlate,
        ]
    }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// One discrete unit of a resource in transit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemToken {
    pub kind: ItemKind,
    pub pos: GridPosition,
    /// Tick at which the token was emitted. Cosmetic -- renderers use it for
    /// pulse animations; the core never reads it back.
    pub created_tick: Ticks,
}

// ---------------------------------------------------------------------------
// Per-kind tallies
// ---------------------------------------------------------------------------

/// Per-kind item counts. Used both for one step's collected result and for
/// the engine's running totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTally {
    counts: BTreeMap<ItemKind, u64>,
}

impl ResourceTally {
    /// Count `n` units of `kind`. Untallied kinds are silently discarded.
    pub fn record(&mut self, kind: ItemKind, n: u64) {
        if kind.is_tallied() {
            *self.counts.entry(kind).or_insert(0) += n;
        }
    }

    /// Count for one kind (0 if never recorded).
    pub fn get(&self, kind: ItemKind) -> u64 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Sum over all kinds.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.values().all(|&n| n == 0)
    }

    /// Iterate `(kind, count)` pairs in kind order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemKind, u64)> + '_ {
        self.counts.iter().map(|(&k, &n)| (k, n))
    }

    /// Fold another tally into this one.
    pub fn merge(&mut self, other: &ResourceTally) {
        for (kind, n) in other.iter() {
            self.record(kind, n);
        }
    }
}

// ---------------------------------------------------------------------------
// Item map
// ---------------------------------------------------------------------------

/// Where a moved token ends up, resolved against the destination building.
enum Arrival {
    /// Destination is a chest: remove the token and tally it.
    Collect,
    /// Destination is a smelter with a free slot: consume the token.
    Consume,
    /// Destination is a smelter with no free slot: stay at the origin cell.
    Blocked,
    /// Plain landing on the destination cell.
    Land,
}

/// Sparse set of in-flight item tokens, keyed by the cell they occupy.
///
/// A cell may hold any number of tokens; no capacity or separation is
/// modeled. Cells iterate in position order, so a step's outcome does not
/// depend on map internals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemMap {
    width: i32,
    height: i32,
    cells: BTreeMap<GridPosition, Vec<ItemToken>>,
    /// Next-step buffer, reused across steps and swapped in at step end.
    #[serde(skip)]
    scratch: BTreeMap<GridPosition, Vec<ItemToken>>,
}

impl ItemMap {
    /// Create an empty item map for a `width` x `height` grid.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            cells: BTreeMap::new(),
            scratch: BTreeMap::new(),
        }
    }

    fn in_bounds(&self, pos: GridPosition) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    /// Append a token to a cell, stamped with the current tick.
    pub fn add(&mut self, pos: GridPosition, kind: ItemKind, tick: Ticks) {
        self.cells.entry(pos).or_default().push(ItemToken {
            kind,
            pos,
            created_tick: tick,
        });
    }

    /// Tokens currently on a cell (empty slice if none).
    pub fn items_at(&self, pos: GridPosition) -> &[ItemToken] {
        self.cells.get(&pos).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate all occupied cells and their tokens, in position order.
    pub fn iter(&self) -> impl Iterator<Item = (GridPosition, &[ItemToken])> {
        self.cells.iter().map(|(&pos, tokens)| (pos, tokens.as_slice()))
    }

    /// Total number of tokens on the grid.
    pub fn total_count(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    /// Number of tokens sitting on belt cells (belt-utilization statistic).
    pub fn count_on_belts(&self, buildings: &BuildingRegistry) -> usize {
        self.cells
            .iter()
            .filter(|(pos, _)| {
                buildings
                    .get(pos.x, pos.y)
                    .is_some_and(|b| b.kind.is_router())
            })
            .map(|(_, tokens)| tokens.len())
            .sum()
    }

    /// Remove every token.
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Perform exactly one transport step over all tracked tokens.
    ///
    /// Movement rules, per token resting on cell `pos`:
    /// - on a **miner**: move onto the first neighbor (scan order right,
    ///   down, left, up) holding a belt oriented away from the miner;
    /// - on a **belt**: move one cell downstream if that cell holds a belt,
    ///   chest, or smelter, otherwise stall (end-of-line backpressure);
    /// - on a **smelter** or other non-routing building: no movement;
    /// - on **open ground**: drift one cell to the right.
    ///
    /// Any destination outside the grid is discarded in favor of staying
    /// put. A token arriving on a chest is removed and tallied; a token
    /// arriving on a smelter is consumed into its free slot, or bounced
    /// back to its origin cell when the slot is taken.
    ///
    /// Returns the per-kind collected counts for this step.
    pub fn move_items(&mut self, buildings: &mut BuildingRegistry) -> ResourceTally {
        let mut collected = ResourceTally::default();
        self.scratch.clear();

        let cells = std::mem::take(&mut self.cells);
        for (&pos, tokens) in &cells {
            let here = buildings.get(pos.x, pos.y).map(|b| (b.kind, b.direction));

            for token in tokens {
                let mut dest = pos;
                let mut should_move = false;

                match here {
                    Some((kind, _)) if kind.is_miner() => {
                        if let Some(belt_pos) = buildings.outgoing_belt(pos) {
                            dest = belt_pos;
                            should_move = true;
                        }
                    }
                    Some((kind, dir)) if kind.is_router() => {
                        let next = pos.step(dir);
                        let accepts = buildings.get(next.x, next.y).is_some_and(|b| {
                            b.kind.is_router() || b.kind.is_sink() || b.kind.is_processor()
                        });
                        if accepts {
                            dest = next;
                            should_move = true;
                        }
                    }
                    Some(_) => {
                        // Processors and sinks hold their tokens; a smelter
                        // releases output through its own ejection logic.
                    }
                    None => {
                        // Open ground: drift right, the legacy fallback for
                        // tokens that exited a belt network.
                        dest = pos.step(Direction::Right);
                        should_move = true;
                    }
                }

                if should_move && !self.in_bounds(dest) {
                    dest = pos;
                    should_move = false;
                }

                if should_move {
                    let arrival = match buildings.get(dest.x, dest.y) {
                        Some(b) if b.kind.is_sink() => Arrival::Collect,
                        Some(b) if b.kind.is_processor() => {
                            if BuildingRegistry::can_smelter_receive(b, token.kind) {
                                Arrival::Consume
                            } else {
                                Arrival::Blocked
                            }
                        }
                        _ => Arrival::Land,
                    };

                    match arrival {
                        Arrival::Collect => {
                            collected.record(token.kind, 1);
                            continue;
                        }
                        Arrival::Consume => {
                            if let Some(smelter) = buildings.get_mut(dest.x, dest.y) {
                                BuildingRegistry::add_item_to_smelter(smelter, token.kind);
                            }
                            continue;
                        }
                        Arrival::Blocked => dest = pos,
                        Arrival::Land => {}
                    }
                }

                self.scratch.entry(dest).or_default().push(ItemToken {
                    kind: token.kind,
                    pos: dest,
                    created_tick: token.created_tick,
                });
            }
        }

        std::mem::swap(&mut self.cells, &mut self.scratch);
        self.scratch.clear();
        collected
    }
}
