//! The simulation engine and tick orchestrator.
//!
//! [`Engine::tick`] runs one simulation step: miners first, then smelters,
//! then -- every `belt_move_interval` ticks -- one batch transport step.
//! The engine is single-threaded and cooperative: a step always runs to
//! completion, and every per-building update reads state as of the start of
//! the step's phase. If embedded in a threaded host, the whole step is one
//! critical section over the building map and the token map.

use crate::building::{BuildingId, BuildingKind, BuildingRegistry};
use crate::config::WorldConfig;
use crate::event::Event;
use crate::fixed::Ticks;
use crate::grid::{Direction, GridPosition};
use crate::item::{ItemKind, ItemMap, ResourceTally};
use crate::rng::SimRng;
use crate::terrain::Terrain;

/// Main simulation state: terrain, buildings, tokens, counters.
#[derive(Debug, Clone)]
pub struct Engine {
    pub(crate) config: WorldConfig,
    pub(crate) terrain: Terrain,

    /// The building registry. Exposed for adjacency queries, statistics,
    /// and scenario construction; `place`/`remove` on the engine are the
    /// validated path.
    pub buildings: BuildingRegistry,

    /// The item transport engine and its tokens.
    pub items: ItemMap,

    /// Current tick, incremented once per [`tick`](Self::tick).
    pub(crate) tick: Ticks,

    /// Ticks since the last transport step.
    pub(crate) frame_counter: Ticks,

    /// Running totals of everything mined or smelted.
    pub(crate) produced: ResourceTally,

    /// Running totals of everything delivered into chests.
    pub(crate) collected: ResourceTally,

    pub(crate) events: Vec<Event>,
}

impl Engine {
    /// Create a world with terrain generated from `seed`.
    pub fn new(config: WorldConfig, seed: u64) -> Self {
        let mut rng = SimRng::new(seed);
        let terrain = Terrain::generate(&config, &mut rng);
        Self::with_terrain(config, terrain)
    }

    /// Create a world over an existing terrain (scenario tests, editors).
    pub fn with_terrain(config: WorldConfig, terrain: Terrain) -> Self {
        let items = ItemMap::new(config.width, config.height);
        Self {
            config,
            terrain,
            buildings: BuildingRegistry::new(),
            items,
            tick: 0,
            frame_counter: 0,
            produced: ResourceTally::default(),
            collected: ResourceTally::default(),
            events: Vec::new(),
        }
    }

    // -- Mutation surface --

    /// Place a building; forwards to the registry after a bounds check.
    pub fn place(
        &mut self,
        x: i32,
        y: i32,
        kind: BuildingKind,
        direction: Option<Direction>,
    ) -> bool {
        if !self.config.in_bounds(x, y) {
            return false;
        }
        self.buildings.place(x, y, kind, &self.terrain, direction)
    }

    /// Remove the building at `(x, y)`.
    pub fn remove(&mut self, x: i32, y: i32) -> bool {
        self.buildings.remove(x, y)
    }

    /// Drop a token onto the grid, stamped with the current tick. Out of
    /// bounds is a no-op.
    pub fn add_item(&mut self, x: i32, y: i32, kind: ItemKind) {
        if self.config.in_bounds(x, y) {
            self.items.add(GridPosition::new(x, y), kind, self.tick);
        }
    }

    /// Bulk-clear all buildings and tokens. Counters and the tick survive.
    pub fn clear(&mut self) {
        self.buildings.clear();
        self.items.clear();
    }

    /// Advance the simulation by one tick.
    pub fn tick(&mut self) {
        self.step_miners();
        self.step_smelters();
        self.step_transport();
        self.tick += 1;
    }

    // -- Snapshot surface --

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn current_tick(&self) -> Ticks {
        self.tick
    }

    /// Ticks elapsed since the last transport step.
    pub fn frame_counter(&self) -> Ticks {
        self.frame_counter
    }

    /// Total units of `kind` ever mined or smelted.
    pub fn produced(&self, kind: ItemKind) -> u64 {
        self.produced.get(kind)
    }

    /// Total units of `kind` ever delivered into chests.
    pub fn collected(&self, kind: ItemKind) -> u64 {
        self.collected.get(kind)
    }

    pub fn total_item_count(&self) -> usize {
        self.items.total_count()
    }

    /// Take all events buffered since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // -- Tick phases --

    /// Phase 1: advance every miner's timer; emit at the mining interval.
    fn step_miners(&mut self) {
        let interval = self.config.mining_interval;
        let mut mined: Vec<(GridPosition, ItemKind)> = Vec::new();

        for (_, building) in self.buildings.all_mut() {
            if !building.kind.is_miner() {
                continue;
            }
            building.timer += 1;
            if building.timer >= interval {
                building.timer = 0;
                if let Some(kind) = building.resource {
                    mined.push((building.pos, kind));
                }
            }
        }

        for (pos, kind) in mined {
            self.items.add(pos, kind, self.tick);
            self.produced.record(kind, 1);
            self.events.push(Event::ItemMined {
                pos,
                kind,
                tick: self.tick,
            });
        }
    }

    /// Phase 2: begin, advance, or complete every smelter, then try to
    /// eject buffered output onto an adjacent belt.
    fn step_smelters(&mut self) {
        let smelting_time = self.config.smelting_time;
        let smelter_ids: Vec<BuildingId> = self
            .buildings
            .all()
            .filter(|(_, b)| b.kind.is_processor())
            .map(|(id, _)| id)
            .collect();

        for id in smelter_ids {
            let Some(building) = self.buildings.by_id_mut(id) else {
                continue;
            };
            let pos = building.pos;
            let Some(state) = building.smelter.as_mut() else {
                continue;
            };

            // Begin and advance are mutually exclusive within a tick, so a
            // loaded smelter reaches output exactly `smelting_time` ticks
            // after both inputs arrive.
            let mut started = false;
            let mut finished: Option<ItemKind> = None;
            if state.input_ore.is_some()
                && state.input_coal
                && state.progress == 0
                && state.output.is_none()
            {
                state.progress = 1;
                started = true;
            } else if state.progress > 0 {
                state.progress += 1;
                if state.progress >= smelting_time {
                    if let Some(plate) = state.input_ore.and_then(|ore| ore.plate()) {
                        state.output = Some(plate);
                        finished = Some(plate);
                    }
                    state.input_ore = None;
                    state.input_coal = false;
                    state.progress = 0;
                }
            }
            let pending_output = state.output;

            if started {
                self.events.push(Event::SmeltingStarted {
                    pos,
                    tick: self.tick,
                });
            }
            if let Some(kind) = finished {
                self.produced.record(kind, 1);
                self.events.push(Event::PlateSmelted {
                    pos,
                    kind,
                    tick: self.tick,
                });
            }

            // Ejection: first adjacent belt in scan order takes the plate;
            // with no belt the buffer is retained (backpressure).
            if let Some(kind) = pending_output {
                let belt = Direction::all()
                    .into_iter()
                    .map(|dir| pos.step(dir))
                    .find(|p| {
                        self.buildings
                            .get(p.x, p.y)
                            .is_some_and(|b| b.kind.is_router())
                    });
                if let Some(to) = belt {
                    self.items.add(to, kind, self.tick);
                    if let Some(state) = self
                        .buildings
                        .by_id_mut(id)
                        .and_then(|b| b.smelter.as_mut())
                    {
                        state.output = None;
                    }
                    self.events.push(Event::OutputEjected {
                        from: pos,
                        to,
                        kind,
                        tick: self.tick,
                    });
                }
            }
        }
    }

    /// Phase 3: on every `belt_move_interval`th tick, run one transport
    /// step and fold the collected counts into the running totals.
    fn step_transport(&mut self) {
        self.frame_counter += 1;
        if self.frame_counter < self.config.belt_move_interval {
            return;
        }
        self.frame_counter = 0;

        let collected = self.items.move_items(&mut self.buildings);
        for (kind, count) in collected.iter() {
            self.events.push(Event::ItemsCollected {
                kind,
                count,
                tick: self.tick,
            });
        }
        self.collected.merge(&collected);
    }
}
