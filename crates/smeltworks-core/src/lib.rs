//! Smeltworks Core -- the simulation engine for a tile-grid factory game.
//!
//! This crate provides clustered terrain generation, the building registry
//! (miners, belts, chests, smelters), discrete item transport, and the
//! deterministic tick engine that ties them together.
//!
//! # Two-Cadence Tick Pipeline
//!
//! Each call to [`engine::Engine::tick`] advances the simulation by one tick
//! through the following phases:
//!
//! 1. **Mine** -- Every miner advances its timer; at the mining interval it
//!    emits one token of its bound resource onto its own cell.
//! 2. **Smelt** -- Every smelter begins, advances, or completes its recipe,
//!    then tries to eject a buffered plate onto an adjacent belt.
//! 3. **Transport** -- Every `belt_move_interval` ticks, all item tokens take
//!    exactly one transport step and chest collections are tallied.
//!
//! Mining and smelting run every tick; transport is a periodic batch step.
//! This decouples production timing from transport granularity.
//!
//! # Snapshot-and-Swap Transport
//!
//! Transport moves are computed from the pre-step token map and written into
//! a fresh buffer that is swapped in at the end of the step. A token's move
//! decision never observes another token's already-updated position within
//! the same step.
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- Main simulation engine and tick orchestrator.
//! - [`terrain::Terrain`] -- Immutable resource map, generated once per world.
//! - [`building::BuildingRegistry`] -- Sparse set of placed buildings with a
//!   tile index for adjacency queries.
//! - [`item::ItemMap`] -- Double-buffered sparse set of in-flight item tokens.
//! - [`rng::SimRng`] -- SplitMix64 PRNG for reproducible terrain generation.
//! - [`event::Event`] -- Buffered simulation events, drained by the caller.

pub mod building;
pub mod config;
#[cfg(feature = "data-loader")]
pub mod data_loader;
pub mod engine;
pub mod event;
pub mod fixed;
pub mod grid;
pub mod item;
pub mod rng;
pub mod terrain;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
