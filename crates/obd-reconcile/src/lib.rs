//! obd-reconcile
//!
//! Order-line vs inventory reconciliation and serial allocation.
//!
//! Architectural decisions:
//! - Inventory is scanned once into an [`InventoryIndex`] (identity sets,
//!   write-once serialized markers, depleting serial pools)
//! - Identity resolution is an ordered chain of matcher strategies
//! - Serials are tokens with pool-position identity; a drawn token is gone
//!   from every pool view for the rest of the run
//! - Channels are processed in configured order, lines in stable JAN order;
//!   processing order decides who wins contested serials
//!
//! Deterministic, pure logic. No IO. Single-threaded by contract: the index
//! is mutated through `&mut` only.

mod engine;
mod pool;
mod resolver;
mod types;

pub use engine::{reconcile, reconcile_with, ReconcileReport, UnroutedOrders};
pub use pool::{Allocation, InventoryIndex, KnownIdentities, SerialPool, SerializedMarkers};
pub use resolver::{
    ExactCode, IdentityMatcher, JanAsModel, MatchRule, ModelFallback, Resolution, Resolver,
};
pub use types::*;

/// Price scale: micros (1e-6).
pub const MICROS_SCALE: i64 = 1_000_000;
