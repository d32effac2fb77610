//! Payload model shared by fragments, the bridge and collectors.
//!
//! # Responsibility
//! - Define the contribution shape handed from fragments to the collector.
//!
//! # Invariants
//! - Description items are opaque and pass through unchanged.

pub mod contribution;
