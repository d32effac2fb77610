//! Deferred, order-independent delivery of contributions to one collector.
//!
//! # Responsibility
//! - Deliver each deposit straight to a registered collector.
//! - Hold the latest unclaimed deposit until a collector registers.
//!
//! # Invariants
//! - At most one contribution is pending at a time; the last deposit wins.
//! - Neither deposit nor registration ever reports an error.

pub mod global;
pub mod registry_bridge;
