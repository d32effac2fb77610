//! Process-wide registry bridge.
//!
//! Fragments and the viewer usually do not share a handle, so both reach the
//! same bridge through these free functions.
//!
//! # Invariants
//! - Created empty on first use.
//! - Collectors must not call back into this module from `collect`; the
//!   bridge lock is held while a collector runs.

use crate::bridge::registry_bridge::{
    BridgeState, BridgeStats, Collector, DepositOutcome, RegisterOutcome, RegistryBridge,
};
use crate::model::contribution::Contribution;
use once_cell::sync::Lazy;
use std::sync::{Mutex, MutexGuard};

type SharedBridge = RegistryBridge<dyn Collector + Send>;

static GLOBAL_BRIDGE: Lazy<Mutex<SharedBridge>> = Lazy::new(|| Mutex::new(SharedBridge::default()));

fn lock() -> MutexGuard<'static, SharedBridge> {
    // A panicking collector must not wedge every later fragment.
    GLOBAL_BRIDGE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Deposits one contribution into the process-wide bridge.
pub fn deposit(contribution: Contribution) -> DepositOutcome {
    lock().deposit(contribution)
}

/// Registers the viewer's collector with the process-wide bridge.
pub fn register_collector(collector: impl Collector + Send + 'static) -> RegisterOutcome {
    lock().register_collector(collector)
}

pub fn state() -> BridgeState {
    lock().state()
}

pub fn has_pending() -> bool {
    lock().has_pending()
}

pub fn stats() -> BridgeStats {
    lock().stats()
}

/// Returns the process-wide bridge to its freshly created state.
///
/// Drops any registered collector and pending contribution.
pub fn reset() {
    *lock() = SharedBridge::default();
}
