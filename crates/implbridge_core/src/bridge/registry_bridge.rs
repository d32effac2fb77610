//! Registry bridge context object.
//!
//! # Responsibility
//! - Own the collector handle and the one-slot pending buffer.
//! - Route each deposit to the collector or to the pending buffer.
//!
//! # Invariants
//! - Created empty: no collector, nothing pending.
//! - The only state transition is `CollectorAbsent -> CollectorPresent`.
//! - The pending buffer is cleared when its contribution is delivered.
//! - A buffered contribution is delivered at most once.

use crate::model::contribution::Contribution;
use log::{debug, warn};

/// Receiver of contributions, owned by the consuming viewer.
pub trait Collector {
    fn collect(&mut self, contribution: Contribution);
}

impl<F> Collector for F
where
    F: FnMut(Contribution),
{
    fn collect(&mut self, contribution: Contribution) {
        self(contribution)
    }
}

/// Observable bridge state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Deposits are buffered.
    CollectorAbsent,
    /// Deposits are delivered immediately.
    CollectorPresent,
}

/// Where one deposit ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepositOutcome {
    /// Handed to the registered collector synchronously.
    Delivered,
    /// Stored in an empty pending buffer.
    Buffered,
    /// Stored in the pending buffer, dropping an unclaimed contribution.
    BufferedReplacing,
}

/// Result of one collector registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterOutcome {
    /// A pending contribution was handed to the new collector.
    pub delivered_pending: bool,
    /// A previously registered collector was replaced.
    pub replaced_collector: bool,
}

/// Delivery counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Contributions handed to a collector, including drained pending ones.
    pub delivered: u64,
    /// Deposits that went into the pending buffer.
    pub buffered: u64,
    /// Buffered contributions overwritten before any collector claimed them.
    pub dropped: u64,
}

/// Bridge between independently loaded fragments and a single collector.
///
/// `C` is the collector object type; the process-wide bridge uses
/// `dyn Collector + Send` so it can live in a `static`.
pub struct RegistryBridge<C: ?Sized = dyn Collector> {
    collector: Option<Box<C>>,
    pending: Option<Contribution>,
    stats: BridgeStats,
}

impl<C: ?Sized> Default for RegistryBridge<C> {
    fn default() -> Self {
        Self {
            collector: None,
            pending: None,
            stats: BridgeStats::default(),
        }
    }
}

impl RegistryBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `collector` and drains the pending buffer into it.
    pub fn register_collector(&mut self, collector: impl Collector + 'static) -> RegisterOutcome {
        self.register_boxed(Box::new(collector))
    }
}

impl RegistryBridge<dyn Collector + Send> {
    /// Installs a `Send` collector and drains the pending buffer into it.
    pub fn register_collector(
        &mut self,
        collector: impl Collector + Send + 'static,
    ) -> RegisterOutcome {
        self.register_boxed(Box::new(collector))
    }
}

impl<C: ?Sized + Collector> RegistryBridge<C> {
    /// Hands one contribution to the collector, or buffers it.
    ///
    /// Buffering overwrites any contribution still pending; the overwritten
    /// one is lost and only counted in [`BridgeStats::dropped`].
    pub fn deposit(&mut self, contribution: Contribution) -> DepositOutcome {
        if let Some(collector) = self.collector.as_mut() {
            debug!(
                "event=contribution_delivered module=bridge status=ok groups={} items={}",
                contribution.len(),
                contribution.item_count()
            );
            (**collector).collect(contribution);
            self.stats.delivered += 1;
            return DepositOutcome::Delivered;
        }

        self.stats.buffered += 1;
        match self.pending.replace(contribution) {
            Some(dropped) => {
                self.stats.dropped += 1;
                warn!(
                    "event=pending_overwritten module=bridge status=dropped groups={} items={}",
                    dropped.len(),
                    dropped.item_count()
                );
                DepositOutcome::BufferedReplacing
            }
            None => {
                debug!("event=contribution_buffered module=bridge status=ok");
                DepositOutcome::Buffered
            }
        }
    }

    /// Installs an already boxed collector and drains the pending buffer.
    fn register_boxed(&mut self, mut collector: Box<C>) -> RegisterOutcome {
        let delivered_pending = match self.pending.take() {
            Some(contribution) => {
                debug!(
                    "event=pending_delivered module=bridge status=ok groups={} items={}",
                    contribution.len(),
                    contribution.item_count()
                );
                (*collector).collect(contribution);
                self.stats.delivered += 1;
                true
            }
            None => false,
        };

        let replaced_collector = self.collector.replace(collector).is_some();
        if replaced_collector {
            warn!("event=collector_replaced module=bridge status=ok");
        } else {
            debug!("event=collector_registered module=bridge status=ok");
        }

        RegisterOutcome {
            delivered_pending,
            replaced_collector,
        }
    }

    pub fn state(&self) -> BridgeState {
        if self.collector.is_some() {
            BridgeState::CollectorPresent
        } else {
            BridgeState::CollectorAbsent
        }
    }

    /// Returns whether an unclaimed contribution is buffered.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Borrows the unclaimed contribution, if any.
    pub fn pending(&self) -> Option<&Contribution> {
        self.pending.as_ref()
    }

    pub fn stats(&self) -> BridgeStats {
        self.stats
    }
}

impl<C: ?Sized + Collector> std::fmt::Debug for RegistryBridge<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryBridge")
            .field("state", &self.state())
            .field("pending", &self.pending)
            .field("stats", &self.stats)
            .finish()
    }
}
