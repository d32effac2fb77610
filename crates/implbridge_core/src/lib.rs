//! Order-independent delivery of implementor fragments to one collector.
//!
//! Fragments may load before or after the viewer that collects them; the
//! registry bridge either hands each contribution straight to the collector
//! or parks the latest one until the collector registers.

pub mod bridge;
pub mod fragment;
pub mod index;
pub mod logging;
pub mod model;

pub use bridge::registry_bridge::{
    BridgeState, BridgeStats, Collector, DepositOutcome, RegisterOutcome, RegistryBridge,
};
pub use fragment::loader::{
    discover_fragments, load_fragment, load_fragments, replay_into, write_fragment, LoadError,
    LoadOrder, ReplayReport,
};
pub use fragment::parse::{parse_fragment, FragmentParseError};
pub use fragment::render::render_fragment;
pub use fragment::{trait_path_from_relative, ImplementorFragment};
pub use index::{ImplementorIndex, SharedIndex};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::contribution::{Contribution, ImplementorGroup};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
