//! Fragment tree discovery and replay.
//!
//! # Responsibility
//! - Find every `trait.*.js` fragment under a fragment root.
//! - Load each fragment and deposit it into a bridge in a chosen order.
//!
//! # Invariants
//! - Discovery order is sorted by path, so replays are deterministic.
//! - Replay deposits every fragment exactly once.

use crate::bridge::registry_bridge::{Collector, DepositOutcome, RegistryBridge};
use crate::fragment::parse::{parse_fragment, FragmentParseError};
use crate::fragment::render::render_fragment;
use crate::fragment::{trait_path_from_relative, ImplementorFragment};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Order in which discovered fragments are deposited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadOrder {
    /// Sorted path order.
    #[default]
    Sorted,
    /// Reverse of sorted path order.
    Reversed,
}

/// Fragment loading errors.
#[derive(Debug)]
pub enum LoadError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: FragmentParseError },
    NotAFragment(PathBuf),
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "i/o error at `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse fragment `{}`: {source}", path.display())
            }
            Self::NotAFragment(path) => {
                write!(f, "not an implementor fragment: `{}`", path.display())
            }
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::NotAFragment(_) => None,
        }
    }
}

/// Summary of one replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub deposited: usize,
    pub delivered: usize,
    pub buffered: usize,
    pub dropped: usize,
}

/// Recursively lists fragment files under `root`, sorted by path.
pub fn discover_fragments(root: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let mut found = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = std::fs::read_dir(&dir).map_err(|source| LoadError::Io {
            path: dir.clone(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| LoadError::Io {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;
            if file_type.is_dir() {
                stack.push(path);
            } else if path
                .strip_prefix(root)
                .ok()
                .and_then(trait_path_from_relative)
                .is_some()
            {
                found.push(path);
            }
        }
    }
    found.sort();
    debug!(
        "event=fragments_discovered module=loader status=ok root={} count={}",
        root.display(),
        found.len()
    );
    Ok(found)
}

/// Reads and parses one fragment located at `path` under `root`.
pub fn load_fragment(root: &Path, path: &Path) -> Result<ImplementorFragment, LoadError> {
    let trait_path = path
        .strip_prefix(root)
        .ok()
        .and_then(trait_path_from_relative)
        .ok_or_else(|| LoadError::NotAFragment(path.to_path_buf()))?;
    let script = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let contribution = parse_fragment(&script).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ImplementorFragment::new(trait_path, contribution))
}

/// Discovers and loads every fragment under `root`.
pub fn load_fragments(root: &Path) -> Result<Vec<ImplementorFragment>, LoadError> {
    discover_fragments(root)?
        .iter()
        .map(|path| load_fragment(root, path))
        .collect()
}

/// Writes `fragment` below `root` at the location a generator would use.
///
/// Fails with [`LoadError::NotAFragment`] when the trait path has no plain
/// location below `root`; nothing is written in that case.
pub fn write_fragment(root: &Path, fragment: &ImplementorFragment) -> Result<PathBuf, LoadError> {
    let relative = fragment
        .relative_path()
        .ok_or_else(|| LoadError::NotAFragment(PathBuf::from(&fragment.trait_path)))?;
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| LoadError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let script = render_fragment(&fragment.contribution);
    std::fs::write(&path, script).map_err(|source| LoadError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Deposits each fragment's contribution into `bridge` in `order`.
pub fn replay_into<C>(
    bridge: &mut RegistryBridge<C>,
    mut fragments: Vec<ImplementorFragment>,
    order: LoadOrder,
) -> ReplayReport
where
    C: ?Sized + Collector,
{
    if order == LoadOrder::Reversed {
        fragments.reverse();
    }

    let mut report = ReplayReport::default();
    for fragment in fragments {
        debug!(
            "event=fragment_deposit module=loader status=start trait={}",
            fragment.trait_path
        );
        report.deposited += 1;
        match bridge.deposit(fragment.contribution) {
            DepositOutcome::Delivered => report.delivered += 1,
            DepositOutcome::Buffered => report.buffered += 1,
            DepositOutcome::BufferedReplacing => {
                report.buffered += 1;
                report.dropped += 1;
            }
        }
    }
    info!(
        "event=replay_done module=loader status=ok deposited={} delivered={} buffered={} dropped={}",
        report.deposited, report.delivered, report.buffered, report.dropped
    );
    report
}
