//! Implementor fragments.
//!
//! # Responsibility
//! - Tie one contribution to the trait whose documentation page loads it.
//! - Render, parse and load `implementors/**/trait.<Name>.js` scripts.
//!
//! # Invariants
//! - Fragment payloads are passed through to the bridge unchanged.
//! - The trait path is derived from the file location only.

pub mod loader;
pub mod parse;
pub mod render;

use crate::model::contribution::Contribution;
use std::path::{Component, Path};

const TRAIT_FILE_PREFIX: &str = "trait.";
const FRAGMENT_EXTENSION: &str = "js";

/// One loaded fragment: the trait it documents and its contribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplementorFragment {
    /// Full trait path, e.g. `core::default::Default`.
    pub trait_path: String,
    pub contribution: Contribution,
}

impl ImplementorFragment {
    pub fn new(trait_path: impl Into<String>, contribution: Contribution) -> Self {
        Self {
            trait_path: trait_path.into(),
            contribution,
        }
    }

    /// Relative location a generator writes this fragment to.
    ///
    /// `core::default::Default` -> `core/default/trait.Default.js`. Returns
    /// `None` when a path segment is empty or could leave its directory
    /// (`.`, `/` or `\\`).
    pub fn relative_path(&self) -> Option<String> {
        let mut segments: Vec<&str> = self.trait_path.split("::").collect();
        if !segments.iter().all(|segment| is_plain_segment(segment)) {
            return None;
        }
        let name = segments.pop()?;
        segments.push("");
        let mut path = segments.join("/");
        path.push_str(TRAIT_FILE_PREFIX);
        path.push_str(name);
        path.push('.');
        path.push_str(FRAGMENT_EXTENSION);
        Some(path)
    }
}

fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.contains(['/', '\\', '.'])
}

/// Derives a trait path from a fragment path relative to the fragment root.
///
/// Returns `None` unless the file is named `trait.<Name>.js` and every
/// directory component is a plain name without dots.
pub fn trait_path_from_relative(path: &Path) -> Option<String> {
    if path.extension()? != FRAGMENT_EXTENSION {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let name = stem.strip_prefix(TRAIT_FILE_PREFIX)?;
    if !is_plain_segment(name) {
        return None;
    }

    let mut segments = Vec::new();
    if let Some(parent) = path.parent() {
        for component in parent.components() {
            match component {
                Component::Normal(segment) => {
                    let segment = segment.to_str()?;
                    if !is_plain_segment(segment) {
                        return None;
                    }
                    segments.push(segment);
                }
                Component::CurDir => {}
                _ => return None,
            }
        }
    }
    segments.push(name);
    Some(segments.join("::"))
}

#[cfg(test)]
mod tests {
    use super::{trait_path_from_relative, ImplementorFragment};
    use crate::model::contribution::Contribution;
    use std::path::Path;

    #[test]
    fn derives_trait_path_from_nested_file() {
        assert_eq!(
            trait_path_from_relative(Path::new("core/default/trait.Default.js")).as_deref(),
            Some("core::default::Default")
        );
        assert_eq!(
            trait_path_from_relative(Path::new("trait.Root.js")).as_deref(),
            Some("Root")
        );
    }

    #[test]
    fn rejects_non_fragment_files() {
        assert!(trait_path_from_relative(Path::new("core/default/struct.Foo.js")).is_none());
        assert!(trait_path_from_relative(Path::new("core/default/trait.Default.html")).is_none());
        assert!(trait_path_from_relative(Path::new("core/trait..js")).is_none());
        assert!(trait_path_from_relative(Path::new("../core/trait.Default.js")).is_none());
        assert!(trait_path_from_relative(Path::new("core.v2/trait.Default.js")).is_none());
        assert!(trait_path_from_relative(Path::new("core/trait.A.B.js")).is_none());
    }

    #[test]
    fn relative_path_mirrors_trait_path() {
        let fragment = ImplementorFragment::new("core::default::Default", Contribution::new());
        assert_eq!(
            fragment.relative_path().as_deref(),
            Some("core/default/trait.Default.js")
        );

        let root = ImplementorFragment::new("Root", Contribution::new());
        assert_eq!(root.relative_path().as_deref(), Some("trait.Root.js"));
    }

    #[test]
    fn relative_path_rejects_segments_that_leave_the_root() {
        for trait_path in [
            "..::escaped::Evil",
            "",
            "a::::B",
            "core::",
            "/abs::X",
            "a\\b::C",
            "a.b::C",
            "core::.",
        ] {
            let fragment = ImplementorFragment::new(trait_path, Contribution::new());
            assert_eq!(fragment.relative_path(), None, "trait path {trait_path:?}");
        }
    }

    #[test]
    fn relative_path_round_trips_through_trait_path() {
        let fragment =
            ImplementorFragment::new("rand::distributions::Distribution", Contribution::new());
        let relative = fragment.relative_path().expect("plain trait path");

        assert_eq!(
            trait_path_from_relative(Path::new(&relative)).as_deref(),
            Some("rand::distributions::Distribution")
        );
    }
}
