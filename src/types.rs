//! Policy knobs shared by loaders and the composer.
//!
//! Loading is controlled by three orthogonal settings:
//!
//! - **Write mode** ([`WriteMode`]): what a single loader does to a field that
//!   already holds a value.
//! - **Merge policy** ([`MergePolicy`]): which write mode each loader in a
//!   [`MultiLoader`](crate::MultiLoader) runs with.
//! - **Failure policy** ([`FailurePolicy`]): whether one failing loader stops
//!   the whole load.
//!
//! # Common setups
//!
//! ## Layered overrides (default)
//!
//! Defaults, then a file, then the environment, then flags. Each layer
//! replaces whatever it has evidence for.
//!
//! ```ignore
//! MultiLoader::new(vec![Box::new(defaults), Box::new(file), Box::new(env)])
//! ```
//!
//! ## Baseline plus gap filling
//!
//! The first loader is authoritative; later loaders only fill in what it left
//! empty.
//!
//! ```ignore
//! MultiLoader::new(loaders).merge_policy(MergePolicy::DefaultThenFill)
//! ```
//!
//! ## Optional sources
//!
//! A missing config file should not stop the environment from loading.
//!
//! ```ignore
//! MultiLoader::new(loaders).failure_policy(FailurePolicy::BestEffort)
//! ```

use std::path::Path;

/// How a loader treats fields that already hold a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Any value present in the source replaces the current one.
    #[default]
    Overlay,
    /// Only fields still at their zero value are written.
    FillZero,
}

/// How a [`MultiLoader`](crate::MultiLoader) combines its loaders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// Every loader overlays the ones before it. Later loaders win.
    #[default]
    SequentialOverlay,
    /// The first loader establishes the baseline; the rest only fill fields
    /// that are still zero.
    DefaultThenFill,
}

impl MergePolicy {
    /// The write mode for the loader at `position` in the chain.
    pub fn write_mode(self, position: usize) -> WriteMode {
        match self {
            MergePolicy::SequentialOverlay => WriteMode::Overlay,
            MergePolicy::DefaultThenFill if position == 0 => WriteMode::Overlay,
            MergePolicy::DefaultThenFill => WriteMode::FillZero,
        }
    }
}

/// What a [`MultiLoader`](crate::MultiLoader) does when a loader fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Return the first failure; later loaders do not run.
    #[default]
    AbortOnFirst,
    /// Log the failure, record it in the report, and keep going.
    BestEffort,
}

/// Structured file formats understood by [`FileLoader`](crate::FileLoader).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
    #[cfg(feature = "yaml")]
    Yaml,
}

impl Format {
    /// Pick a format from a file extension, case-insensitively.
    pub fn from_extension(path: &Path) -> Option<Format> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "toml" => Some(Format::Toml),
            "json" => Some(Format::Json),
            #[cfg(feature = "yaml")]
            "yaml" | "yml" => Some(Format::Yaml),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Format::Toml => "toml",
            Format::Json => "json",
            #[cfg(feature = "yaml")]
            Format::Yaml => "yaml",
        }
    }
}
