//! Load one configuration record from several sources. Declare the fields,
//! pick the sources, and go.
//!
//! Multiconf fills a plain Rust struct from declared defaults, config files
//! (TOML, JSON, YAML), environment variables, command-line flags and values
//! set in code. Every source is a [`Loader`]; a [`MultiLoader`] runs them in
//! order against the same record.
//!
//! ```ignore
//! let server: Server = Multiconf::builder()
//!     .optional_file("server.toml")
//!     .env_prefix("APP")
//!     .flags()
//!     .load()?;
//! ```
//!
//! That call applies declared defaults, overlays `server.toml` if it exists,
//! then `APP_*` environment variables, then `--flags`, and finally checks that
//! every required field ended up set.
//!
//! # Declaring a record
//!
//! A record describes its fields once, with the [`record!`] macro. The field
//! table drives every loader: file keys, env var names and flag names are all
//! derived from it.
//!
//! ```ignore
//! #[derive(Debug, Default)]
//! struct Server {
//!     name: String,
//!     port: u16,
//!     timeout: Duration,
//!     postgres: Postgres,
//! }
//!
//! multiconf::record! {
//!     Server {
//!         name: value.required(),
//!         port: value.default("6060"),
//!         timeout: value.default("30s"),
//!         postgres: record::<Postgres>,
//!     }
//! }
//! ```
//!
//! Field metadata:
//!
//! - **`.default("...")`** is applied, as text, when a field is still at its
//!   zero value after a loader has run. Defaults never overwrite a value.
//! - **`.required()`** makes [`validate`] fail if the field is still zero.
//! - **`.rename("...")`** changes the external key (file key, env and flag
//!   segment) without touching the Rust name.
//! - **`.flatten()`** promotes a nested record's fields to the parent level.
//! - **`.skip()`** hides a field from every loader. Fields whose name starts
//!   with `_` are hidden too.
//!
//! Leaf types implement [`Value`]: strings, booleans, integers, floats,
//! [`Duration`](std::time::Duration) (`"1m30s"`), [`PathBuf`](std::path::PathBuf),
//! `Vec<T>` of any of those, and `Option<T>`.
//!
//! # Layer precedence
//!
//! ```text
//! Declared defaults     .default("...")
//!        ↑ overridden by
//! Config files          later files win
//!        ↑ overridden by
//! Environment vars      PREFIX_SECTION_KEY
//!        ↑ overridden by
//! Command-line flags    --section-key
//!        ↑ overridden by
//! Overrides             .cli_override() / .overrides_from()
//! ```
//!
//! Every layer is **sparse**: a loader only writes the fields its source has
//! evidence for. An env var that is not set, or a flag that is not passed,
//! leaves the field alone.
//!
//! [`MergePolicy::DefaultThenFill`] flips this around: the first loader
//! overlays, every later one only fills fields that are still zero.
//!
//! # Environment variables
//!
//! Names are the upper-cased key path joined with `_`, behind an optional
//! prefix. With prefix `APP`:
//!
//! | Field | Env var |
//! |-------|---------|
//! | `name` | `APP_NAME` |
//! | `postgres.db_name` | `APP_POSTGRES_DB_NAME` |
//! | `api.server.host` (flattened) | `APP_API_HOST` |
//!
//! Use [`EnvLoader::separator`] for `__` nesting. Lists are comma separated.
//!
//! # Flags
//!
//! With the `clap` feature (on by default), [`FlagLoader`] generates a clap
//! command from the record: one `--long` option per field, lower-cased with
//! `-` between segments. Boolean flags accept `--enabled` or `--enabled=false`.
//!
//! # Strict mode
//!
//! Strict mode is **off by default**. With
//! [`.strict(true)`](FileLoader::strict), a config file key that matches no
//! field fails the load with the key and, for TOML, its line:
//!
//! ```text
//! Unknown key 'typo_key' in server.toml (line 5)
//! ```
//!
//! # Errors
//!
//! All fallible operations return [`ConfError`]. Coercion errors are
//! collected: a source with three bad values reports all three. Errors from
//! a [`MultiLoader`] are wrapped with the name of the loader that failed.

pub mod error;
pub mod types;

mod builder;
mod compose;
mod duration;
mod env;
mod field;
mod file;
#[cfg(feature = "clap")]
mod flag;
mod loader;
mod overrides;
mod schema;
mod source;
mod strict;
mod validate;
mod value;
mod walk;

#[cfg(test)]
mod fixtures;

pub use builder::{Multiconf, MulticonfBuilder};
pub use compose::{LoadReport, MultiLoader, Provenance};
pub use duration::parse_duration;
pub use env::EnvLoader;
pub use error::ConfError;
pub use field::{Field, FieldMut, FieldRef, Record, Shape};
pub use file::{FileLoader, decode, load_file};
#[cfg(feature = "clap")]
pub use flag::FlagLoader;
pub use loader::{DefaultsLoader, Loader, Pass};
pub use overrides::{OverrideLoader, deep_merge};
pub use schema::{Descriptor, Leaf, Schema};
pub use source::{EmptySource, FlatSource, KeyStyle, Source, TreeSource};
pub use strict::check_unknown_keys;
pub use types::{FailurePolicy, Format, MergePolicy, WriteMode};
pub use validate::{MultiValidator, RequiredValidator, Validator, validate};
pub use value::{Kind, Raw, Scalar, ScalarKind, Value};
pub use walk::{Assignment, Origin, populate};
