//! Command-line flag loading, built on [clap](https://docs.rs/clap).
//!
//! This module is compiled only when the `clap` Cargo feature is enabled (on
//! by default).
//!
//! Flags are not declared by hand. At load time the record's schema is turned
//! into a clap [`Command`] with one `--long` option per leaf, named by
//! rendering the leaf's key path with [`KeyStyle::flag`]:
//!
//! | Field | Flag |
//! |-------|------|
//! | `name` | `--name` |
//! | `postgres.db_name` | `--postgres-db-name` |
//! | `api.server.host` (flattened) | `--api-host` |
//!
//! Boolean fields accept a bare `--enabled` or an explicit `--enabled=false`.
//! Only flags actually present on the command line count as evidence; an
//! omitted flag never resets a field to zero. Repeating a flag keeps the last
//! occurrence.
//!
//! Parse failures (unknown flags, missing values) surface as
//! [`ConfError::SourceUnavailable`] carrying clap's own message. There is no
//! built-in `--help`, so a field named `help` is an ordinary flag. Two fields
//! that render to the same flag name fail with [`ConfError::InvalidTag`].

use std::collections::HashMap;
use std::ffi::OsString;

use clap::builder::ValueParser;
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, Command};

use crate::error::ConfError;
use crate::field::Record;
use crate::loader::{Loader, Pass};
use crate::schema::Leaf;
use crate::source::{self, FlatSource, KeyStyle};
use crate::value::{Kind, ScalarKind};
use crate::walk::{self, Assignment};

/// Loads a record from command-line flags.
#[derive(Debug, Clone)]
pub struct FlagLoader {
    program: String,
    style: KeyStyle,
    args: Option<Vec<OsString>>,
}

impl Default for FlagLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl FlagLoader {
    /// Parse the process arguments (program name excluded).
    pub fn new() -> Self {
        Self {
            program: "app".into(),
            style: KeyStyle::flag(),
            args: None,
        }
    }

    /// Parse these arguments instead of the process arguments. The program
    /// name must not be included.
    pub fn args<I, T>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Program name shown in usage and error messages.
    pub fn program(mut self, name: impl Into<String>) -> Self {
        self.program = name.into();
        self
    }

    /// Prefix every flag, e.g. `--app-port` for prefix `app`.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.style = self.style.with_prefix(prefix);
        self
    }

    /// The clap command generated for these leaves.
    pub fn command(&self, leaves: &[Leaf]) -> Command {
        let args = leaves.iter().map(|leaf| self.arg(leaf));
        Command::new(self.program.clone())
            .no_binary_name(true)
            .disable_help_flag(true)
            .args_override_self(true)
            .args(args)
    }

    fn arg(&self, leaf: &Leaf) -> Arg {
        let id = self.style.render(&leaf.keys);
        let arg = Arg::new(id.clone())
            .long(id)
            .help(format!("{} ({})", leaf.path, leaf.kind))
            .action(ArgAction::Set)
            .value_parser(ValueParser::string());

        match leaf.kind {
            Kind::Scalar(ScalarKind::Bool) => arg
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true"),
            _ => arg.num_args(1),
        }
    }

    fn args_or_env(&self) -> Vec<OsString> {
        match &self.args {
            Some(args) => args.clone(),
            None => std::env::args_os().skip(1).collect(),
        }
    }
}

impl Loader for FlagLoader {
    fn name(&self) -> &str {
        "flags"
    }

    fn populate(&self, target: &mut dyn Record, pass: &Pass<'_>) -> Result<Vec<Assignment>, ConfError> {
        let leaves = pass.schema.leaves(target)?;
        if let Some(clash) = source::key_collisions(&self.style, &leaves).into_iter().next() {
            return Err(ConfError::InvalidTag {
                field: clash.second,
                reason: format!("flag --{} is already used by '{}'", clash.key, clash.first),
            });
        }

        let matches = self
            .command(&leaves)
            .try_get_matches_from(self.args_or_env())
            .map_err(|e| ConfError::unavailable("command-line flags", e))?;

        let mut given = HashMap::new();
        for leaf in &leaves {
            let id = self.style.render(&leaf.keys);
            if matches.value_source(&id) != Some(ValueSource::CommandLine) {
                continue;
            }
            if let Some(text) = matches.get_one::<String>(&id) {
                given.insert(id, text.clone());
            }
        }

        tracing::debug!(flags = given.len(), "parsed command-line flags");
        let source = FlatSource::new(self.style.clone(), given);
        walk::populate(target, pass.schema, &source, pass.mode)
    }
}
