//! Environment variable loading.
//!
//! Each leaf is looked up under its key path rendered with
//! [`KeyStyle::env`]: segments uppercased and joined by `_`, optionally
//! behind a prefix.
//!
//! | Prefix | Field | Variable |
//! |--------|-------|----------|
//! | none | `name` | `NAME` |
//! | none | `postgres.db_name` | `POSTGRES_DB_NAME` |
//! | `APP` | `postgres.port` | `APP_POSTGRES_PORT` |
//!
//! Values are plain text and go through the same coercion as every other
//! textual source: lists are comma separated, durations use `1h30m` syntax.
//! Variables that are empty, or whose name or value is not valid UTF-8, are
//! ignored: an empty variable never clears a value set by an earlier loader.
//!
//! Two fields can map to one variable, e.g. `postgres_port` and
//! `postgres.port` both read `POSTGRES_PORT`. Both are written and a warning
//! is logged; a `__` separator keeps them apart.

use crate::error::ConfError;
use crate::field::Record;
use crate::loader::{Loader, Pass};
use crate::source::{self, FlatSource, KeyStyle};
use crate::walk::{self, Assignment};

/// Loads a record from environment variables.
#[derive(Debug, Clone)]
pub struct EnvLoader {
    style: KeyStyle,
    vars: Option<Vec<(String, String)>>,
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvLoader {
    /// Read the process environment with no prefix.
    pub fn new() -> Self {
        Self {
            style: KeyStyle::env(),
            vars: None,
        }
    }

    /// Only consider variables starting with `{prefix}{separator}`.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.style = self.style.with_prefix(prefix);
        self
    }

    /// Segment separator (default: `_`).
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.style = self.style.with_separator(separator);
        self
    }

    /// Use these variables instead of the process environment.
    pub fn vars(mut self, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        self.vars = Some(vars.into_iter().collect());
        self
    }

    /// The variable name a key path maps to.
    pub fn var_name(&self, path: &[&str]) -> String {
        self.style.render(path)
    }

    /// Empty variables count as unset.
    fn snapshot(&self) -> FlatSource {
        let vars: Vec<(String, String)> = match &self.vars {
            Some(vars) => vars.clone(),
            None => std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                .collect(),
        };
        let vars = vars.into_iter().filter(|(_, value)| !value.is_empty());
        FlatSource::new(self.style.clone(), vars)
    }
}

impl Loader for EnvLoader {
    fn name(&self) -> &str {
        "env"
    }

    fn populate(&self, target: &mut dyn Record, pass: &Pass<'_>) -> Result<Vec<Assignment>, ConfError> {
        for clash in source::key_collisions(&self.style, &pass.schema.leaves(target)?) {
            tracing::warn!(
                var = %clash.key,
                first = %clash.first,
                second = %clash.second,
                "environment variable feeds more than one field"
            );
        }

        let source = self.snapshot();
        tracing::debug!(vars = source.len(), "read environment");
        walk::populate(target, pass.schema, &source, pass.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::MultiLoader;
    use crate::file::FileLoader;
    use crate::fixtures::test::{App, Clash, SERVER_TOML, Server, expected_server, server_env};
    use crate::types::Format;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let mut server = Server::default();
        EnvLoader::new().vars(vec![]).load(&mut server).unwrap();
        assert_eq!(server.port, 6060);
        assert!(server.name.is_empty());
    }

    #[test]
    fn full_server_from_env() {
        let mut server = Server::default();
        EnvLoader::new().vars(server_env()).load(&mut server).unwrap();
        assert_eq!(server, expected_server());
    }

    #[test]
    fn prefix_scopes_variables() {
        let mut server = Server::default();
        EnvLoader::new()
            .prefix("APP")
            .vars(vars(&[
                ("APP_NAME", "koding"),
                ("NAME", "ignored"),
                ("APP_POSTGRES_PORT", "5432"),
            ]))
            .load(&mut server)
            .unwrap();
        assert_eq!(server.name, "koding");
        assert_eq!(server.postgres.port, 5432);
    }

    #[test]
    fn lowercase_prefix_is_uppercased() {
        let loader = EnvLoader::new().prefix("app");
        assert_eq!(loader.var_name(&["postgres", "db_name"]), "APP_POSTGRES_DB_NAME");
    }

    #[test]
    fn double_underscore_separator() {
        let mut server = Server::default();
        EnvLoader::new()
            .prefix("APP")
            .separator("__")
            .vars(vars(&[("APP__POSTGRES__DB_NAME", "prod")]))
            .load(&mut server)
            .unwrap();
        assert_eq!(server.postgres.db_name, "prod");
    }

    #[test]
    fn flattened_fields_use_parent_namespace() {
        let mut app = App::default();
        EnvLoader::new()
            .vars(vars(&[("API_HOST", "api.myapp.com"), ("MONGO_DB_NAME", "db")]))
            .load(&mut app)
            .unwrap();
        assert_eq!(app.api.server.host, "api.myapp.com");
        assert_eq!(app.mongo.db_name, "db");
    }

    #[test]
    fn empty_variable_keeps_earlier_value() {
        let chain = MultiLoader::new(vec![
            Box::new(FileLoader::inline(SERVER_TOML, Format::Toml)),
            Box::new(EnvLoader::new().vars(vars(&[("NAME", ""), ("USERS", "")]))),
        ]);
        let mut server = Server::default();
        let report = chain.load(&mut server).unwrap();
        assert_eq!(server.name, "koding");
        assert_eq!(server.users, vec!["ankara", "istanbul"]);
        assert_eq!(report.source_of("name").unwrap().loader, "inline toml");
    }

    #[test]
    fn shared_variable_feeds_both_fields() {
        let mut clash = Clash::default();
        EnvLoader::new()
            .vars(vars(&[("POSTGRES_PORT", "5432")]))
            .load(&mut clash)
            .unwrap();
        assert_eq!(clash.postgres_port, 5432);
        assert_eq!(clash.postgres.port, 5432);

        let mut apart = Clash::default();
        EnvLoader::new()
            .separator("__")
            .vars(vars(&[("POSTGRES_PORT", "1"), ("POSTGRES__PORT", "2")]))
            .load(&mut apart)
            .unwrap();
        assert_eq!((apart.postgres_port, apart.postgres.port), (1, 2));
    }

    #[test]
    fn process_environment_is_read() {
        let mut server = Server::default();
        EnvLoader::new()
            .prefix("MULTICONF_UNUSED_PREFIX")
            .load(&mut server)
            .unwrap();
        assert_eq!(server.port, 6060);
        assert!(server.name.is_empty());
    }
}
