//! Programmatic overrides: values set from code, applied as a tree source.
//!
//! Keys are dotted external key paths, the same paths a config file uses:
//! `postgres.port`, or `api.host` for a flattened field. Overrides are
//! collected into one nested table; later entries win, and a table always
//! replaces a scalar at the same key (and vice versa).
//!
//! Any `serde::Serialize` value can be merged in as well, which is handy for
//! clap-derived argument structs. `None` fields are skipped, so optional
//! arguments that were not given do not override anything. Keys that match no
//! field are never looked up and therefore ignored.

use serde::Serialize;
use toml::{Table, Value};

use crate::error::ConfError;
use crate::field::Record;
use crate::loader::{Loader, Pass};
use crate::source::TreeSource;
use crate::walk::{self, Assignment};

/// Loads a record from values supplied in code.
#[derive(Debug, Clone, Default)]
pub struct OverrideLoader {
    table: Table,
}

impl OverrideLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value at a dotted key path.
    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value.into());
        self
    }

    /// Like [`set`](Self::set), but `None` leaves the key alone.
    pub fn set_some<V: Into<Value>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.set(key, value),
            None => self,
        }
    }

    /// Merge every field of a serializable value, skipping `None`s.
    pub fn merge_serialized<S: Serialize>(mut self, source: &S) -> Result<Self, ConfError> {
        let value = Value::try_from(source)
            .map_err(|e| ConfError::unavailable("serialized overrides", e))?;
        let Value::Table(table) = value else {
            return Err(ConfError::unavailable(
                "serialized overrides",
                format!("expected a struct or map, found {}", value.type_str()),
            ));
        };
        self.table = deep_merge(std::mem::take(&mut self.table), table);
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    fn insert(&mut self, key: &str, value: Value) {
        let nested = key
            .rsplit('.')
            .fold(value, |inner, segment| {
                Value::Table(Table::from_iter([(segment.to_string(), inner)]))
            });
        if let Value::Table(overlay) = nested {
            self.table = deep_merge(std::mem::take(&mut self.table), overlay);
        }
    }
}

impl Loader for OverrideLoader {
    fn name(&self) -> &str {
        "overrides"
    }

    fn populate(&self, target: &mut dyn Record, pass: &Pass<'_>) -> Result<Vec<Assignment>, ConfError> {
        walk::populate(target, pass.schema, &TreeSource::new(&self.table), pass.mode)
    }
}

/// Merge `overlay` on top of `base`. Tables merge key by key; anything else in
/// `overlay` replaces what `base` had.
pub fn deep_merge(mut base: Table, overlay: Table) -> Table {
    for (key, value) in overlay {
        let merged = match (base.remove(&key), value) {
            (Some(Value::Table(below)), Value::Table(above)) => Value::Table(deep_merge(below, above)),
            (_, value) => value,
        };
        base.insert(key, merged);
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{App, Server};

    fn table(toml_str: &str) -> Table {
        toml_str.parse::<Table>().unwrap()
    }

    #[test]
    fn dotted_keys_nest() {
        let loader = OverrideLoader::new()
            .set("name", "koding")
            .set("postgres.port", 5432)
            .set("postgres.enabled", true);
        let t = loader.table();
        assert_eq!(t["name"].as_str(), Some("koding"));
        assert_eq!(t["postgres"]["port"].as_integer(), Some(5432));
        assert_eq!(t["postgres"]["enabled"].as_bool(), Some(true));
    }

    #[test]
    fn last_set_wins() {
        let loader = OverrideLoader::new().set("port", 3000).set("port", 5000);
        assert_eq!(loader.table()["port"].as_integer(), Some(5000));
    }

    #[test]
    fn scalar_replaced_by_table() {
        let loader = OverrideLoader::new()
            .set("postgres", "flat")
            .set("postgres.port", 1);
        assert_eq!(loader.table()["postgres"]["port"].as_integer(), Some(1));
    }

    #[test]
    fn set_some_skips_none() {
        let loader = OverrideLoader::new()
            .set_some("name", None::<String>)
            .set_some("port", Some(8080));
        assert!(!loader.table().contains_key("name"));
        assert_eq!(loader.table()["port"].as_integer(), Some(8080));
    }

    #[test]
    fn loads_into_record() {
        let mut server = Server::default();
        OverrideLoader::new()
            .set("name", "koding")
            .set("postgres.hosts", vec!["a", "b"])
            .set("interval", "1m")
            .load(&mut server)
            .unwrap();
        assert_eq!(server.name, "koding");
        assert_eq!(server.postgres.hosts, vec!["a", "b"]);
        assert_eq!(server.interval, std::time::Duration::from_secs(60));
        assert_eq!(server.port, 6060);
    }

    #[test]
    fn flattened_key_paths() {
        let mut app = App::default();
        OverrideLoader::new()
            .set("api.host", "api.myapp.com")
            .load(&mut app)
            .unwrap();
        assert_eq!(app.api.server.host, "api.myapp.com");
    }

    #[derive(Serialize)]
    struct Args {
        name: Option<String>,
        port: Option<i64>,
        verbose: bool,
        postgres: PgArgs,
    }

    #[derive(Serialize)]
    struct PgArgs {
        db_name: Option<String>,
    }

    #[test]
    fn serialized_source_skips_none_and_ignores_extra_keys() {
        let args = Args {
            name: None,
            port: Some(9000),
            verbose: true,
            postgres: PgArgs {
                db_name: Some("prod".into()),
            },
        };
        let mut server = Server {
            name: "kept".into(),
            ..Server::default()
        };
        OverrideLoader::new()
            .merge_serialized(&args)
            .unwrap()
            .load(&mut server)
            .unwrap();
        assert_eq!(server.name, "kept");
        assert_eq!(server.port, 9000);
        assert_eq!(server.postgres.db_name, "prod");
    }

    #[test]
    fn serialized_scalar_is_rejected() {
        let err = OverrideLoader::new().merge_serialized(&42).unwrap_err();
        assert!(matches!(err, ConfError::SourceUnavailable { .. }));
    }

    #[test]
    fn merge_recurses_into_tables() {
        let base = table("[database]\nurl = \"old\"\npool_size = 5\n");
        let overlay = table("[database]\npool_size = 20\n");
        let merged = deep_merge(base, overlay);
        assert_eq!(merged["database"]["url"].as_str(), Some("old"));
        assert_eq!(merged["database"]["pool_size"].as_integer(), Some(20));
    }

    #[test]
    fn merge_overlay_scalar_replaces_table() {
        let merged = deep_merge(table("[database]\nurl = \"x\"\n"), table("database = \"flat\"\n"));
        assert_eq!(merged["database"].as_str(), Some("flat"));
    }
}
