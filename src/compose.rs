//! Running several loaders against one record.
//!
//! A [`MultiLoader`] drives its loaders in order against the same record. The
//! [`MergePolicy`] decides the write mode of each loader, the
//! [`FailurePolicy`] decides what a failing loader does to the rest of the
//! chain. Every failure is wrapped as [`ConfError::Loader`] with the loader's
//! name.
//!
//! Loading returns a [`LoadReport`] that records, per field, which loader
//! wrote it last and whether the value came from the source or a default.
//!
//! Validation is separate: call [`MultiLoader::validate`] after loading.

use std::collections::HashMap;

use crate::error::ConfError;
use crate::field::Record;
use crate::loader::{Loader, Pass};
use crate::schema::Schema;
use crate::types::{FailurePolicy, MergePolicy};
use crate::validate::{MultiValidator, RequiredValidator, Validator};
use crate::walk::{Assignment, Origin};

/// Which loader last wrote a field, and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub loader: String,
    pub origin: Origin,
}

/// What a [`MultiLoader`] run did.
#[derive(Debug, Default)]
pub struct LoadReport {
    provenance: HashMap<String, Provenance>,
    skipped: Vec<ConfError>,
}

impl LoadReport {
    /// Where the current value of `field` (qualified name) came from. `None`
    /// if no loader wrote it.
    pub fn source_of(&self, field: &str) -> Option<&Provenance> {
        self.provenance.get(field)
    }

    /// Fields written during the run, sorted by name.
    pub fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = self.provenance.keys().map(String::as_str).collect();
        fields.sort_unstable();
        fields
    }

    /// Failures that were skipped under [`FailurePolicy::BestEffort`].
    pub fn skipped(&self) -> &[ConfError] {
        &self.skipped
    }

    fn record(&mut self, loader: &str, written: Vec<Assignment>) {
        for assignment in written {
            self.provenance.insert(
                assignment.field,
                Provenance {
                    loader: loader.to_string(),
                    origin: assignment.origin,
                },
            );
        }
    }
}

/// An ordered chain of loaders with merge and failure policies.
pub struct MultiLoader {
    loaders: Vec<Box<dyn Loader>>,
    merge_policy: MergePolicy,
    failure_policy: FailurePolicy,
    validator: MultiValidator,
}

impl MultiLoader {
    /// Loaders run in the given order. With the default overlay policy the
    /// last loader has the highest precedence.
    pub fn new(loaders: Vec<Box<dyn Loader>>) -> Self {
        Self {
            loaders,
            merge_policy: MergePolicy::default(),
            failure_policy: FailurePolicy::default(),
            validator: MultiValidator::default(),
        }
    }

    /// Append a loader at the end of the chain.
    pub fn with(mut self, loader: impl Loader + 'static) -> Self {
        self.loaders.push(Box::new(loader));
        self
    }

    pub fn merge_policy(mut self, policy: MergePolicy) -> Self {
        self.merge_policy = policy;
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Add a validator run by [`validate`](Self::validate). With none added,
    /// validation checks required fields.
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = self.validator.push(validator);
        self
    }

    /// Loader names in run order.
    pub fn loader_names(&self) -> Vec<&str> {
        self.loaders.iter().map(|l| l.name()).collect()
    }

    /// Run every loader against `target`.
    pub fn load<R: Record + 'static>(&self, target: &mut R) -> Result<LoadReport, ConfError> {
        let schema = Schema::of::<R>()?;
        self.run(target, &schema)
    }

    /// Run the configured validators against `target`.
    pub fn validate<R: Record + 'static>(&self, target: &R) -> Result<(), ConfError> {
        let schema = Schema::of::<R>()?;
        if self.validator.is_empty() {
            RequiredValidator.validate(target, &schema)
        } else {
            self.validator.validate(target, &schema)
        }
    }

    fn run(&self, target: &mut dyn Record, schema: &Schema) -> Result<LoadReport, ConfError> {
        let mut report = LoadReport::default();

        for (position, loader) in self.loaders.iter().enumerate() {
            let pass = Pass::new(schema).with_mode(self.merge_policy.write_mode(position));
            tracing::debug!(loader = loader.name(), mode = ?pass.mode, "running loader");

            match loader.populate(target, &pass) {
                Ok(written) => report.record(loader.name(), written),
                Err(err) => {
                    let err = ConfError::Loader {
                        loader: loader.name().to_string(),
                        source: Box::new(err),
                    };
                    match self.failure_policy {
                        FailurePolicy::AbortOnFirst => return Err(err),
                        FailurePolicy::BestEffort => {
                            tracing::warn!(loader = loader.name(), error = %err, "skipping failed loader");
                            report.skipped.push(err);
                        }
                    }
                }
            }
        }

        Ok(report)
    }
}

impl Loader for MultiLoader {
    fn name(&self) -> &str {
        "multi"
    }

    /// Runs the whole chain. The outer pass's write mode is ignored; each
    /// inner loader gets the mode its position and merge policy call for.
    fn populate(&self, target: &mut dyn Record, pass: &Pass<'_>) -> Result<Vec<Assignment>, ConfError> {
        let report = self.run(target, pass.schema)?;
        Ok(report
            .provenance
            .into_iter()
            .map(|(field, provenance)| Assignment {
                field,
                origin: provenance.origin,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::EnvLoader;
    use crate::file::FileLoader;
    use crate::fixtures::test::{Named, SERVER_TOML, Server, expected_server};
    use crate::loader::DefaultsLoader;
    use crate::overrides::OverrideLoader;
    use crate::types::Format;

    fn env(pairs: &[(&str, &str)]) -> EnvLoader {
        EnvLoader::new().vars(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn later_loader_overlays_earlier() {
        let chain = MultiLoader::new(vec![])
            .with(OverrideLoader::new().set("name", "a").set("id", 1))
            .with(OverrideLoader::new().set("name", "b"));
        let mut server = Server::default();
        chain.load(&mut server).unwrap();
        assert_eq!(server.name, "b");
        assert_eq!(server.id, 1);
    }

    #[test]
    fn default_then_fill_keeps_baseline() {
        let chain = MultiLoader::new(vec![])
            .with(OverrideLoader::new().set("name", "a"))
            .with(OverrideLoader::new().set("name", "b").set("id", 2))
            .merge_policy(MergePolicy::DefaultThenFill);
        let mut server = Server::default();
        chain.load(&mut server).unwrap();
        assert_eq!(server.name, "a");
        assert_eq!(server.id, 2);
    }

    #[test]
    fn file_then_env_precedence() {
        let chain = MultiLoader::new(vec![
            Box::new(DefaultsLoader),
            Box::new(FileLoader::inline(SERVER_TOML, Format::Toml)),
            Box::new(env(&[("PORT", "7000"), ("POSTGRES_DB_NAME", "prod")])),
        ]);
        let mut server = Server::default();
        let report = chain.load(&mut server).unwrap();

        assert_eq!(server.name, "koding");
        assert_eq!(server.port, 7000);
        assert_eq!(server.postgres.db_name, "prod");

        assert_eq!(report.source_of("port").unwrap().loader, "env");
        assert_eq!(report.source_of("name").unwrap().loader, "inline toml");
        let db = report.source_of("postgres.db_name").unwrap();
        assert_eq!((db.loader.as_str(), db.origin), ("env", Origin::Source));
        assert!(report.source_of("_unexported").is_none());
    }

    #[test]
    fn report_marks_defaults() {
        let chain = MultiLoader::new(vec![Box::new(DefaultsLoader)]);
        let mut server = Server::default();
        let report = chain.load(&mut server).unwrap();
        assert_eq!(report.fields(), vec!["port", "postgres.db_name"]);
        assert_eq!(report.source_of("port").unwrap().origin, Origin::Default);
    }

    #[test]
    fn abort_on_first_wraps_and_stops() {
        let chain = MultiLoader::new(vec![])
            .with(OverrideLoader::new().set("name", "first"))
            .with(FileLoader::path("/definitely/not/here.toml"))
            .with(OverrideLoader::new().set("id", 9));
        let mut server = Server::default();
        let err = chain.load(&mut server).unwrap_err();

        let ConfError::Loader { loader, source } = &err else {
            panic!("expected Loader error, got {err:?}");
        };
        assert_eq!(loader, "/definitely/not/here.toml");
        assert!(matches!(**source, ConfError::SourceUnavailable { .. }));
        assert_eq!(server.name, "first");
        assert_eq!(server.id, 0);
    }

    #[test]
    fn best_effort_skips_and_continues() {
        let chain = MultiLoader::new(vec![])
            .with(FileLoader::path("/definitely/not/here.toml"))
            .with(env(&[("NAME", "koding"), ("ID", "oops")]))
            .with(OverrideLoader::new().set("id", 9))
            .failure_policy(FailurePolicy::BestEffort);
        let mut server = Server::default();
        let report = chain.load(&mut server).unwrap();

        assert_eq!(server.name, "koding");
        assert_eq!(server.id, 9);
        assert_eq!(report.skipped().len(), 2);
        assert!(matches!(
            &report.skipped()[1],
            ConfError::Loader { loader, .. } if loader == "env"
        ));
    }

    #[test]
    fn loading_twice_is_idempotent() {
        let chain = MultiLoader::new(vec![
            Box::new(DefaultsLoader),
            Box::new(FileLoader::inline(SERVER_TOML, Format::Toml)),
            Box::new(env(&[("NAME", "env-name")])),
        ]);
        let mut first = Server::default();
        chain.load(&mut first).unwrap();
        let mut second = Server::default();
        chain.load(&mut second).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.name, "env-name");
    }

    #[test]
    fn load_never_validates() {
        let chain = MultiLoader::new(vec![Box::new(DefaultsLoader)]);
        let mut server = Server::default();
        assert!(chain.load(&mut server).is_ok());
        assert!(matches!(
            chain.validate(&server),
            Err(ConfError::RequiredFields(_))
        ));
    }

    #[test]
    fn name_and_port_scenario() {
        let chain = MultiLoader::new(vec![Box::new(DefaultsLoader), Box::new(env(&[]))]);
        let mut empty = Named::default();
        chain.load(&mut empty).unwrap();
        assert_eq!(empty.port, 6060);
        let err = chain.validate(&empty).unwrap_err();
        let ConfError::RequiredFields(missing) = &err else {
            panic!("expected RequiredFields, got {err:?}");
        };
        let fields: Vec<_> = missing.iter().filter_map(ConfError::field).collect();
        assert_eq!(fields, vec!["name"]);

        let chain = MultiLoader::new(vec![
            Box::new(DefaultsLoader),
            Box::new(env(&[("NAME", "koding")])),
        ]);
        let mut named = Named::default();
        chain.load(&mut named).unwrap();
        assert_eq!(named.name, "koding");
        assert_eq!(named.port, 6060);
        assert!(chain.validate(&named).is_ok());
    }

    #[test]
    fn custom_validator_replaces_required_check() {
        struct AcceptAll;
        impl Validator for AcceptAll {
            fn validate(&self, _record: &dyn Record, _schema: &Schema) -> Result<(), ConfError> {
                Ok(())
            }
        }
        let chain = MultiLoader::new(vec![]).validator(AcceptAll);
        assert!(chain.validate(&Server::default()).is_ok());
        assert!(
            MultiLoader::new(vec![])
                .validator(AcceptAll)
                .validator(RequiredValidator)
                .validate(&Server::default())
                .is_err()
        );
    }

    #[test]
    fn chain_is_itself_a_loader() {
        let inner = MultiLoader::new(vec![]).with(FileLoader::inline(SERVER_TOML, Format::Toml));
        let outer = MultiLoader::new(vec![Box::new(DefaultsLoader), Box::new(inner)]);
        let mut server = Server::default();
        let report = outer.load(&mut server).unwrap();
        assert_eq!(server, expected_server());
        assert_eq!(report.source_of("name").unwrap().loader, "multi");
        assert_eq!(outer.loader_names(), vec!["defaults", "multi"]);
    }
}
