#[cfg(feature = "clap")]
use std::ffi::OsString;
use std::path::PathBuf;

use serde::Serialize;

use crate::compose::{LoadReport, MultiLoader};
use crate::env::EnvLoader;
use crate::error::ConfError;
use crate::field::Record;
use crate::file::FileLoader;
#[cfg(feature = "clap")]
use crate::flag::FlagLoader;
use crate::loader::{DefaultsLoader, Loader};
use crate::overrides::OverrideLoader;
use crate::types::{FailurePolicy, MergePolicy};

/// Entry point for building the standard loader stack.
pub struct Multiconf;

impl Multiconf {
    pub fn builder() -> MulticonfBuilder {
        MulticonfBuilder::new()
    }
}

#[derive(Debug, Clone)]
struct FileEntry {
    path: PathBuf,
    optional: bool,
}

/// Builder for the standard stack, in precedence order:
///
/// ```text
/// Declared defaults     Field::default("...")
///        ↑ overridden by
/// Config files          .file() / .optional_file(), later files win
///        ↑ overridden by
/// Environment vars      PREFIX_KEY (on unless .no_env())
///        ↑ overridden by
/// Command-line flags    --key (with .flags(), feature `clap`)
///        ↑ overridden by
/// Overrides             .cli_override() / .overrides_from()
/// ```
#[derive(Debug)]
pub struct MulticonfBuilder {
    files: Vec<FileEntry>,
    strict: bool,
    env_enabled: bool,
    env_prefix: Option<String>,
    env_separator: Option<String>,
    env_vars: Option<Vec<(String, String)>>,
    #[cfg(feature = "clap")]
    flags: Option<FlagLoader>,
    overrides: OverrideLoader,
    merge_policy: MergePolicy,
    failure_policy: FailurePolicy,
    deferred_error: Option<ConfError>,
}

impl MulticonfBuilder {
    fn new() -> Self {
        Self {
            files: Vec::new(),
            strict: false,
            env_enabled: true,
            env_prefix: None,
            env_separator: None,
            env_vars: None,
            #[cfg(feature = "clap")]
            flags: None,
            overrides: OverrideLoader::new(),
            merge_policy: MergePolicy::default(),
            failure_policy: FailurePolicy::default(),
            deferred_error: None,
        }
    }

    /// Load a config file. A missing file fails the load.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(FileEntry {
            path: path.into(),
            optional: false,
        });
        self
    }

    /// Load a config file if it exists.
    pub fn optional_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(FileEntry {
            path: path.into(),
            optional: true,
        });
        self
    }

    /// Enable or disable strict mode for config files (default: `false`).
    /// In strict mode, unknown keys in config files produce errors.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Only read environment variables under this prefix (default: none).
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Separator between env var segments (default: `_`).
    pub fn env_separator(mut self, separator: &str) -> Self {
        self.env_separator = Some(separator.to_string());
        self
    }

    /// Disable environment variable loading entirely.
    pub fn no_env(mut self) -> Self {
        self.env_enabled = false;
        self
    }

    /// Read these variables instead of the process environment.
    pub fn env_vars(mut self, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        self.env_vars = Some(vars.into_iter().collect());
        self
    }

    /// Load command-line flags from the process arguments.
    #[cfg(feature = "clap")]
    pub fn flags(mut self) -> Self {
        self.flags = Some(FlagLoader::new());
        self
    }

    /// Load command-line flags from these arguments (program name excluded).
    #[cfg(feature = "clap")]
    pub fn flag_args<I, T>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        self.flags = Some(FlagLoader::new().args(args));
        self
    }

    /// Add an override at a dotted key path. `None` values are ignored, which
    /// suits optional clap arguments.
    pub fn cli_override<V: Into<toml::Value>>(mut self, key: &str, value: Option<V>) -> Self {
        self.overrides = self.overrides.set_some(key, value);
        self
    }

    /// Add overrides from any serializable value, skipping `None` fields.
    ///
    /// Keys that match no field are ignored, so a whole clap-derived struct can
    /// be passed. A value that cannot be serialized into a table is reported by
    /// [`build`](Self::build).
    pub fn overrides_from<S: Serialize>(mut self, source: &S) -> Self {
        match self.overrides.clone().merge_serialized(source) {
            Ok(merged) => self.overrides = merged,
            Err(err) => {
                self.deferred_error.get_or_insert(err);
            }
        }
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

    fn env_loader(&self) -> Option<EnvLoader> {
        if !self.env_enabled {
            return None;
        }
        let mut env = EnvLoader::new();
        if let Some(prefix) = &self.env_prefix {
            env = env.prefix(prefix.as_str());
        }
        if let Some(separator) = &self.env_separator {
            env = env.separator(separator.as_str());
        }
        if let Some(vars) = &self.env_vars {
            env = env.vars(vars.clone());
        }
        Some(env)
    }

    /// Assemble the loader chain.
    pub fn build(mut self) -> Result<MultiLoader, ConfError> {
        if let Some(err) = self.deferred_error.take() {
            return Err(err);
        }

        let mut loaders: Vec<Box<dyn Loader>> = vec![Box::new(DefaultsLoader)];
        for entry in &self.files {
            loaders.push(Box::new(
                FileLoader::path(&entry.path)
                    .strict(self.strict)
                    .optional(entry.optional),
            ));
        }
        if let Some(env) = self.env_loader() {
            loaders.push(Box::new(env));
        }
        #[cfg(feature = "clap")]
        if let Some(flags) = self.flags {
            loaders.push(Box::new(flags));
        }
        if !self.overrides.is_empty() {
            loaders.push(Box::new(self.overrides));
        }

        Ok(MultiLoader::new(loaders)
            .merge_policy(self.merge_policy)
            .failure_policy(self.failure_policy))
    }

    /// Load into an existing record. Does not validate.
    pub fn load_into<R: Record + 'static>(self, target: &mut R) -> Result<LoadReport, ConfError> {
        self.build()?.load(target)
    }

    /// Load a fresh record and check its required fields.
    pub fn load<R: Record + Default + 'static>(self) -> Result<R, ConfError> {
        let chain = self.build()?;
        let mut record = R::default();
        chain.load(&mut record)?;
        chain.validate(&record)?;
        Ok(record)
    }
}
