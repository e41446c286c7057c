//! Structured-file loading (TOML, JSON, YAML).
//!
//! Every format is decoded into one generic tree, a `toml::Table`, which the
//! walker then consults like any other source. That keeps defaults, renames,
//! flattening and coercion identical across formats:
//!
//! - JSON and YAML are decoded with their own crates and converted node by
//!   node. `null` means "absent": the key is dropped, so the field keeps its
//!   current value (or picks up its default).
//! - The format comes from the file extension unless set explicitly.
//!
//! A missing file, an unreadable file, or content that does not decode is a
//! [`ConfError::SourceUnavailable`]. Optional files are the exception: when
//! one does not exist the loader writes nothing.

use std::path::{Path, PathBuf};

use toml::Table;

use crate::error::ConfError;
use crate::field::Record;
use crate::loader::{Loader, Pass};
use crate::source::TreeSource;
use crate::strict;
use crate::types::Format;
use crate::walk::{self, Assignment};

#[derive(Debug, Clone)]
enum Input {
    Path(PathBuf),
    Inline(String),
}

/// Loads a record from a config file or from in-memory file content.
#[derive(Debug, Clone)]
pub struct FileLoader {
    input: Input,
    format: Option<Format>,
    strict: bool,
    optional: bool,
    name: String,
}

impl FileLoader {
    /// Load from `path`, picking the format from its extension.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: path.display().to_string(),
            input: Input::Path(path),
            format: None,
            strict: false,
            optional: false,
        }
    }

    /// Load from file content already in memory.
    pub fn inline(content: impl Into<String>, format: Format) -> Self {
        Self {
            name: format!("inline {}", format.name()),
            input: Input::Inline(content.into()),
            format: Some(format),
            strict: false,
            optional: false,
        }
    }

    /// Force a format regardless of the file extension.
    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// Reject keys that no field consumes (default: `false`).
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Treat a missing file as empty instead of failing (default: `false`).
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    fn resolve_format(&self) -> Result<Format, ConfError> {
        if let Some(format) = self.format {
            return Ok(format);
        }
        let Input::Path(path) = &self.input else {
            return Err(ConfError::unavailable(&self.name, "no format given"));
        };
        Format::from_extension(path).ok_or_else(|| {
            ConfError::unavailable(
                &self.name,
                format!("cannot tell the format of {}", path.display()),
            )
        })
    }

    /// Read the raw content. `None` means an optional file is missing.
    fn read(&self) -> Result<Option<String>, ConfError> {
        match &self.input {
            Input::Inline(content) => Ok(Some(content.clone())),
            Input::Path(path) => match std::fs::read_to_string(path) {
                Ok(content) => Ok(Some(content)),
                Err(e) if self.optional && e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!(path = %path.display(), "optional config file not found");
                    Ok(None)
                }
                Err(e) => Err(ConfError::unavailable(&self.name, e)),
            },
        }
    }
}

impl Loader for FileLoader {
    fn name(&self) -> &str {
        &self.name
    }

    fn populate(&self, target: &mut dyn Record, pass: &Pass<'_>) -> Result<Vec<Assignment>, ConfError> {
        let format = self.resolve_format()?;
        let table = match self.read()? {
            Some(content) => {
                let table = decode(&content, format, &self.name)?;
                if self.strict {
                    let toml_text = (format == Format::Toml).then_some(content.as_str());
                    strict::check_unknown_keys(&table, pass.schema, toml_text, &self.name)?;
                }
                table
            }
            None => Table::new(),
        };

        tracing::debug!(file = %self.name, format = format.name(), keys = table.len(), "decoded config file");
        walk::populate(target, pass.schema, &TreeSource::new(&table), pass.mode)
    }
}

/// Decode file content into the generic tree.
pub fn decode(content: &str, format: Format, origin: &str) -> Result<Table, ConfError> {
    match format {
        Format::Toml => toml::from_str(content).map_err(|e| ConfError::unavailable(origin, e)),
        Format::Json => {
            let value: serde_json::Value =
                serde_json::from_str(content).map_err(|e| ConfError::unavailable(origin, e))?;
            root_table(value, origin)
        }
        #[cfg(feature = "yaml")]
        Format::Yaml => {
            if content.trim().is_empty() {
                return Ok(Table::new());
            }
            let value: serde_json::Value =
                serde_yaml::from_str(content).map_err(|e| ConfError::unavailable(origin, e))?;
            root_table(value, origin)
        }
    }
}

fn root_table(value: serde_json::Value, origin: &str) -> Result<Table, ConfError> {
    match from_json(value) {
        Some(toml::Value::Table(table)) => Ok(table),
        None => Ok(Table::new()),
        Some(other) => Err(ConfError::unavailable(
            origin,
            format!("top level must be a mapping, found {}", other.type_str()),
        )),
    }
}

/// Convert a JSON node into a TOML node. `null` becomes `None`.
fn from_json(value: serde_json::Value) -> Option<toml::Value> {
    use serde_json::Value as Json;

    Some(match value {
        Json::Null => return None,
        Json::Bool(b) => toml::Value::Boolean(b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => toml::Value::Integer(i),
            None => toml::Value::Float(n.as_f64()?),
        },
        Json::String(s) => toml::Value::String(s),
        Json::Array(items) => toml::Value::Array(items.into_iter().filter_map(from_json).collect()),
        Json::Object(map) => toml::Value::Table(
            map.into_iter()
                .filter_map(|(k, v)| Some((k, from_json(v)?)))
                .collect(),
        ),
    })
}

/// Convenience for one-off loads: `load_file(path, &mut config)`.
pub fn load_file<R: Record + 'static>(path: impl AsRef<Path>, target: &mut R) -> Result<Vec<Assignment>, ConfError> {
    FileLoader::path(path.as_ref()).load(target)
}
