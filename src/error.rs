use thiserror::Error;

use crate::value::Kind;

type BoxedCause = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
#[cfg_attr(feature = "rich-errors", derive(miette::Diagnostic))]
pub enum ConfError {
    #[error("{origin} is unavailable: {cause}")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(code(multiconf::source_unavailable))
    )]
    SourceUnavailable {
        origin: String,
        #[source]
        cause: BoxedCause,
    },

    #[error("Invalid value {raw:?} for '{field}': expected {kind} ({reason})")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(multiconf::type_mismatch)))]
    TypeMismatch {
        field: String,
        raw: String,
        kind: Kind,
        reason: String,
    },

    #[error("Could not coerce {} field(s): {}", .0.len(), join(.0))]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(multiconf::type_mismatch)))]
    TypeMismatches(Vec<ConfError>),

    #[error("Invalid field metadata for '{field}': {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(multiconf::invalid_tag)))]
    InvalidTag { field: String, reason: String },

    #[error("Required field '{field}' is not set")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(
            code(multiconf::required),
            help("set it in a config file, the environment, or a flag")
        )
    )]
    RequiredField { field: String },

    #[error("Missing required configuration: {}", join(.0))]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(multiconf::required)))]
    RequiredFields(Vec<ConfError>),

    #[error("Unknown key '{key}' in {origin} (line {line})")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(multiconf::unknown_key)))]
    UnknownKey {
        key: String,
        origin: String,
        line: usize,
    },

    #[error("Unknown keys in config file: {}", join(.0))]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(multiconf::unknown_key)))]
    UnknownKeys(Vec<ConfError>),

    #[error("Loader '{loader}' failed: {source}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(multiconf::loader)))]
    Loader {
        loader: String,
        source: Box<ConfError>,
    },
}

impl ConfError {
    pub(crate) fn unavailable(origin: impl Into<String>, cause: impl Into<BoxedCause>) -> Self {
        ConfError::SourceUnavailable {
            origin: origin.into(),
            cause: cause.into(),
        }
    }

    /// Qualified field name carried by a per-field error, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            ConfError::TypeMismatch { field, .. }
            | ConfError::InvalidTag { field, .. }
            | ConfError::RequiredField { field } => Some(field),
            ConfError::Loader { source, .. } => source.field(),
            _ => None,
        }
    }
}

fn join(errors: &[ConfError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ScalarKind;

    #[test]
    fn type_mismatch_formats_correctly() {
        let err = ConfError::TypeMismatch {
            field: "postgres.port".into(),
            raw: "abc".into(),
            kind: Kind::Scalar(ScalarKind::Integer("u16")),
            reason: "invalid digit found in string".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("postgres.port"));
        assert!(msg.contains("\"abc\""));
        assert!(msg.contains("u16"));
    }

    #[test]
    fn required_fields_lists_every_field() {
        let err = ConfError::RequiredFields(vec![
            ConfError::RequiredField {
                field: "name".into(),
            },
            ConfError::RequiredField {
                field: "postgres.hosts".into(),
            },
        ]);
        let msg = err.to_string();
        assert!(msg.contains("'name'"));
        assert!(msg.contains("'postgres.hosts'"));
    }

    #[test]
    fn loader_error_names_loader_and_cause() {
        let err = ConfError::Loader {
            loader: "env".into(),
            source: Box::new(ConfError::RequiredField {
                field: "name".into(),
            }),
        };
        let msg = err.to_string();
        assert!(msg.contains("env"));
        assert!(msg.contains("name"));
        assert_eq!(err.field(), Some("name"));
    }

    #[test]
    fn unavailable_keeps_origin() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = ConfError::unavailable("/etc/app.toml", io);
        assert!(err.to_string().contains("/etc/app.toml"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
