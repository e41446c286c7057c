//! The struct walker: writes source values into a record, field by field.
//!
//! For every descriptor in walk order:
//!
//! - nested records are walked in place with the record's external name
//!   appended to the key path (flattened records never show up here; their
//!   fields were promoted during schema derivation);
//! - a leaf with a value in the source is coerced and assigned;
//! - a leaf with no value but a declared default gets the default, but only if
//!   it still holds its zero value;
//! - anything else is left exactly as it was.
//!
//! A field is only ever written on evidence: a present source value or an
//! applicable default. That is what lets several loaders run against the same
//! record in sequence.
//!
//! Coercion failures do not stop the walk. Every other field is still
//! populated and all failures come back together as
//! [`ConfError::TypeMismatches`].

use crate::error::ConfError;
use crate::field::{FieldMut, Record};
use crate::schema::{self, Schema};
use crate::source::Source;
use crate::types::WriteMode;
use crate::value::{Raw, Value};

/// Where a written value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Source,
    Default,
}

/// One field write made during a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Qualified declared name, e.g. `postgres.port`.
    pub field: String,
    pub origin: Origin,
}

/// Walk `record` against `source`, returning every write that was made.
///
/// On [`ConfError::TypeMismatches`] the writes that succeeded stay in place.
pub fn populate(
    record: &mut dyn Record,
    schema: &Schema,
    source: &dyn Source,
    mode: WriteMode,
) -> Result<Vec<Assignment>, ConfError> {
    let mut walk = Walk {
        source,
        mode,
        keys: Vec::new(),
        written: Vec::new(),
        mismatches: Vec::new(),
    };
    walk.record(record, schema, "")?;

    if walk.mismatches.is_empty() {
        Ok(walk.written)
    } else {
        Err(ConfError::TypeMismatches(walk.mismatches))
    }
}

struct Walk<'s> {
    source: &'s dyn Source,
    mode: WriteMode,
    keys: Vec<&'static str>,
    written: Vec<Assignment>,
    mismatches: Vec<ConfError>,
}

impl Walk<'_> {
    fn record(&mut self, record: &mut dyn Record, schema: &Schema, parent: &str) -> Result<(), ConfError> {
        for descriptor in schema.descriptors() {
            let path = schema::qualify(parent, descriptor.path());
            self.keys.push(descriptor.key());

            match (schema::field_mut(record, &descriptor.route), descriptor.nested()) {
                (Some(FieldMut::Record(inner)), Some(nested)) => {
                    self.record(inner, nested, &path)?;
                }
                (Some(FieldMut::Value(value)), None) => {
                    self.leaf(value, descriptor.default(), path)?;
                }
                _ => return Err(schema::shape_mismatch(&path)),
            }

            self.keys.pop();
        }
        Ok(())
    }

    fn leaf(
        &mut self,
        value: &mut dyn Value,
        default: Option<&'static str>,
        path: String,
    ) -> Result<(), ConfError> {
        let source = self.source;
        if let Some(raw) = source.lookup(&self.keys) {
            if self.mode == WriteMode::FillZero && !value.is_zero() {
                tracing::trace!(field = %path, "already set, not filling");
                return Ok(());
            }
            match value.assign(raw) {
                Ok(()) => {
                    tracing::trace!(field = %path, value = %raw, "set from source");
                    self.written.push(Assignment {
                        field: path,
                        origin: Origin::Source,
                    });
                }
                Err(reason) => self.mismatches.push(ConfError::TypeMismatch {
                    raw: raw.to_string(),
                    kind: value.kind(),
                    field: path,
                    reason,
                }),
            }
            return Ok(());
        }

        if let Some(text) = default
            && value.is_zero()
        {
            value
                .assign(Raw::Text(text))
                .map_err(|reason| ConfError::InvalidTag {
                    field: path.clone(),
                    reason: format!("default {text:?} is not a valid {}: {reason}", value.kind()),
                })?;
            tracing::trace!(field = %path, value = text, "set from default");
            self.written.push(Assignment {
                field: path,
                origin: Origin::Default,
            });
        }
        Ok(())
    }
}
