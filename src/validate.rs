//! Post-load validation.
//!
//! Validation is always an explicit step after loading; nothing here mutates
//! the record. The built-in [`RequiredValidator`] walks the schema a second
//! time and reports every field marked `required` that still holds its zero
//! value, all at once, as [`ConfError::RequiredFields`].

use crate::error::ConfError;
use crate::field::{FieldRef, Record};
use crate::schema::{self, Schema};

pub trait Validator {
    fn validate(&self, record: &dyn Record, schema: &Schema) -> Result<(), ConfError>;
}

/// Fails when a required field still holds its zero value.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredValidator;

impl Validator for RequiredValidator {
    fn validate(&self, record: &dyn Record, schema: &Schema) -> Result<(), ConfError> {
        let mut missing = Vec::new();
        collect_missing(record, schema, "", &mut missing)?;
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfError::RequiredFields(missing))
        }
    }
}

fn collect_missing(
    record: &dyn Record,
    schema: &Schema,
    parent: &str,
    missing: &mut Vec<ConfError>,
) -> Result<(), ConfError> {
    for descriptor in schema.descriptors() {
        let path = schema::qualify(parent, descriptor.path());
        match (schema::field_ref(record, &descriptor.route), descriptor.nested()) {
            (Some(FieldRef::Record(inner)), Some(nested)) => {
                collect_missing(inner, nested, &path, missing)?;
            }
            (Some(FieldRef::Value(value)), None) => {
                if descriptor.is_required() && value.is_zero() {
                    tracing::debug!(field = %path, "required field is not set");
                    missing.push(ConfError::RequiredField { field: path });
                }
            }
            _ => return Err(schema::shape_mismatch(&path)),
        }
    }
    Ok(())
}

/// Runs validators in order and stops at the first failure.
#[derive(Default)]
pub struct MultiValidator {
    validators: Vec<Box<dyn Validator>>,
}

impl MultiValidator {
    pub fn new(validators: Vec<Box<dyn Validator>>) -> Self {
        Self { validators }
    }

    pub fn push(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl Validator for MultiValidator {
    fn validate(&self, record: &dyn Record, schema: &Schema) -> Result<(), ConfError> {
        self.validators
            .iter()
            .try_for_each(|validator| validator.validate(record, schema))
    }
}

/// Check the required fields of `record`.
pub fn validate<R: Record + 'static>(record: &R) -> Result<(), ConfError> {
    let schema = Schema::of::<R>()?;
    RequiredValidator.validate(record, &schema)
}
