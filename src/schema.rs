//! Descriptor derivation: from a record's static field table to the ordered
//! list of fields the walker actually visits.
//!
//! Derivation is purely structural:
//!
//! 1. Skipped and private (`_`-prefixed) fields are dropped.
//! 2. Flattened records contribute their own descriptors, recursively, at the
//!    parent's level. The route to each promoted field is recorded so the
//!    walker can reach it in place.
//! 3. Non-flattened records become a single descriptor carrying the nested
//!    record's own schema.
//! 4. When two descriptors end up with the same external key, the one later in
//!    walk order wins and the earlier one is dropped.
//!
//! Schemas are cached per record type for the life of the process.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::error::ConfError;
use crate::field::{Field, FieldMut, FieldRef, Record, Shape};
use crate::value::{Kind, Value};

const MAX_DEPTH: usize = 32;

/// One loadable field, as seen from the root of a schema.
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub(crate) name: &'static str,
    pub(crate) path: String,
    pub(crate) key: &'static str,
    pub(crate) default: Option<&'static str>,
    pub(crate) required: bool,
    pub(crate) route: Vec<usize>,
    pub(crate) nested: Option<Arc<Schema>>,
}

impl Descriptor {
    /// Declared field name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Dotted path of declared names from the schema root, flattened parents
    /// included (`postgres.port`).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// External name used for source lookups.
    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn default(&self) -> Option<&'static str> {
        self.default
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The nested record's schema, for non-flattened record fields.
    pub fn nested(&self) -> Option<&Schema> {
        self.nested.as_deref()
    }
}

/// The flattened, collision-resolved descriptors of one record type.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    descriptors: Vec<Descriptor>,
}

/// A leaf reachable from a schema root, with its full key path.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    /// External names from the root, one per non-flattened level.
    pub keys: Vec<&'static str>,
    /// Qualified declared name, e.g. `postgres.db_name`.
    pub path: String,
    pub kind: Kind,
}

type Cache = RwLock<HashMap<TypeId, Arc<Schema>>>;

fn cache() -> &'static Cache {
    static SCHEMAS: OnceLock<Cache> = OnceLock::new();
    SCHEMAS.get_or_init(Default::default)
}

impl Schema {
    /// The schema for `R`, derived on first use and cached afterwards.
    pub fn of<R: Record + 'static>() -> Result<Arc<Schema>, ConfError> {
        let id = TypeId::of::<R>();
        if let Some(schema) = cache()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
        {
            return Ok(Arc::clone(schema));
        }

        let derived = Arc::new(Schema::derive(R::fields())?);
        tracing::debug!(
            record = std::any::type_name::<R>(),
            fields = derived.descriptors.len(),
            "derived schema"
        );

        let mut schemas = cache().write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(schemas.entry(id).or_insert(derived)))
    }

    /// Derive a schema from a field table without touching the cache.
    pub fn derive(fields: &'static [Field]) -> Result<Schema, ConfError> {
        Self::derive_at(fields, "", 0)
    }

    fn derive_at(fields: &'static [Field], prefix: &str, depth: usize) -> Result<Schema, ConfError> {
        let mut collected = Vec::new();
        collect(fields, &[], prefix, "", depth, &mut collected)?;
        Ok(Schema {
            descriptors: resolve_collisions(collected),
        })
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Every leaf reachable from `record`, in walk order.
    ///
    /// Needs an instance because leaf kinds come from the field values.
    pub fn leaves(&self, record: &dyn Record) -> Result<Vec<Leaf>, ConfError> {
        let mut out = Vec::new();
        self.collect_leaves(record, &mut Vec::new(), "", &mut out)?;
        Ok(out)
    }

    fn collect_leaves(
        &self,
        record: &dyn Record,
        keys: &mut Vec<&'static str>,
        parent: &str,
        out: &mut Vec<Leaf>,
    ) -> Result<(), ConfError> {
        for descriptor in &self.descriptors {
            let path = qualify(parent, &descriptor.path);
            keys.push(descriptor.key);
            match (field_ref(record, &descriptor.route), &descriptor.nested) {
                (Some(FieldRef::Value(value)), None) => out.push(Leaf {
                    keys: keys.clone(),
                    path,
                    kind: value.kind(),
                }),
                (Some(FieldRef::Record(inner)), Some(nested)) => {
                    nested.collect_leaves(inner, keys, &path, out)?;
                }
                _ => return Err(shape_mismatch(&path)),
            }
            keys.pop();
        }
        Ok(())
    }
}

fn collect(
    fields: &'static [Field],
    route: &[usize],
    prefix: &str,
    parent: &str,
    depth: usize,
    out: &mut Vec<Descriptor>,
) -> Result<(), ConfError> {
    if depth > MAX_DEPTH {
        return Err(ConfError::InvalidTag {
            field: qualify(prefix, parent),
            reason: format!("records nest deeper than {MAX_DEPTH} levels"),
        });
    }

    for (index, field) in fields.iter().enumerate() {
        let path = qualify(parent, field.name);
        if field.skip || field.is_private() {
            tracing::trace!(field = %path, "skipping field");
            continue;
        }
        check_tags(field, &qualify(prefix, &path))?;

        let mut field_route = route.to_vec();
        field_route.push(index);

        match field.shape {
            Shape::Record(nested) if field.flatten => {
                collect(nested(), &field_route, prefix, &path, depth + 1, out)?;
            }
            Shape::Record(nested) => {
                let schema = Schema::derive_at(nested(), &qualify(prefix, &path), depth + 1)?;
                out.push(Descriptor {
                    name: field.name,
                    key: field.key(),
                    default: None,
                    required: false,
                    route: field_route,
                    nested: Some(Arc::new(schema)),
                    path,
                });
            }
            Shape::Value => out.push(Descriptor {
                name: field.name,
                key: field.key(),
                default: field.default,
                required: field.required,
                route: field_route,
                nested: None,
                path,
            }),
        }
    }
    Ok(())
}

fn check_tags(field: &Field, qualified: &str) -> Result<(), ConfError> {
    let invalid = |reason: &str| {
        Err(ConfError::InvalidTag {
            field: qualified.to_string(),
            reason: reason.to_string(),
        })
    };

    if field.key.is_some_and(str::is_empty) {
        return invalid("external name is empty");
    }
    match field.shape {
        Shape::Value if field.flatten => invalid("only record fields can be flattened"),
        Shape::Record(_) if field.default.is_some() => {
            invalid("record fields cannot carry a default")
        }
        Shape::Record(_) if field.required => {
            invalid("record fields cannot be required; mark their leaves instead")
        }
        _ => Ok(()),
    }
}

/// Keep the last descriptor for each external key.
fn resolve_collisions(collected: Vec<Descriptor>) -> Vec<Descriptor> {
    let mut seen = HashSet::new();
    let mut kept: Vec<Descriptor> = Vec::with_capacity(collected.len());
    for descriptor in collected.into_iter().rev() {
        if seen.insert(descriptor.key) {
            kept.push(descriptor);
        } else {
            tracing::warn!(
                field = %descriptor.path,
                key = descriptor.key,
                "field shadowed by a later field with the same key"
            );
        }
    }
    kept.reverse();
    kept
}

pub(crate) fn qualify(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

pub(crate) fn shape_mismatch(path: &str) -> ConfError {
    ConfError::InvalidTag {
        field: path.to_string(),
        reason: "field accessor disagrees with the declared field shape".into(),
    }
}

/// Follow `route` through flattened records to the target field.
pub(crate) fn field_mut<'r>(mut record: &'r mut dyn Record, route: &[usize]) -> Option<FieldMut<'r>> {
    let (last, parents) = route.split_last()?;
    for &index in parents {
        match { record }.field_mut(index)? {
            FieldMut::Record(inner) => record = inner,
            FieldMut::Value(_) => return None,
        }
    }
    record.field_mut(*last)
}

pub(crate) fn field_ref<'r>(mut record: &'r dyn Record, route: &[usize]) -> Option<FieldRef<'r>> {
    let (last, parents) = route.split_last()?;
    for &index in parents {
        match record.field_ref(index)? {
            FieldRef::Record(inner) => record = inner,
            FieldRef::Value(_) => return None,
        }
    }
    record.field_ref(*last)
}
