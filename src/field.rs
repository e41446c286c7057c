//! Declarative field metadata and the record contract.
//!
//! A config record describes itself with a static table of [`Field`]s, one per
//! declared field in declaration order, and hands out positional access to
//! those fields. The [`record!`](crate::record) macro writes both halves:
//!
//! ```ignore
//! #[derive(Debug, Default)]
//! struct Server {
//!     name: String,
//!     port: u16,
//!     postgres: Postgres,
//! }
//!
//! multiconf::record! {
//!     Server {
//!         name: value.required(),
//!         port: value.default("6060"),
//!         postgres: record::<Postgres>,
//!     }
//! }
//! ```
//!
//! Metadata is built from `const` constructors rather than parsed from
//! annotation strings, so most malformed combinations never get written.

use crate::value::Value;

/// What a declared field holds.
#[derive(Debug, Clone, Copy)]
pub enum Shape {
    /// A leaf coerced through [`Value`].
    Value,
    /// A nested record; the function yields its field table.
    Record(fn() -> &'static [Field]),
}

/// Metadata for one declared field.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub(crate) name: &'static str,
    pub(crate) key: Option<&'static str>,
    pub(crate) default: Option<&'static str>,
    pub(crate) required: bool,
    pub(crate) flatten: bool,
    pub(crate) skip: bool,
    pub(crate) shape: Shape,
}

impl Field {
    /// A leaf field named `name`.
    pub const fn value(name: &'static str) -> Self {
        Self {
            name,
            key: None,
            default: None,
            required: false,
            flatten: false,
            skip: false,
            shape: Shape::Value,
        }
    }

    /// A field holding the nested record `R`.
    pub const fn record<R: Record>(name: &'static str) -> Self {
        Self {
            shape: Shape::Record(R::fields),
            ..Self::value(name)
        }
    }

    /// Look the field up under `key` instead of its declared name.
    pub const fn rename(self, key: &'static str) -> Self {
        Self {
            key: Some(key),
            ..self
        }
    }

    /// Text applied when no source supplies a value and the field is still zero.
    pub const fn default(self, text: &'static str) -> Self {
        Self {
            default: Some(text),
            ..self
        }
    }

    /// Validation fails if the field still holds its zero value.
    pub const fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    /// Promote a nested record's fields into this record's namespace.
    pub const fn flatten(self) -> Self {
        Self {
            flatten: true,
            ..self
        }
    }

    /// Exclude the field from loading and validation.
    pub const fn skip(self) -> Self {
        Self { skip: true, ..self }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The external name: the rename if one was given, else the declared name.
    pub fn key(&self) -> &'static str {
        self.key.unwrap_or(self.name)
    }

    /// Leading underscore marks a private field.
    pub(crate) fn is_private(&self) -> bool {
        self.name.starts_with('_')
    }
}

/// Mutable access to one field of a record.
pub enum FieldMut<'a> {
    Value(&'a mut dyn Value),
    Record(&'a mut dyn Record),
}

/// Shared access to one field of a record.
pub enum FieldRef<'a> {
    Value(&'a dyn Value),
    Record(&'a dyn Record),
}

/// A config record: a static field table plus positional field access.
///
/// `index` is the position in [`fields()`](Record::fields). Accessors return
/// `None` past the end of the table.
pub trait Record {
    fn fields() -> &'static [Field]
    where
        Self: Sized;

    fn field_mut(&mut self, index: usize) -> Option<FieldMut<'_>>;

    fn field_ref(&self, index: usize) -> Option<FieldRef<'_>>;
}

/// Implement [`Record`] for a struct from a list of its fields.
///
/// Each entry is `field: value` or `field: record::<Type>`, optionally followed
/// by chained [`Field`] modifiers. The field's declared name is the Rust
/// identifier.
///
/// ```ignore
/// multiconf::record! {
///     TaggedServer {
///         name: value.required(),
///         db_name: value.rename("dbname").default("configdb"),
///         postgres: record::<Postgres>.flatten(),
///         cache: value.skip(),
///     }
/// }
/// ```
#[macro_export]
macro_rules! record {
    (@mut value $place:expr) => {
        $crate::FieldMut::Value(&mut $place)
    };
    (@mut record $place:expr) => {
        $crate::FieldMut::Record(&mut $place)
    };
    (@ref value $place:expr) => {
        $crate::FieldRef::Value(&$place)
    };
    (@ref record $place:expr) => {
        $crate::FieldRef::Record(&$place)
    };
    (
        $ty:ty {
            $(
                $field:ident : $access:ident $(::<$nested:ty>)?
                    $(.$modifier:ident($($arg:expr),*))*
            ),* $(,)?
        }
    ) => {
        impl $crate::Record for $ty {
            fn fields() -> &'static [$crate::Field] {
                const FIELDS: &[$crate::Field] = &[
                    $(
                        $crate::Field::$access$(::<$nested>)?(stringify!($field))
                            $(.$modifier($($arg),*))*
                    ),*
                ];
                FIELDS
            }

            fn field_mut(&mut self, index: usize) -> Option<$crate::FieldMut<'_>> {
                let mut _position = 0usize;
                $(
                    if index == _position {
                        return Some($crate::record!(@mut $access self.$field));
                    }
                    _position += 1;
                )*
                None
            }

            fn field_ref(&self, index: usize) -> Option<$crate::FieldRef<'_>> {
                let mut _position = 0usize;
                $(
                    if index == _position {
                        return Some($crate::record!(@ref $access self.$field));
                    }
                    _position += 1;
                )*
                None
            }
        }
    };
}
