//! Value coercion: turning raw source values into typed field values.
//!
//! A source hands the walker a [`Raw`] value, either text (environment
//! variables, flags, defaults) or a node of a decoded tree (config files).
//! Every leaf field type implements [`Value`], which knows how to accept both
//! forms, report its [`Kind`] for diagnostics, and tell whether it still holds
//! its zero value.
//!
//! | Type | Text form | Tree form |
//! |------|-----------|-----------|
//! | `String` | verbatim | string |
//! | `bool` | `true`/`false`, any case | boolean |
//! | integers | decimal, range-checked | integer, range-checked |
//! | floats | decimal or exponent | float or integer |
//! | `Duration` | `1h30m`, `10s`, `250ms` | same strings, or integer nanoseconds |
//! | `PathBuf` | verbatim | string |
//! | `Vec<T>` | comma separated, elements trimmed | array |
//! | `Option<T>` | as `T` | as `T` |
//!
//! Coercion either fully succeeds or leaves the field untouched.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::duration::parse_duration;

/// Scalar type families, used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Bool,
    /// Carries the Rust type name, e.g. `"u16"`.
    Integer(&'static str),
    Float(&'static str),
    Duration,
    Path,
}

/// Shape of a leaf field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Scalar(ScalarKind),
    List(ScalarKind),
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarKind::String => f.write_str("string"),
            ScalarKind::Bool => f.write_str("bool"),
            ScalarKind::Integer(ty) => write!(f, "integer ({ty})"),
            ScalarKind::Float(ty) => write!(f, "float ({ty})"),
            ScalarKind::Duration => f.write_str("duration"),
            ScalarKind::Path => f.write_str("path"),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Scalar(kind) => write!(f, "{kind}"),
            Kind::List(kind) => write!(f, "list of {kind}"),
        }
    }
}

/// A value as handed over by a source, before coercion.
#[derive(Debug, Clone, Copy)]
pub enum Raw<'a> {
    Text(&'a str),
    Tree(&'a toml::Value),
}

impl fmt::Display for Raw<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Raw::Text(text) => f.write_str(text),
            Raw::Tree(value) => write!(f, "{value}"),
        }
    }
}

/// A leaf field the walker can write.
pub trait Value {
    fn kind(&self) -> Kind;

    /// Whether the field still holds its type's zero value.
    fn is_zero(&self) -> bool;

    /// Replace the current value with `raw`, coerced. On error the field is
    /// left as it was and the reason is returned.
    fn assign(&mut self, raw: Raw<'_>) -> Result<(), String>;
}

/// A single value that can appear on its own or as a list element.
pub trait Scalar: Sized {
    const KIND: ScalarKind;

    fn parse_text(text: &str) -> Result<Self, String>;

    fn from_tree(value: &toml::Value) -> Result<Self, String>;

    fn is_zero(&self) -> bool;
}

fn mismatch(expected: &str, found: &toml::Value) -> String {
    format!("expected {expected}, found {}", found.type_str())
}

fn coerce<T: Scalar>(raw: Raw<'_>) -> Result<T, String> {
    match raw {
        Raw::Text(text) => T::parse_text(text),
        Raw::Tree(value) => T::from_tree(value),
    }
}

impl Scalar for String {
    const KIND: ScalarKind = ScalarKind::String;

    fn parse_text(text: &str) -> Result<Self, String> {
        Ok(text.to_string())
    }

    fn from_tree(value: &toml::Value) -> Result<Self, String> {
        match value {
            toml::Value::String(s) => Ok(s.clone()),
            other => Err(mismatch("a string", other)),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl Scalar for bool {
    const KIND: ScalarKind = ScalarKind::Bool;

    fn parse_text(text: &str) -> Result<Self, String> {
        if text.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if text.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err("expected true or false".into())
        }
    }

    fn from_tree(value: &toml::Value) -> Result<Self, String> {
        match value {
            toml::Value::Boolean(b) => Ok(*b),
            other => Err(mismatch("a boolean", other)),
        }
    }

    fn is_zero(&self) -> bool {
        !*self
    }
}

macro_rules! integer_scalar {
    ($($ty:ty),* $(,)?) => {$(
        impl Scalar for $ty {
            const KIND: ScalarKind = ScalarKind::Integer(stringify!($ty));

            fn parse_text(text: &str) -> Result<Self, String> {
                text.parse::<$ty>().map_err(|e| e.to_string())
            }

            fn from_tree(value: &toml::Value) -> Result<Self, String> {
                match value {
                    toml::Value::Integer(i) => <$ty>::try_from(*i)
                        .map_err(|_| format!("{i} is out of range for {}", stringify!($ty))),
                    other => Err(mismatch("an integer", other)),
                }
            }

            fn is_zero(&self) -> bool {
                *self == 0
            }
        }
    )*};
}

integer_scalar!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! float_scalar {
    ($($ty:ty),* $(,)?) => {$(
        impl Scalar for $ty {
            const KIND: ScalarKind = ScalarKind::Float(stringify!($ty));

            fn parse_text(text: &str) -> Result<Self, String> {
                text.parse::<$ty>().map_err(|e| e.to_string())
            }

            fn from_tree(value: &toml::Value) -> Result<Self, String> {
                match value {
                    toml::Value::Float(f) => Ok(*f as $ty),
                    toml::Value::Integer(i) => Ok(*i as $ty),
                    other => Err(mismatch("a float", other)),
                }
            }

            fn is_zero(&self) -> bool {
                *self == 0.0
            }
        }
    )*};
}

float_scalar!(f32, f64);

impl Scalar for Duration {
    const KIND: ScalarKind = ScalarKind::Duration;

    fn parse_text(text: &str) -> Result<Self, String> {
        parse_duration(text)
    }

    fn from_tree(value: &toml::Value) -> Result<Self, String> {
        match value {
            toml::Value::String(s) => parse_duration(s),
            toml::Value::Integer(nanos) => u64::try_from(*nanos)
                .map(Duration::from_nanos)
                .map_err(|_| "durations cannot be negative".to_string()),
            other => Err(mismatch("a duration string or integer nanoseconds", other)),
        }
    }

    fn is_zero(&self) -> bool {
        Duration::is_zero(self)
    }
}

impl Scalar for PathBuf {
    const KIND: ScalarKind = ScalarKind::Path;

    fn parse_text(text: &str) -> Result<Self, String> {
        Ok(PathBuf::from(text))
    }

    fn from_tree(value: &toml::Value) -> Result<Self, String> {
        match value {
            toml::Value::String(s) => Ok(PathBuf::from(s)),
            other => Err(mismatch("a path string", other)),
        }
    }

    fn is_zero(&self) -> bool {
        self.as_os_str().is_empty()
    }
}

macro_rules! scalar_value {
    ($($ty:ty),* $(,)?) => {$(
        impl Value for $ty {
            fn kind(&self) -> Kind {
                Kind::Scalar(<$ty as Scalar>::KIND)
            }

            fn is_zero(&self) -> bool {
                Scalar::is_zero(self)
            }

            fn assign(&mut self, raw: Raw<'_>) -> Result<(), String> {
                *self = coerce(raw)?;
                Ok(())
            }
        }
    )*};
}

scalar_value!(
    String, bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, Duration, PathBuf,
);

/// Split a textual list on commas. Empty text is an empty list; there is no
/// escape for a comma inside an element.
fn split_list(text: &str) -> impl Iterator<Item = &str> {
    let text = text.trim();
    (!text.is_empty())
        .then(|| text.split(',').map(str::trim))
        .into_iter()
        .flatten()
}

impl<T: Scalar> Value for Vec<T> {
    fn kind(&self) -> Kind {
        Kind::List(T::KIND)
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn assign(&mut self, raw: Raw<'_>) -> Result<(), String> {
        let items = match raw {
            Raw::Text(text) => split_list(text)
                .enumerate()
                .map(|(i, item)| {
                    T::parse_text(item).map_err(|e| format!("element {i} ({item:?}): {e}"))
                })
                .collect::<Result<Vec<_>, _>>()?,
            Raw::Tree(toml::Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| T::from_tree(item).map_err(|e| format!("element {i}: {e}")))
                .collect::<Result<Vec<_>, _>>()?,
            Raw::Tree(other) => return Err(mismatch("an array", other)),
        };
        *self = items;
        Ok(())
    }
}

impl<T: Value + Default> Value for Option<T> {
    fn kind(&self) -> Kind {
        match self {
            Some(inner) => inner.kind(),
            None => T::default().kind(),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }

    fn assign(&mut self, raw: Raw<'_>) -> Result<(), String> {
        let mut inner = T::default();
        inner.assign(raw)?;
        *self = Some(inner);
        Ok(())
    }
}
