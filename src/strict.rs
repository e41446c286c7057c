//! Strict mode: reject keys in a decoded file that no field consumes.
//!
//! The decoded table is walked side by side with the schema. A key is unknown
//! when no descriptor at that level carries it as its external name. Tables
//! under a nested record's key are checked against the nested schema; values
//! under a leaf's key are left to coercion.
//!
//! TOML errors carry a best-effort line number; other formats report line 0.

use toml::Table;

use crate::error::ConfError;
use crate::schema::Schema;

/// Check `table` against `schema`, reporting every unknown key.
///
/// `content` is the TOML text as written, used only to locate line numbers.
pub fn check_unknown_keys(
    table: &Table,
    schema: &Schema,
    content: Option<&str>,
    origin: &str,
) -> Result<(), ConfError> {
    let mut unknown = Vec::new();
    collect_unknown(table, schema, "", &mut unknown);

    if unknown.is_empty() {
        return Ok(());
    }

    let errors = unknown
        .into_iter()
        .map(|key| ConfError::UnknownKey {
            line: content.map_or(0, |text| find_key_line(text, &key)),
            origin: origin.to_string(),
            key,
        })
        .collect();
    Err(ConfError::UnknownKeys(errors))
}

fn collect_unknown(table: &Table, schema: &Schema, prefix: &str, out: &mut Vec<String>) {
    for (key, value) in table {
        let dotted = crate::schema::qualify(prefix, key);
        let descriptor = schema.descriptors().iter().find(|d| d.key() == key);
        match (descriptor.and_then(|d| d.nested()), value) {
            (Some(nested), toml::Value::Table(sub)) => {
                collect_unknown(sub, nested, &dotted, out);
            }
            _ if descriptor.is_some() => {}
            _ => out.push(dotted),
        }
    }
}

/// Find the 1-indexed line of a dotted key in TOML text.
///
/// Tracks the current `[section]` header and only matches the leaf key inside
/// the right section. Quoted keys and inline tables are not handled. Returns 0
/// when the key cannot be located.
fn find_key_line(content: &str, dotted_key: &str) -> usize {
    let segments: Vec<&str> = dotted_key.split('.').collect();
    let Some((leaf, expected_section)) = segments.split_last() else {
        return 0;
    };

    let mut current_section: Vec<&str> = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        if trimmed.starts_with('[') && !trimmed.starts_with("[[") {
            let header = trimmed.trim_start_matches('[').trim_end_matches(']').trim();
            current_section = header.split('.').map(str::trim).collect();
            continue;
        }

        if current_section == expected_section
            && let Some(after_key) = trimmed.strip_prefix(leaf)
            && after_key.trim_start().starts_with('=')
        {
            return i + 1;
        }
    }
    0
}
