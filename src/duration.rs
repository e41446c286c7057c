//! Textual duration grammar.
//!
//! A duration is one or more `<number><unit>` terms written back to back:
//! `90s`, `1h30m`, `1.5s`, `250ms`. Units are `ns`, `us` (or `µs`), `ms`, `s`,
//! `m` and `h`. Numbers may carry a decimal fraction. The bare string `0` is
//! the only unit-less form accepted. Signs are rejected.

use std::time::Duration;

const NANOS_PER_UNIT: &[(&str, u128)] = &[
    ("ns", 1),
    ("us", 1_000),
    ("µs", 1_000),
    ("ms", 1_000_000),
    ("s", 1_000_000_000),
    ("m", 60 * 1_000_000_000),
    ("h", 60 * 60 * 1_000_000_000),
];

/// Parse a compound duration such as `1h30m` or `10s`.
pub fn parse_duration(text: &str) -> Result<Duration, String> {
    if text == "0" {
        return Ok(Duration::ZERO);
    }
    if text.is_empty() {
        return Err("empty duration".into());
    }

    let mut rest = text;
    let mut total: u128 = 0;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        if number.is_empty() {
            return Err(format!("expected a number at {rest:?}"));
        }

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        if unit.is_empty() {
            return Err(format!("missing unit after {number:?}"));
        }
        let scale = NANOS_PER_UNIT
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, scale)| *scale)
            .ok_or_else(|| format!("unknown unit {unit:?}"))?;

        total = total
            .checked_add(scaled(number, scale)?)
            .ok_or_else(|| "duration overflows".to_string())?;
        rest = tail;
    }

    let secs = u64::try_from(total / 1_000_000_000).map_err(|_| "duration overflows")?;
    let nanos = (total % 1_000_000_000) as u32;
    Ok(Duration::new(secs, nanos))
}

/// Multiply a decimal literal by a unit scale without going through floats,
/// so `8.23s` lands on exact nanoseconds.
fn scaled(number: &str, scale: u128) -> Result<u128, String> {
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if (whole.is_empty() && fraction.is_empty()) || fraction.contains('.') {
        return Err(format!("malformed number {number:?}"));
    }

    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| format!("malformed number {number:?}"))?
    };
    let mut nanos = whole
        .checked_mul(scale)
        .ok_or_else(|| "duration overflows".to_string())?;

    let mut place = scale;
    for digit in fraction.chars() {
        place /= 10;
        if place == 0 {
            break;
        }
        let digit = u128::from(digit.to_digit(10).unwrap_or(0));
        nanos = nanos
            .checked_add(digit * place)
            .ok_or_else(|| "duration overflows".to_string())?;
    }
    Ok(nanos)
}
