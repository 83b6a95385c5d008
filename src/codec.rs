//! Coercions between decoded wire values and typed fields.
//!
//! The REST API answers in XML, which `crate::xml` turns into a
//! `serde_json::Value` tree. Scalars arrive as strings, an element with
//! attributes keeps its text under `_contents`, and a tag that may repeat is
//! a bare value when it occurs once and a list otherwise. Every reader in
//! this module is lenient: malformed input becomes `None` rather than an
//! error. Only constant validation and node checks fail.

use crate::error::{KayakoError, Result};
use crate::transport::WireMap;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt::Write;

/// Key holding element attributes in decoded wire data.
pub const ATTRIBUTES_KEY: &str = "_attributes";

/// Key holding element text when the element also has attributes or children.
pub const CONTENTS_KEY: &str = "_contents";

/// A closed family of wire constants, such as comment creator types.
pub trait ConstantSet: Sized + Copy + 'static {
    /// Type that declares the constants, used in error messages.
    const OWNER: &'static str;
    /// Constant name prefix, used in error messages.
    const PREFIX: &'static str;

    /// Every declared value.
    fn values() -> &'static [Self];

    /// The value as sent on the wire.
    fn wire_value(self) -> &'static str;

    /// Looks up a declared value by its wire form.
    fn from_wire(raw: &str) -> Option<Self> {
        Self::values()
            .iter()
            .copied()
            .find(|v| v.wire_value() == raw)
    }
}

/// Declares an enum of wire constants with its `ConstantSet` and `Display` impls.
#[macro_export]
macro_rules! wire_constants {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident ($owner:literal, $prefix:literal) {
            $( $(#[$vmeta:meta])* $variant:ident = $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $crate::codec::ConstantSet for $name {
            const OWNER: &'static str = $owner;
            const PREFIX: &'static str = $prefix;

            fn values() -> &'static [Self] {
                &[$( $name::$variant ),+]
            }

            fn wire_value(self) -> &'static str {
                match self {
                    $( $name::$variant => $wire ),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::codec::ConstantSet::wire_value(*self))
            }
        }
    };
}

/// Returns the scalar text of a wire value.
///
/// Objects yield their `_contents`; lists and nulls yield `None`.
#[must_use]
pub fn scalar_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Borrowed(if *b { "1" } else { "0" })),
        Value::Object(map) => map.get(CONTENTS_KEY).and_then(scalar_text),
        Value::Array(_) | Value::Null => None,
    }
}

/// Numeric value greater than zero, else `None`.
#[must_use]
pub fn to_positive_int(value: Option<&Value>) -> Option<u64> {
    let text = value.and_then(scalar_text)?;
    let n: i64 = text.trim().parse().ok()?;
    u64::try_from(n).ok().filter(|n| *n > 0)
}

/// Any integer, or `default` when absent or malformed.
#[must_use]
pub fn to_int(value: Option<&Value>, default: Option<i64>) -> Option<i64> {
    value
        .and_then(scalar_text)
        .and_then(|text| text.trim().parse().ok())
        .or(default)
}

/// `1`/`true`/`yes` or `0`/`false`/`no`, case-insensitive.
#[must_use]
pub fn to_bool(value: Option<&Value>) -> Option<bool> {
    if let Some(Value::Bool(b)) = value {
        return Some(*b);
    }
    let text = value.and_then(scalar_text)?;
    match text.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Non-empty text, else `None`.
#[must_use]
pub fn to_string_or_null(value: Option<&Value>) -> Option<String> {
    value
        .and_then(scalar_text)
        .map(Cow::into_owned)
        .filter(|s| !s.is_empty())
}

/// Validates a wire value against a declared constant family.
///
/// # Errors
///
/// Returns `KayakoError::InvalidEnumValue` when the value is absent or not declared.
pub fn to_constant<T: ConstantSet>(value: Option<&Value>) -> Result<T> {
    let text = value.and_then(scalar_text).unwrap_or_default();
    T::from_wire(text.trim()).ok_or_else(|| {
        KayakoError::invalid_enum(text.as_ref(), format!("{}::{}", T::OWNER, T::PREFIX))
    })
}

/// Like `to_constant`, but absent or empty values are `None`.
///
/// # Errors
///
/// Returns `KayakoError::InvalidEnumValue` when a value is present but not declared.
pub fn to_constant_opt<T: ConstantSet>(value: Option<&Value>) -> Result<Option<T>> {
    match value.and_then(scalar_text) {
        Some(text) if !text.trim().is_empty() => to_constant(value).map(Some),
        _ => Ok(None),
    }
}

/// Requires a wire value to be a node (map).
///
/// # Errors
///
/// Returns `KayakoError::TypeMismatch` naming `expected` when it is not.
pub fn ensure_node<'a>(value: &'a Value, expected: &str) -> Result<&'a WireMap> {
    value.as_object().ok_or_else(|| {
        let found = match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "text",
            Value::Array(_) => "list",
            Value::Object(_) => "node",
        };
        KayakoError::type_mismatch(format!("{} node", expected), found)
    })
}

/// Normalizes the single-vs-repeated ambiguity of decoded XML.
///
/// A single node becomes a one-element list, a list stays as is, and an
/// absent, null or empty-text value becomes an empty list.
#[must_use]
pub fn as_list(value: Option<&Value>) -> Vec<&Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) if s.is_empty() => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(other) => vec![other],
    }
}

/// Positive ids from a repeated element, e.g. `<usergroupid>` lists.
#[must_use]
pub fn to_id_list(value: Option<&Value>) -> Vec<u64> {
    as_list(value)
        .into_iter()
        .filter_map(|v| to_positive_int(Some(v)))
        .collect()
}

/// Reads an attribute of an element.
#[must_use]
pub fn attribute<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    value.get(ATTRIBUTES_KEY).and_then(|attrs| attrs.get(name))
}

/// Reads an attribute of an unwrapped node.
#[must_use]
pub fn node_attribute<'a>(node: &'a WireMap, name: &str) -> Option<&'a Value> {
    node.get(ATTRIBUTES_KEY).and_then(|attrs| attrs.get(name))
}

/// Unix timestamp in seconds, `None` when zero or absent.
#[must_use]
pub fn to_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let secs = to_positive_int(value)?;
    let secs = i64::try_from(secs).ok()?;
    Utc.timestamp_opt(secs, 0).single()
}

/// Formats a timestamp with a chrono format string.
///
/// Returns `None` when the format string is invalid.
#[must_use]
pub fn format_timestamp(value: Option<DateTime<Utc>>, format: &str) -> Option<String> {
    let dt = value?;
    let mut out = String::new();
    write!(out, "{}", dt.format(format)).ok()?;
    Some(out)
}

/// Seconds as `HH:MM:SS`; hours are not wrapped at 24.
#[must_use]
pub fn format_seconds(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Byte count in binary units with at most two decimals.
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

/// Parses a duration given either as seconds or as `hh:mm`.
///
/// # Errors
///
/// Returns `KayakoError::Validation` when the text is neither.
pub fn parse_hours_minutes(text: &str) -> Result<u64> {
    let text = text.trim();
    if let Ok(seconds) = text.parse::<u64>() {
        return Ok(seconds);
    }

    let invalid = || KayakoError::validation(format!("invalid time value {:?}, expected hh:mm", text));
    let (hours, minutes) = text.split_once(':').ok_or_else(invalid)?;
    let hours: u64 = hours.trim().parse().map_err(|_| invalid())?;
    let minutes: u64 = minutes.trim().parse().map_err(|_| invalid())?;
    if minutes >= 60 {
        return Err(invalid());
    }

    hours
        .checked_mul(3600)
        .and_then(|secs| secs.checked_add(minutes * 60))
        .ok_or_else(invalid)
}

/// Truncates text to `max` characters, appending `...` when cut.
#[must_use]
pub fn excerpt(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    crate::wire_constants! {
        enum Shade("Sample", "SHADE") {
            Light = "1",
            Dark = "2",
        }
    }

    #[test]
    fn test_to_positive_int() {
        assert_eq!(to_positive_int(Some(&json!("42"))), Some(42));
        assert_eq!(to_positive_int(Some(&json!(7))), Some(7));
        assert_eq!(to_positive_int(Some(&json!("0"))), None);
        assert_eq!(to_positive_int(Some(&json!("-3"))), None);
        assert_eq!(to_positive_int(Some(&json!("abc"))), None);
        assert_eq!(to_positive_int(None), None);
    }

    #[test]
    fn test_to_positive_int_reads_contents_of_attributed_element() {
        let value = json!({ "_attributes": { "id": "3" }, "_contents": "12" });
        assert_eq!(to_positive_int(Some(&value)), Some(12));
    }

    #[test]
    fn test_to_int_default() {
        assert_eq!(to_int(Some(&json!("-5")), None), Some(-5));
        assert_eq!(to_int(Some(&json!("x")), Some(0)), Some(0));
        assert_eq!(to_int(None, None), None);
    }

    #[test]
    fn test_to_bool() {
        assert_eq!(to_bool(Some(&json!("1"))), Some(true));
        assert_eq!(to_bool(Some(&json!("Yes"))), Some(true));
        assert_eq!(to_bool(Some(&json!("false"))), Some(false));
        assert_eq!(to_bool(Some(&json!(true))), Some(true));
        assert_eq!(to_bool(Some(&json!("maybe"))), None);
    }

    #[test]
    fn test_to_string_or_null() {
        assert_eq!(to_string_or_null(Some(&json!("text"))), Some("text".to_string()));
        assert_eq!(to_string_or_null(Some(&json!(""))), None);
        assert_eq!(to_string_or_null(Some(&json!(["a", "b"]))), None);
    }

    #[test]
    fn test_to_constant_accepts_declared_value() {
        let shade: Shade = to_constant(Some(&json!("2"))).unwrap();
        assert_eq!(shade, Shade::Dark);
    }

    #[test]
    fn test_to_constant_rejects_undeclared_value() {
        let err = to_constant::<Shade>(Some(&json!("5"))).unwrap_err();
        match err {
            KayakoError::InvalidEnumValue { value, constant } => {
                assert_eq!(value, "5");
                assert_eq!(constant, "Sample::SHADE");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_to_constant_opt_allows_absent() {
        assert_eq!(to_constant_opt::<Shade>(None).unwrap(), None);
        assert_eq!(to_constant_opt::<Shade>(Some(&json!(""))).unwrap(), None);
        assert!(to_constant_opt::<Shade>(Some(&json!("9"))).is_err());
    }

    #[test]
    fn test_ensure_node() {
        assert!(ensure_node(&json!({ "id": "1" }), "ticket").is_ok());
        let err = ensure_node(&json!("1"), "ticket").unwrap_err();
        assert!(matches!(err, KayakoError::TypeMismatch { .. }));
    }

    #[test]
    fn test_as_list_shapes() {
        assert_eq!(as_list(None).len(), 0);
        assert_eq!(as_list(Some(&json!(""))).len(), 0);
        assert_eq!(as_list(Some(&json!({ "id": "1" }))).len(), 1);
        assert_eq!(as_list(Some(&json!([{ "id": "1" }, { "id": "2" }]))).len(), 2);
    }

    #[test]
    fn test_to_id_list() {
        assert_eq!(to_id_list(Some(&json!(["3", "0", "5"]))), vec![3, 5]);
        assert_eq!(to_id_list(Some(&json!("4"))), vec![4]);
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(9000), "02:30:00");
        assert_eq!(format_seconds(59), "00:00:59");
        assert_eq!(format_seconds(90061), "25:01:01");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(2048), "2 KB");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5 MB");
        assert_eq!(format_bytes(1_234_567), "1.18 MB");
    }

    #[test]
    fn test_parse_hours_minutes() {
        assert_eq!(parse_hours_minutes("1:30").unwrap(), 5400);
        assert_eq!(parse_hours_minutes("00:05").unwrap(), 300);
        assert_eq!(parse_hours_minutes("120").unwrap(), 120);
        assert!(parse_hours_minutes("1:75").is_err());
        assert!(parse_hours_minutes("soon").is_err());
    }

    #[test]
    fn test_parse_hours_minutes_rejects_overflow() {
        let err = parse_hours_minutes("9999999999999999:00").unwrap_err();
        assert!(matches!(err, KayakoError::Validation(_)));
        assert!(parse_hours_minutes(&format!("{}:59", u64::MAX / 3600)).is_err());
    }

    #[test]
    fn test_timestamp_formatting() {
        let ts = to_timestamp(Some(&json!("1300000000")));
        assert_eq!(
            format_timestamp(ts, "%Y-%m-%d %H:%M:%S"),
            Some("2011-03-13 07:06:40".to_string())
        );
        assert_eq!(to_timestamp(Some(&json!("0"))), None);
    }

    #[test]
    fn test_invalid_format_is_none() {
        let ts = to_timestamp(Some(&json!("1300000000")));
        assert_eq!(format_timestamp(ts, "%Q"), None);
        assert_eq!(format_timestamp(ts, "%Y %"), None);
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("short", 10), "short");
        assert_eq!(excerpt("abcdefghij", 4), "abcd...");
    }
}
