//! Canonical JSON encoding for deterministic serialization.
//!
//! The digest of a record is taken over a single, fixed text rendering:
//! - Object keys sorted by code point, at every nesting level
//! - `,` and `:` separators with no surrounding whitespace
//! - ASCII-only output; everything else escaped as `\uXXXX`
//! - Integers verbatim; floats in shortest round-trip form
//!
//! The pretty layout used for files on disk shares the same scalar rules and
//! only adds two-space indentation and `": "` separators.
//!
//! **This encoding is frozen.** Anchored digests depend on every byte of it.

use serde_json::{Map, Number, Value};
use std::fmt::Write;

use crate::error::{CoreError, Result};

/// Indentation width for the on-disk layout.
const PRETTY_INDENT: usize = 2;

/// Decimal exponent range rendered in positional notation: `1e-4 <= |x| < 1e16`.
const FIXED_EXP_MIN: i32 = -4;
const FIXED_EXP_MAX: i32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Compact,
    Pretty,
}

/// Encode a JSON value to its canonical compact string.
pub fn canonical_string(value: &Value) -> Result<String> {
    let mut buf = String::new();
    encode_value(&mut buf, value, Layout::Compact, 0)?;
    Ok(buf)
}

/// Encode a JSON value to canonical UTF-8 bytes (the digest input).
pub fn canonical_bytes(value: &Value) -> Result<Vec<u8>> {
    canonical_string(value).map(String::into_bytes)
}

/// Encode a JSON value with sorted keys and two-space indentation.
pub fn canonical_pretty(value: &Value) -> Result<String> {
    let mut buf = String::new();
    encode_value(&mut buf, value, Layout::Pretty, 0)?;
    Ok(buf)
}

/// Recursively encode a JSON value.
fn encode_value(buf: &mut String, value: &Value, layout: Layout, depth: usize) -> Result<()> {
    match value {
        Value::Null => buf.push_str("null"),
        Value::Bool(b) => buf.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => encode_number(buf, n)?,
        Value::String(s) => encode_string(buf, s),
        Value::Array(items) => encode_array(buf, items, layout, depth)?,
        Value::Object(map) => encode_object(buf, map, layout, depth)?,
    }
    Ok(())
}

fn encode_number(buf: &mut String, n: &Number) -> Result<()> {
    if let Some(u) = n.as_u64() {
        let _ = write!(buf, "{}", u);
    } else if let Some(i) = n.as_i64() {
        let _ = write!(buf, "{}", i);
    } else {
        let f = n.as_f64().ok_or(CoreError::NonFiniteNumber)?;
        buf.push_str(&format_float(f)?);
    }
    Ok(())
}

/// Render a float in the frozen digest format.
///
/// Digits come from the shortest round-trip representation. Decimal exponents
/// in `[-4, 16)` use positional notation with at least one fractional digit;
/// anything else uses `d.ddde±XX` with a two-digit minimum exponent.
pub fn format_float(f: f64) -> Result<String> {
    if !f.is_finite() {
        return Err(CoreError::NonFiniteNumber);
    }

    // `{:e}` yields the shortest digits that round-trip, e.g. "-1.2345e3".
    let sci = format!("{:e}", f);
    let (mantissa, exp) = sci
        .split_once('e')
        .ok_or_else(|| CoreError::EncodingError(format!("unexpected float form {}", sci)))?;
    let exp: i32 = exp
        .parse()
        .map_err(|_| CoreError::EncodingError(format!("unexpected float form {}", sci)))?;

    let negative = mantissa.starts_with('-');
    let digits: String = mantissa.chars().filter(|c| c.is_ascii_digit()).collect();

    let mut out = String::with_capacity(digits.len() + 8);
    if negative {
        out.push('-');
    }

    if (FIXED_EXP_MIN..FIXED_EXP_MAX).contains(&exp) {
        if exp >= 0 {
            let int_len = exp as usize + 1;
            if digits.len() <= int_len {
                out.push_str(&digits);
                out.extend(std::iter::repeat('0').take(int_len - digits.len()));
                out.push_str(".0");
            } else {
                out.push_str(&digits[..int_len]);
                out.push('.');
                out.push_str(&digits[int_len..]);
            }
        } else {
            out.push_str("0.");
            out.extend(std::iter::repeat('0').take((-exp - 1) as usize));
            out.push_str(&digits);
        }
    } else {
        out.push_str(&digits[..1]);
        if digits.len() > 1 {
            out.push('.');
            out.push_str(&digits[1..]);
        }
        let sign = if exp < 0 { '-' } else { '+' };
        let _ = write!(out, "e{}{:02}", sign, exp.unsigned_abs());
    }

    Ok(out)
}

/// Encode a string with ASCII-only escaping.
fn encode_string(buf: &mut String, s: &str) {
    buf.push('"');
    for c in s.chars() {
        match c {
            '"' => buf.push_str("\\\""),
            '\\' => buf.push_str("\\\\"),
            '\n' => buf.push_str("\\n"),
            '\r' => buf.push_str("\\r"),
            '\t' => buf.push_str("\\t"),
            '\u{08}' => buf.push_str("\\b"),
            '\u{0c}' => buf.push_str("\\f"),
            ' '..='~' => buf.push(c),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(buf, "\\u{:04x}", unit);
                }
            }
        }
    }
    buf.push('"');
}

fn encode_array(buf: &mut String, items: &[Value], layout: Layout, depth: usize) -> Result<()> {
    if items.is_empty() {
        buf.push_str("[]");
        return Ok(());
    }

    buf.push('[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            buf.push(',');
        }
        newline(buf, layout, depth + 1);
        encode_value(buf, item, layout, depth + 1)?;
    }
    newline(buf, layout, depth);
    buf.push(']');
    Ok(())
}

/// Encode an object with keys sorted by code point.
fn encode_object(
    buf: &mut String,
    map: &Map<String, Value>,
    layout: Layout,
    depth: usize,
) -> Result<()> {
    if map.is_empty() {
        buf.push_str("{}");
        return Ok(());
    }

    // The map may preserve insertion order depending on serde_json features.
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    buf.push('{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            buf.push(',');
        }
        newline(buf, layout, depth + 1);
        encode_string(buf, key);
        buf.push(':');
        if layout == Layout::Pretty {
            buf.push(' ');
        }
        encode_value(buf, value, layout, depth + 1)?;
    }
    newline(buf, layout, depth);
    buf.push('}');
    Ok(())
}

fn newline(buf: &mut String, layout: Layout, depth: usize) {
    if layout == Layout::Pretty {
        buf.push('\n');
        buf.extend(std::iter::repeat(' ').take(depth * PRETTY_INDENT));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_encoding_deterministic() {
        let value = json!({"b": 1, "a": [true, null, "x"]});
        let s1 = canonical_string(&value).unwrap();
        let s2 = canonical_string(&value).unwrap();
        assert_eq!(s1, s2);
        assert_eq!(s1, r#"{"a":[true,null,"x"],"b":1}"#);
    }

    #[test]
    fn test_nested_keys_sorted() {
        let value = json!({"z": {"y": 1, "x": {"b": 2, "a": 1}}, "a": 0});
        assert_eq!(
            canonical_string(&value).unwrap(),
            r#"{"a":0,"z":{"x":{"a":1,"b":2},"y":1}}"#
        );
    }

    #[test]
    fn test_float_formatting() {
        let cases: &[(f64, &str)] = &[
            (0.0, "0.0"),
            (-0.0, "-0.0"),
            (1.0, "1.0"),
            (0.5, "0.5"),
            (123.456, "123.456"),
            (0.000123, "0.000123"),
            (0.0001, "0.0001"),
            (0.00001, "1e-05"),
            (1.5e-7, "1.5e-07"),
            (1e15, "1000000000000000.0"),
            (1e16, "1e+16"),
            (1.25e17, "1.25e+17"),
            (-2.5, "-2.5"),
            (0.1 + 0.2, "0.30000000000000004"),
            (1e100, "1e+100"),
        ];
        for (f, expected) in cases {
            assert_eq!(format_float(*f).unwrap(), *expected, "formatting {}", f);
        }
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(format_float(f64::NAN).is_err());
        assert!(format_float(f64::INFINITY).is_err());
    }

    #[test]
    fn test_integers_verbatim() {
        let value = json!({"n": 65, "m": -3, "big": u64::MAX});
        assert_eq!(
            canonical_string(&value).unwrap(),
            r#"{"big":18446744073709551615,"m":-3,"n":65}"#
        );
    }

    #[test]
    fn test_string_escaping() {
        let value = json!("quote\" back\\ nl\n tab\t bell\u{7} del\u{7f} é 😀");
        assert_eq!(
            canonical_string(&value).unwrap(),
            r#""quote\" back\\ nl\n tab\t bell\u0007 del\u007f \u00e9 \ud83d\ude00""#
        );
    }

    #[test]
    fn test_pretty_layout() {
        let value = json!({"b": [1, 2], "a": {"c": "x"}, "e": {}, "d": []});
        let expected = "{\n  \"a\": {\n    \"c\": \"x\"\n  },\n  \"b\": [\n    1,\n    2\n  ],\n  \"d\": [],\n  \"e\": {}\n}";
        assert_eq!(canonical_pretty(&value).unwrap(), expected);
    }

    #[test]
    fn test_pretty_reparses_to_same_compact_form() {
        let value = json!({"k": 0.1, "s": "ü", "n": null, "arr": [1.5, {"z": 1, "a": 2}]});
        let pretty = canonical_pretty(&value).unwrap();
        let reparsed: Value = serde_json::from_str(&pretty).unwrap();
        assert_eq!(
            canonical_string(&value).unwrap(),
            canonical_string(&reparsed).unwrap()
        );
    }

    proptest::proptest! {
        #[test]
        fn prop_float_rendering_roundtrips(f in proptest::num::f64::NORMAL | proptest::num::f64::SUBNORMAL | proptest::num::f64::ZERO) {
            let rendered = format_float(f).unwrap();
            let parsed: f64 = rendered.parse().unwrap();
            proptest::prop_assert_eq!(parsed.to_bits(), f.to_bits());
        }
    }
}
