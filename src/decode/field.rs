// src/decode/field.rs

//! Field value decoding: quote unescaping and numeric literal recognition.

use crate::decode::scan::{FieldKind, RawField};
use crate::record::Value;

/// Decode one raw field span into a typed value.
pub fn decode_field(field: &RawField<'_>) -> Value {
    match field.kind {
        FieldKind::Plain => decode_plain(field.text),
        // an explicitly quoted field is always a string, inner bytes verbatim
        FieldKind::Quoted => Value::Str(field.text[1..field.text.len() - 1].to_string()),
        FieldKind::Escaped => Value::Str(unescape(field.text)),
    }
}

/// Collapse every doubled quote to a single one and strip the enclosing
/// quote characters. Characters outside quoted regions are copied through.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    let mut in_quote = false;

    while let Some(c) = chars.next() {
        if in_quote {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    out.push('"');
                } else {
                    in_quote = false;
                }
            } else {
                out.push(c);
            }
        } else if c == '"' {
            in_quote = true;
        } else {
            out.push(c);
        }
    }

    out
}

/// Numeric inference for an unquoted span: a run of digits is an integer,
/// one interior `.` makes it a float, anything else keeps the original span
/// as a string. Leading ASCII whitespace is skipped for inference only.
fn decode_plain(raw: &str) -> Value {
    let s = raw.trim_start_matches(|c: char| c.is_ascii_whitespace());
    if s.is_empty() {
        return Value::Str(raw.to_string());
    }

    let mut int_i: i64 = 0;
    let mut int_f = 0.0f64;
    let mut int_fits = true;
    let mut frac: i64 = 0;
    let mut frac_len: i32 = 0;
    let mut seen_dot = false;

    for c in s.chars() {
        match c {
            '0'..='9' => {
                let d = i64::from(c as u8 - b'0');
                if seen_dot {
                    // fraction digits past i64 range are below f64 precision
                    if let Some(v) = frac.checked_mul(10).and_then(|v| v.checked_add(d)) {
                        frac = v;
                        frac_len += 1;
                    }
                } else {
                    int_f = int_f * 10.0 + d as f64;
                    if int_fits {
                        match int_i.checked_mul(10).and_then(|v| v.checked_add(d)) {
                            Some(v) => int_i = v,
                            None => int_fits = false,
                        }
                    }
                }
            }
            '.' if !seen_dot => seen_dot = true,
            _ => return Value::Str(raw.to_string()),
        }
    }

    if seen_dot {
        let int_part = if int_fits { int_i as f64 } else { int_f };
        Value::Float(int_part + frac as f64 / 10f64.powi(frac_len))
    } else if int_fits {
        Value::Int(int_i)
    } else {
        // wider than i64: promoted to float rather than wrapped
        Value::Float(int_f)
    }
}
