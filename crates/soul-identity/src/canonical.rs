//! Canonical JSON for signatures (RFC 8785, JCS).
//!
//! Signer and verifier must hash byte-identical input regardless of field
//! insertion order or implementation language. Object keys are sorted by
//! UTF-16 code units at every level, no whitespace is emitted, strings use
//! the JCS escaping rules and numbers follow ECMAScript `Number::toString`.

use serde::Serialize;
use serde_json::Value;

use crate::error::{IdentityError, Result};

/// Canonicalize a JSON value.
pub fn canonicalize(value: &Value) -> Result<String> {
    let mut out = String::new();
    write_value(&mut out, value)?;
    Ok(out)
}

/// Serialize any record and return its canonical bytes.
pub fn canonical_bytes<T: Serialize + ?Sized>(record: &T) -> Result<Vec<u8>> {
    let value = serde_json::to_value(record)?;
    Ok(canonicalize(&value)?.into_bytes())
}

/// Canonical bytes of `record` with the named top-level fields removed.
///
/// Used to compute the signed body of a record whose proof fields live
/// alongside the content they cover.
pub fn canonical_bytes_without<T: Serialize + ?Sized>(record: &T, strip: &[&str]) -> Result<Vec<u8>> {
    let mut value = serde_json::to_value(record)?;
    if let Value::Object(map) = &mut value {
        for field in strip {
            map.remove(*field);
        }
    }
    Ok(canonicalize(&value)?.into_bytes())
}

/// Canonical body of a record as it arrived on the wire.
///
/// Typed views drop what they do not model: fields nested inside known
/// objects, explicit `null`s, fields another implementation added. A record
/// deserialized from JSON keeps the canonical bytes of the received body next
/// to the canonical bytes of its typed view. While the typed view is
/// unchanged, signatures are checked against what was received. Records
/// built locally hold nothing here.
#[derive(Debug, Clone, Default)]
pub(crate) struct ReceivedBody(Option<Captured>);

#[derive(Debug, Clone)]
struct Captured {
    received: Vec<u8>,
    parsed: Vec<u8>,
}

impl ReceivedBody {
    /// Record the received `raw` JSON of `parsed`, minus the `strip` fields.
    pub(crate) fn capture<T: Serialize + ?Sized>(
        raw: &Value,
        parsed: &T,
        strip: &[&str],
    ) -> Result<Self> {
        Ok(Self(Some(Captured {
            received: canonical_bytes_without(raw, strip)?,
            parsed: canonical_bytes_without(parsed, strip)?,
        })))
    }

    /// Bytes a signature over `record` must cover.
    ///
    /// Once the typed view has been edited, the received body no longer
    /// describes it and the typed view is canonicalized instead.
    pub(crate) fn signed_bytes<T: Serialize + ?Sized>(
        &self,
        record: &T,
        strip: &[&str],
    ) -> Result<Vec<u8>> {
        let current = canonical_bytes_without(record, strip)?;
        match &self.0 {
            Some(body) if body.parsed == current => Ok(body.received.clone()),
            _ => Ok(current),
        }
    }
}

// Where a record came from does not take part in comparing records.
impl PartialEq for ReceivedBody {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

impl Eq for ReceivedBody {}

fn write_value(out: &mut String, value: &Value) -> Result<()> {
    match value {
        Value::Object(map) => {
            let mut pairs: Vec<_> = map.iter().collect();
            pairs.sort_by(|(a, _), (b, _)| a.encode_utf16().cmp(b.encode_utf16()));

            out.push('{');
            for (idx, (k, v)) in pairs.into_iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_string(out, k);
                out.push(':');
                write_value(out, v)?;
            }
            out.push('}');
        }
        Value::Array(arr) => {
            out.push('[');
            for (idx, v) in arr.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_value(out, v)?;
            }
            out.push(']');
        }
        Value::String(s) => write_string(out, s),
        Value::Number(n) => out.push_str(&canonical_number(n)?),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Null => out.push_str("null"),
    }
    Ok(())
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Largest integer an IEEE double holds exactly (2^53 - 1).
const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

fn canonical_number(n: &serde_json::Number) -> Result<String> {
    // integers past 2^53 render as the double they round to
    if let Some(i) = n.as_i64() {
        if i.unsigned_abs() <= MAX_SAFE_INTEGER {
            return Ok(i.to_string());
        }
        return canonical_f64(i as f64);
    }
    if let Some(u) = n.as_u64() {
        if u <= MAX_SAFE_INTEGER {
            return Ok(u.to_string());
        }
        return canonical_f64(u as f64);
    }
    match n.as_f64() {
        Some(f) => canonical_f64(f),
        None => Err(IdentityError::SerializationError(
            "unsupported JSON number".into(),
        )),
    }
}

/// ECMAScript `Number::toString` for finite doubles.
///
/// `ryu` supplies the shortest round-tripping digit string; the layout
/// (plain, fractional, or exponent form) is then chosen from the decimal
/// exponent exactly as ECMA-262 section 6.1.6.1.20 prescribes.
fn canonical_f64(v: f64) -> Result<String> {
    if !v.is_finite() {
        return Err(IdentityError::SerializationError(
            "non-finite numbers are not valid JSON".into(),
        ));
    }
    if v == 0.0 {
        // -0 renders as 0
        return Ok("0".to_string());
    }

    let sign = if v < 0.0 { "-" } else { "" };
    let mut buf = ryu::Buffer::new();
    let (digits, n) = decimal_parts(buf.format_finite(v.abs()))?;
    let k = digits.len() as i32;

    let body = if k <= n && n <= 21 {
        format!("{digits}{}", "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        format!("{}.{}", &digits[..n as usize], &digits[n as usize..])
    } else if -6 < n && n <= 0 {
        format!("0.{}{digits}", "0".repeat((-n) as usize))
    } else {
        let exp = n - 1;
        let exp_sign = if exp >= 0 { "+" } else { "-" };
        let mantissa = if k == 1 {
            digits.clone()
        } else {
            format!("{}.{}", &digits[..1], &digits[1..])
        };
        format!("{mantissa}e{exp_sign}{}", exp.abs())
    };
    Ok(format!("{sign}{body}"))
}

/// Split a positive decimal rendering into significant digits `d` and the
/// exponent `n` such that the value equals `0.d × 10^n`.
fn decimal_parts(rendered: &str) -> Result<(String, i32)> {
    let (mantissa, exp) = match rendered.split_once(['e', 'E']) {
        Some((m, e)) => {
            let exp: i32 = e.parse().map_err(|_| {
                IdentityError::SerializationError(format!("bad float exponent: {rendered}"))
            })?;
            (m, exp)
        }
        None => (rendered, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let all = format!("{int_part}{frac_part}");
    let leading = all.len() - all.trim_start_matches('0').len();
    let digits = all[leading..].trim_end_matches('0').to_string();
    if digits.is_empty() {
        return Err(IdentityError::SerializationError(format!(
            "zero reached float formatting: {rendered}"
        )));
    }
    let n = int_part.len() as i32 - leading as i32 + exp;
    Ok((digits, n))
}
