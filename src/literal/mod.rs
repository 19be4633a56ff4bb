//! Literal notation values.
//!
//! Test data arrives as free-form text (`nums = [2,7,11,15], target = 9`).
//! The same grammar parses harness output, so input embedding and result
//! comparison share one notion of value and equality.
//!
//! Numeric policy: `Integer` and `Float` compare equal when they denote the
//! same value (`1 == 1.0`). JavaScript has a single number type and prints
//! `2.0` as `2`, so a stricter rule would fail correct solutions there.
//! Integers outside the `i64` range are kept exactly as `BigInteger` digit
//! strings.

pub mod parser;

pub use parser::{parse, parse_assignments, parse_case_input, split_nested, split_top_level};

use crate::config::types::{Result, VerifyError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Typed value of the literal notation
#[derive(Clone, Debug)]
pub enum LiteralValue {
    Integer(i64),
    /// Integer outside the `i64` range: optional `-`, digits, no leading zeros
    BigInteger(String),
    Float(f64),
    Boolean(bool),
    Null,
    String(String),
    List(Vec<LiteralValue>),
    Map(BTreeMap<String, LiteralValue>),
}

impl LiteralValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            LiteralValue::Integer(_) | LiteralValue::BigInteger(_) => "integer",
            LiteralValue::Float(_) => "float",
            LiteralValue::Boolean(_) => "boolean",
            LiteralValue::Null => "null",
            LiteralValue::String(_) => "string",
            LiteralValue::List(_) => "list",
            LiteralValue::Map(_) => "map",
        }
    }

    pub fn as_list(&self) -> Option<&[LiteralValue]> {
        match self {
            LiteralValue::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Integer from a decimal token of optional sign and digits.
///
/// Falls back to `BigInteger` when the value does not fit an `i64`.
pub fn integer_from_digits(token: &str) -> Option<LiteralValue> {
    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token.strip_prefix('+').unwrap_or(token)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if let Ok(value) = token.parse::<i64>() {
        return Some(LiteralValue::Integer(value));
    }
    let digits = digits.trim_start_matches('0');
    Some(LiteralValue::BigInteger(if negative {
        format!("-{}", digits)
    } else {
        digits.to_string()
    }))
}

fn big_integer_equals_float(digits: &str, f: f64) -> bool {
    // `{:.0}` prints the exact decimal expansion of an integral float.
    f.is_finite() && f.fract() == 0.0 && format!("{:.0}", f) == digits
}

fn integer_equals_float(i: i64, f: f64) -> bool {
    // 2^63 as f64; anything at or above it cannot be an i64.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    f.is_finite() && f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f) && f as i64 == i
}

impl PartialEq for LiteralValue {
    fn eq(&self, other: &Self) -> bool {
        use LiteralValue::*;
        match (self, other) {
            (Integer(a), Integer(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Integer(i), Float(f)) | (Float(f), Integer(i)) => integer_equals_float(*i, *f),
            (BigInteger(a), BigInteger(b)) => a == b,
            (BigInteger(d), Float(f)) | (Float(f), BigInteger(d)) => big_integer_equals_float(d, *f),
            (Boolean(a), Boolean(b)) => a == b,
            (Null, Null) => true,
            (String(a), String(b)) => a == b,
            (List(a), List(b)) => a == b,
            (Map(a), Map(b)) => a == b,
            _ => false,
        }
    }
}

pub(crate) fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let quoted = serde_json::to_string(s).map_err(|_| fmt::Error)?;
    f.write_str(&quoted)
}

/// Canonical compact rendering; re-parses to an equal value.
impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Integer(i) => write!(f, "{}", i),
            LiteralValue::BigInteger(digits) => f.write_str(digits),
            // Debug keeps a `.0` or exponent on every finite float
            LiteralValue::Float(x) => write!(f, "{:?}", x),
            LiteralValue::Boolean(b) => write!(f, "{}", b),
            LiteralValue::Null => f.write_str("null"),
            LiteralValue::String(s) => write_quoted(f, s),
            LiteralValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            LiteralValue::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write_quoted(f, key)?;
                    write!(f, ":{}", value)?;
                }
                f.write_str("}")
            }
        }
    }
}

// Reports carry values in their canonical text form.
impl Serialize for LiteralValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LiteralValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Ordered, uniquely named arguments of one test case
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseInputs {
    entries: Vec<(String, LiteralValue)>,
}

impl CaseInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Positional arguments named `arg0`, `arg1`, ...
    pub fn positional(values: Vec<LiteralValue>) -> Self {
        Self {
            entries: values
                .into_iter()
                .enumerate()
                .map(|(i, v)| (format!("arg{}", i), v))
                .collect(),
        }
    }

    pub fn push(&mut self, name: impl Into<String>, value: LiteralValue) -> Result<()> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(VerifyError::literal(
                0,
                format!("duplicate parameter name `{}`", name),
            ));
        }
        self.entries.push((name, value));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&LiteralValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LiteralValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &LiteralValue> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Values arranged for a call to a callable declaring `parameters`.
    ///
    /// When every input name is a declared parameter the values follow
    /// declaration order; otherwise input order is taken as positional.
    pub fn arrange_for<S: AsRef<str>>(&self, parameters: &[S]) -> Vec<&LiteralValue> {
        let named = parameters.len() == self.entries.len()
            && self
                .names()
                .all(|n| parameters.iter().any(|p| p.as_ref() == n));
        if named {
            parameters
                .iter()
                .filter_map(|p| self.get(p.as_ref()))
                .collect()
        } else {
            self.values().collect()
        }
    }

    /// Canonical rendering of the argument values, used to detect duplicate cases
    pub fn canonical_key(&self) -> String {
        self.values()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for CaseInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} = {}", name, value)?;
        }
        Ok(())
    }
}
