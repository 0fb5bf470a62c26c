//! Wizard token wire format.
//!
//! A token carries a flow prefix followed by the answers collected so far:
//!
//! ```text
//! token    := prefix ( "_" arg )*
//! prefix   := [a-z]+
//! arg      := int | date | b64text
//! int      := "-"? [0-9]+
//! date     := YYYY "-" MM "-" DD
//! b64text  := standard base64 (A-Z a-z 0-9 + / =)
//! ```
//!
//! A token with `m` arguments belongs to a flow that finished stages `1..m`
//! and waits for stage `m + 1`. Tokens are never mutated; answers are folded
//! in by deriving a longer token.

mod arg;

pub use arg::{ALL_PERIODS, ArgKind, ArgValue, DATE_FORMAT, MAX_AMOUNT, decode_text, encode_text};

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DecodingError, HaperychError, Result};
use crate::report::GroupingKey;

/// Field separator of the wire format.
pub const SEPARATOR: char = '_';

/// Opaque button data for one in-progress flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The bare prefix of a flow: stage 0, no arguments.
    pub fn for_flow(prefix: &str) -> Self {
        Self(prefix.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn prefix(&self) -> &str {
        self.0.split(SEPARATOR).next().unwrap_or_default()
    }

    /// Argument fields, prefix excluded.
    pub fn raw_args(&self) -> Vec<&str> {
        self.0.split(SEPARATOR).skip(1).collect()
    }

    pub fn arg_count(&self) -> usize {
        self.0.matches(SEPARATOR).count()
    }

    /// Derives the token that also carries `value`.
    pub fn extend(&self, value: impl Into<ArgValue>) -> Token {
        self.extend_raw(&value.into().serialize())
    }

    /// Appends an already-serialized field.
    pub fn extend_raw(&self, field: &str) -> Token {
        debug_assert!(!field.contains(SEPARATOR), "field contains separator: {field}");
        Token(format!("{}{}{}", self.0, SEPARATOR, field))
    }

    /// The token holding only the first `count` arguments.
    pub fn truncated(&self, count: usize) -> Token {
        let mut fields = self.0.split(SEPARATOR);
        let mut raw = fields.next().unwrap_or_default().to_string();
        for field in fields.take(count) {
            raw.push(SEPARATOR);
            raw.push_str(field);
        }
        Token(raw)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Token {
    fn from(raw: &str) -> Self {
        Token::new(raw)
    }
}

impl From<String> for Token {
    fn from(raw: String) -> Self {
        Token(raw)
    }
}

/// Outcome of decoding a token against a schema.
///
/// Decoding stops at the first argument that fails; everything before it is
/// kept, nothing after it is populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    values: Vec<ArgValue>,
    /// The first rejected argument, if any.
    pub failure: Option<DecodingError>,
    /// The token carried more arguments than the schema knows.
    pub overflow: bool,
}

impl Decoded {
    pub fn success_count(&self) -> usize {
        self.values.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failure.is_none() && !self.overflow
    }

    pub fn values(&self) -> &[ArgValue] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Result<&ArgValue> {
        self.values.get(index).ok_or_else(|| {
            HaperychError::internal(format!(
                "argument #{index} requested but only {} decoded",
                self.values.len()
            ))
        })
    }

    pub fn int(&self, index: usize) -> Result<i64> {
        self.get(index)?.as_int()
    }

    pub fn date(&self, index: usize) -> Result<NaiveDate> {
        self.get(index)?.as_date()
    }

    pub fn text(&self, index: usize) -> Result<&str> {
        self.get(index)?.as_text()
    }

    pub fn grouping(&self, index: usize) -> Result<GroupingKey> {
        self.get(index)?.as_grouping()
    }
}

/// Decodes `token` positionally against `schema`, stopping at the first
/// deserialization failure.
pub fn decode(token: &Token, schema: &[ArgKind]) -> Decoded {
    let raw_args = token.raw_args();
    let mut values = Vec::with_capacity(schema.len());
    let mut failure = None;

    for (position, (raw, kind)) in raw_args.iter().zip(schema).enumerate() {
        match kind.parse(position, raw) {
            Ok(value) => values.push(value),
            Err(err) => {
                failure = Some(err);
                break;
            }
        }
    }

    let overflow = failure.is_none() && raw_args.len() > schema.len();
    Decoded {
        values,
        failure,
        overflow,
    }
}
