//! Typed token arguments and their string forms.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DecodingError, HaperychError, Result};
use crate::report::GroupingKey;

/// Date layout used on the wire.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Sentinel for "all years" / "all months" in period arguments.
pub const ALL_PERIODS: i64 = -1;

/// Largest money value a token may carry. Sums and percentages of values in
/// range stay far from `i64` overflow.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Escapes free text so it never contains the token separator.
///
/// The standard base64 alphabet has no `_`, so the result is always a single
/// token field.
pub fn encode_text(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Reverses [`encode_text`].
pub fn decode_text(field: &str) -> std::result::Result<String, String> {
    let bytes = STANDARD.decode(field).map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| e.to_string())
}

/// Deserializer descriptor for one position of a flow's schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgKind {
    /// Positive entity id.
    Id,
    /// Positive money amount in whole units, at most [`MAX_AMOUNT`].
    Amount,
    /// Reward in whole units; zero allowed, at most [`MAX_AMOUNT`].
    Reward,
    /// Calendar date, `YYYY-MM-DD`.
    Date,
    /// Free text, base64 on the wire.
    Text,
    /// Year or month, or [`ALL_PERIODS`].
    Period,
    /// Report grouping key.
    Grouping,
}

impl ArgKind {
    /// Deserializes the field at `position`.
    pub fn parse(self, position: usize, raw: &str) -> std::result::Result<ArgValue, DecodingError> {
        let fail = |reason: String| DecodingError::new(position, raw, reason);
        match self {
            ArgKind::Id => {
                let id: i64 = raw.parse().map_err(|e| fail(format!("{e}")))?;
                if id <= 0 {
                    return Err(fail("id must be positive".into()));
                }
                Ok(ArgValue::Int(id))
            }
            ArgKind::Amount | ArgKind::Reward => {
                let amount: i64 = raw.parse().map_err(|e| fail(format!("{e}")))?;
                if amount > MAX_AMOUNT {
                    return Err(fail(format!("must not exceed {MAX_AMOUNT}")));
                }
                match self {
                    ArgKind::Amount if amount <= 0 => Err(fail("amount must be positive".into())),
                    _ if amount < 0 => Err(fail("reward must not be negative".into())),
                    _ => Ok(ArgValue::Int(amount)),
                }
            }
            ArgKind::Period => {
                let period: i64 = raw.parse().map_err(|e| fail(format!("{e}")))?;
                if period != ALL_PERIODS && period <= 0 {
                    return Err(fail("period must be positive or -1".into()));
                }
                Ok(ArgValue::Int(period))
            }
            ArgKind::Date => NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .map(ArgValue::Date)
                .map_err(|e| fail(e.to_string())),
            ArgKind::Text => decode_text(raw).map(ArgValue::Text).map_err(fail),
            ArgKind::Grouping => raw
                .parse::<GroupingKey>()
                .map(ArgValue::Grouping)
                .map_err(|e| fail(e.to_string())),
        }
    }

    /// Turns operator-typed text into the wire field for this kind.
    ///
    /// Text is escaped; every other kind is trimmed and must deserialize.
    pub fn field_from_input(self, position: usize, input: &str) -> std::result::Result<String, DecodingError> {
        match self {
            ArgKind::Text => Ok(encode_text(input)),
            _ => {
                let trimmed = input.trim().replace(' ', "");
                self.parse(position, &trimmed)?;
                Ok(trimmed)
            }
        }
    }
}

/// A successfully decoded argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Int(i64),
    Date(NaiveDate),
    Text(String),
    Grouping(GroupingKey),
}

impl ArgValue {
    /// The wire form of this value; never contains the separator.
    pub fn serialize(&self) -> String {
        match self {
            ArgValue::Int(value) => value.to_string(),
            ArgValue::Date(date) => date.format(DATE_FORMAT).to_string(),
            ArgValue::Text(text) => encode_text(text),
            ArgValue::Grouping(key) => key.to_string(),
        }
    }

    pub fn as_int(&self) -> Result<i64> {
        match self {
            ArgValue::Int(value) => Ok(*value),
            other => Err(mismatch("integer", other)),
        }
    }

    pub fn as_date(&self) -> Result<NaiveDate> {
        match self {
            ArgValue::Date(date) => Ok(*date),
            other => Err(mismatch("date", other)),
        }
    }

    pub fn as_text(&self) -> Result<&str> {
        match self {
            ArgValue::Text(text) => Ok(text),
            other => Err(mismatch("text", other)),
        }
    }

    pub fn as_grouping(&self) -> Result<GroupingKey> {
        match self {
            ArgValue::Grouping(key) => Ok(*key),
            other => Err(mismatch("grouping", other)),
        }
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        ArgValue::Int(value)
    }
}

impl From<NaiveDate> for ArgValue {
    fn from(value: NaiveDate) -> Self {
        ArgValue::Date(value)
    }
}

impl From<GroupingKey> for ArgValue {
    fn from(value: GroupingKey) -> Self {
        ArgValue::Grouping(value)
    }
}

fn mismatch(expected: &str, got: &ArgValue) -> HaperychError {
    HaperychError::internal(format!("expected {expected} argument, got {got:?}"))
}
