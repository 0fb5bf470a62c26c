//! Error types for the Haperych application.

use thiserror::Error;

/// A single argument of a token that could not be deserialized.
///
/// `position` is zero-based and counts arguments only (the prefix is not an
/// argument).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot decode argument #{position} '{raw}': {reason}")]
pub struct DecodingError {
    pub position: usize,
    pub raw: String,
    pub reason: String,
}

impl DecodingError {
    pub fn new(position: usize, raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            position,
            raw: raw.into(),
            reason: reason.into(),
        }
    }
}

/// A shared error type for the entire Haperych application.
///
/// Both capture modes of a session can never be armed at once (the session
/// mode is a tagged union), so there is no variant for that conflict.
#[derive(Error, Debug, Clone)]
pub enum HaperychError {
    /// An argument deserializer rejected its input.
    #[error(transparent)]
    Decoding(#[from] DecodingError),

    /// Button data carries a prefix no flow is registered for.
    #[error("Unknown flow for button data '{0}'")]
    UnknownFlow(String),

    /// A persistence operation failed.
    #[error("Store error: {0}")]
    Store(String),

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HaperychError {
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_unknown_flow(&self) -> bool {
        matches!(self, Self::UnknownFlow(_))
    }

    /// Store failures and missing entities end a flow with the generic
    /// failure message instead of the "broken button" one.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::Store(_) | Self::NotFound { .. } | Self::Io { .. } | Self::Serialization { .. }
        )
    }
}

impl From<std::io::Error> for HaperychError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<toml::de::Error> for HaperychError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for HaperychError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, HaperychError>`.
pub type Result<T> = std::result::Result<T, HaperychError>;
