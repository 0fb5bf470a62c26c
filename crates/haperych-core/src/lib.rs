//! Domain layer of Haperych: the wizard token codec, session state and the
//! seams to the store, the reporting subsystem and the chat transport.

pub mod chat;
pub mod config;
pub mod error;
pub mod ledger;
pub mod report;
pub mod session;
pub mod token;

// Re-export common error type
pub use error::{HaperychError, Result};
