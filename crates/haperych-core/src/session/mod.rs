//! Session domain module.
//!
//! - `mode`: the tagged union describing the armed free-text capture
//! - `model`: the per-conversation `Session` record

mod mode;
mod model;

pub use mode::SessionMode;
pub use model::Session;
