//! Application layer for haperych.
//!
//! Wizard flows, their registration table, the router deciding which flow
//! an event belongs to, the free-text capture bridge and the dispatcher
//! that feeds events through all of it one at a time.

pub mod capture;
pub mod dispatcher;
pub mod flow;
pub mod registry;
pub mod router;

pub use dispatcher::Dispatcher;
pub use registry::{FlowEntry, FlowRegistry};
pub use router::{Clock, Router};
