//! Free text typed while a token capture is armed.
//!
//! The text becomes the next argument of the pending token. The operator
//! confirms with **Continue** (the extended token) or backs out with
//! **Cancel** (the pending token, which re-asks the same stage).

use tracing::{debug, warn};

use haperych_core::chat::{Choice, Outgoing, Reply};
use haperych_core::session::Session;
use haperych_core::token::Token;

use crate::flow::stale_button;
use crate::registry::FlowRegistry;

pub const CANCEL_LABEL: &str = "Cancel";
pub const CONTINUE_LABEL: &str = "Continue";

/// Bridges `text` into `pending`. The session mode is cleared whatever the
/// outcome.
pub fn capture(session: &mut Session, registry: &FlowRegistry, pending: &Token, text: &str) -> Reply {
    session.reset();

    let position = pending.arg_count();
    let Some(kind) = registry
        .by_prefix(pending.prefix())
        .and_then(|flow| flow.schema().get(position).copied())
    else {
        warn!(token = %pending, "captured text has no argument slot");
        return vec![stale_button()];
    };

    let cancel = Choice::new(CANCEL_LABEL, pending.clone());
    match kind.field_from_input(position, text) {
        Ok(field) => {
            let extended = pending.extend_raw(&field);
            debug!(token = %extended, "captured text");
            vec![Outgoing::menu(
                format!("Use \"{}\"?", text.trim()),
                vec![cancel, Choice::new(CONTINUE_LABEL, extended)],
            )]
        }
        Err(e) => {
            debug!(token = %pending, "rejected captured text: {e}");
            vec![Outgoing::menu(
                format!("Cannot use \"{}\": {}", text.trim(), e.reason),
                vec![cancel],
            )]
        }
    }
}
