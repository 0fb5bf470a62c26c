//! Registering a source or a legend source by name.
//!
//! Step 0 asks for the name and arms the alias capture; the next free text
//! is stored once and the flow ends.

use async_trait::async_trait;
use tracing::{error, info};

use haperych_core::Result;
use haperych_core::chat::{Outgoing, Reply};

use super::{FlowContext, TextFlow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entity {
    Source,
    Legend,
}

impl Entity {
    fn noun(self) -> &'static str {
        match self {
            Entity::Source => "source",
            Entity::Legend => "legend source",
        }
    }
}

/// Text flow adding one named entity.
pub struct NameFlow(Entity);

impl NameFlow {
    pub const SOURCE: NameFlow = NameFlow(Entity::Source);
    pub const LEGEND: NameFlow = NameFlow(Entity::Legend);
}

#[async_trait]
impl TextFlow for NameFlow {
    fn alias(&self) -> &'static str {
        match self.0 {
            Entity::Source => "source",
            Entity::Legend => "legend",
        }
    }

    async fn handle_text(&self, ctx: &mut FlowContext<'_>, text: Option<&str>) -> Result<Reply> {
        let alias = self.alias();
        let noun = self.0.noun();
        let name = match text {
            Some(name) if ctx.session.step(alias) > 0 => name,
            _ => {
                ctx.session.set_step(alias, 1);
                ctx.session.arm_alias(alias);
                return Ok(vec![Outgoing::text(format!("Name of the new {noun}?"))]);
            }
        };

        ctx.session.reset_step(alias);
        let added = match self.0 {
            Entity::Source => ctx.ledger.add_source(name).await,
            Entity::Legend => ctx.ledger.add_legend_source(name).await,
        };
        match added {
            Ok(id) => {
                info!(id, "{noun} added");
                Ok(ctx.finish(format!("Added {noun} '{}'.", name.trim())))
            }
            Err(e) => {
                error!("adding {noun} '{name}' failed: {e}");
                Ok(ctx.finish(format!("Could not add the {noun}: {e}")))
            }
        }
    }
}
