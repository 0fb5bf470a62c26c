//! Attaching a free-text comment to an open loan.

use async_trait::async_trait;
use tracing::error;

use haperych_core::Result;
use haperych_core::chat::{Choice, Outgoing, Reply};
use haperych_core::token::{ArgKind, Decoded, Token};

use super::{Flow, FlowContext};

const SCHEMA: &[ArgKind] = &[ArgKind::Id, ArgKind::Text];

pub struct CommentFlow;

#[async_trait]
impl Flow for CommentFlow {
    fn prefix(&self) -> &'static str {
        "comment"
    }

    fn alias(&self) -> &'static str {
        "comment"
    }

    fn schema(&self) -> &'static [ArgKind] {
        SCHEMA
    }

    async fn handle(
        &self,
        ctx: &mut FlowContext<'_>,
        token: &Token,
        decoded: &Decoded,
    ) -> Result<Reply> {
        match decoded.success_count() {
            0 => {
                let loans = ctx.ledger.get_unsettled_loans().await?;
                if loans.is_empty() {
                    return Ok(ctx.finish("No open loans to comment on."));
                }
                let choices = loans
                    .iter()
                    .map(|loan| Choice::new(loan.label(), token.extend(loan.id)))
                    .collect();
                Ok(vec![Outgoing::menu("Comment which loan?", choices)])
            }
            1 => {
                ctx.session.arm_append(token.clone());
                Ok(vec![Outgoing::text("Type the comment.")])
            }
            _ => {
                let loan_id = decoded.int(0)?;
                match ctx.ledger.update_loan_comment(loan_id, decoded.text(1)?).await {
                    Ok(()) => Ok(ctx.finish(format!("Comment saved on loan #{loan_id}."))),
                    Err(e) => {
                        error!(%token, "update_loan_comment failed: {e}");
                        Ok(ctx.finish("Could not save the comment."))
                    }
                }
            }
        }
    }
}
