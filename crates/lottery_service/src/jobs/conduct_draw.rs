use anyhow::Result;
use lottery_lib::{LotteryError, draw::DrawOutcome};
use tracing::{debug, info};

use crate::App;

/// Draw the active round if it has anyone to draw from. Business-rule
/// refusals are not errors for a scheduled run.
pub fn run_one(app: &App) -> Result<Option<DrawOutcome>> {
    let status = app.refresh_fund()?;
    if status.total_tickets == 0 {
        debug!(round = status.current_round, "no tickets yet, skipping draw");
        return Ok(None);
    }

    match app.conduct_draw(Some(status.round_id)) {
        Ok(outcome) => {
            info!(
                round = outcome.round,
                winners = outcome.winners.len(),
                participants = outcome.participant_count,
                tickets = outcome.ticket_count,
                "scheduled draw completed"
            );
            Ok(Some(outcome))
        }
        Err(e @ (LotteryError::AlreadyDrawn { .. } | LotteryError::NoParticipants { .. })) => {
            debug!(round = status.current_round, reason = %e, "draw skipped");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
