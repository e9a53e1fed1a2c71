use anyhow::Result;
use lottery_lib::types::RoundSummary;
use tracing::info;

use crate::App;

pub fn run_one(app: &App) -> Result<RoundSummary> {
    let status = app.refresh_fund()?;
    info!(
        round = status.current_round,
        total_investment = status.total_investment,
        prize_fund = status.total_prize_fund,
        participants = status.total_participants,
        tickets = status.total_tickets,
        "prize fund refreshed"
    );
    Ok(status)
}
