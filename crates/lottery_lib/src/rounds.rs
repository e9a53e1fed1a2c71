//! Active round lookup and the round lifecycle.
//!
//! The store is the only source of truth for which round is active: every
//! call re-reads it, and the single-active-round invariant is backed by a
//! partial unique index. A round moves `Open -> Drawing -> Closed` inside the
//! draw transaction, and the next round is opened in that same transaction.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, TransactionBehavior};
use tracing::{debug, info};

use crate::error::{LotteryError, LotteryResult};
use crate::fund::{compute_fund, prize_percentages};
use crate::storage::{participants, rounds};
use crate::types::{LotteryRound, RoundSummary};

/// Active round with the highest number, created on first use.
pub fn get_active_round(conn: &Connection) -> LotteryResult<LotteryRound> {
    if let Some(round) = rounds::find_active(conn)? {
        return Ok(round);
    }

    let last = rounds::max_round_number(conn)?;
    let round = rounds::insert_round(conn, last + 1)?;
    info!(round = round.round_number, "opened lottery round");
    Ok(round)
}

pub fn find_round_by_id(conn: &Connection, id: i64) -> LotteryResult<LotteryRound> {
    rounds::find_by_id(conn, id)?
        .ok_or_else(|| LotteryError::invalid(format!("round id {} does not exist", id)))
}

pub fn find_round_by_number(conn: &Connection, round_number: i64) -> LotteryResult<LotteryRound> {
    rounds::find_by_number(conn, round_number)?
        .ok_or_else(|| LotteryError::invalid(format!("round {} does not exist", round_number)))
}

/// Round number a read query targets: the requested one, else the active
/// round, else round 1. Never writes.
pub fn resolve_round_number(conn: &Connection, requested: Option<i64>) -> LotteryResult<i64> {
    match requested {
        Some(n) if n > 0 => Ok(n),
        Some(n) => Err(LotteryError::invalid(format!(
            "round must be positive, got {}",
            n
        ))),
        None => Ok(rounds::find_active(conn)?
            .map(|r| r.round_number)
            .unwrap_or(1)),
    }
}

/// Terminal transition of a round. Fails with `AlreadyDrawn` if the round is
/// not open any more.
pub fn close_round(conn: &Connection, round_id: i64, draw_date: DateTime<Utc>) -> LotteryResult<()> {
    let round = find_round_by_id(conn, round_id)?;
    if rounds::mark_closed(conn, round_id, draw_date)? == 0 {
        return Err(LotteryError::AlreadyDrawn {
            round: round.round_number,
        });
    }
    debug!(round = round.round_number, "closed lottery round");
    Ok(())
}

pub fn open_next_round(conn: &Connection, previous_round_number: i64) -> LotteryResult<LotteryRound> {
    let round = rounds::insert_round(conn, previous_round_number + 1)?;
    info!(round = round.round_number, "opened lottery round");
    Ok(round)
}

/// Recompute the round's fund snapshot from the investments registered in it
/// and persist it. An investment only funds the round that holds its tickets.
pub fn refresh_fund(conn: &Connection, round: &LotteryRound) -> LotteryResult<LotteryRound> {
    let totals = participants::investment_totals(conn, round.round_number)?;
    let fund = compute_fund(totals.total_amount);
    let total_participants = totals.investor_count;

    rounds::update_fund(
        conn,
        round.id,
        totals.total_amount,
        &fund,
        total_participants,
    )?;

    Ok(LotteryRound {
        total_investment_amount: totals.total_amount,
        prize_fund: fund,
        total_participants,
        updated_at: Utc::now(),
        ..round.clone()
    })
}

/// Active round summary with a freshly persisted fund snapshot.
pub fn get_status(conn: &mut Connection) -> LotteryResult<RoundSummary> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let round = get_active_round(&tx)?;
    let round = refresh_fund(&tx, &round)?;
    let total_tickets = participants::tickets_in_round(&tx, round.round_number)?;
    tx.commit()?;

    debug!(
        round = round.round_number,
        total_investment = round.total_investment_amount,
        prize_fund = round.prize_fund.total(),
        "refreshed lottery status"
    );
    Ok(summarize(&round, total_tickets))
}

pub fn summarize(round: &LotteryRound, total_tickets: i64) -> RoundSummary {
    RoundSummary {
        round_id: round.id,
        current_round: round.round_number,
        status: round.status(),
        total_investment: round.total_investment_amount,
        total_participants: round.total_participants,
        total_tickets,
        prize_fund: round.prize_fund,
        total_prize_fund: round.prize_fund.total(),
        prize_percentages: prize_percentages(),
        draw_date: round.draw_date,
        is_active: round.is_active,
    }
}
