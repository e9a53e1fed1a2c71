use chrono::Utc;
use rand::{CryptoRng, Rng, RngCore};
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{LotteryError, LotteryResult};
use crate::rounds::{
    close_round, find_round_by_id, get_active_round, open_next_round, refresh_fund,
    resolve_round_number,
};
use crate::storage::{participants, winners};
use crate::types::{LotteryRound, Participant, PrizePosition, RoundStatus, Winner, WinnerList};

/// Every ticket of a round, flattened in participant then issuance order.
#[derive(Clone, Debug, Default)]
pub struct TicketPool {
    tickets: Vec<String>,
    /// Index into the participant slice the pool was built from.
    owners: Vec<usize>,
}

impl TicketPool {
    pub fn from_participants(participants: &[Participant]) -> Self {
        let mut pool = TicketPool::default();
        for (owner, p) in participants.iter().enumerate() {
            for ticket in &p.ticket_numbers {
                pool.tickets.push(ticket.clone());
                pool.owners.push(owner);
            }
        }
        pool
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    pub fn ticket(&self, index: usize) -> &str {
        &self.tickets[index]
    }

    pub fn owner(&self, index: usize) -> usize {
        self.owners[index]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    pub position: PrizePosition,
    /// Index into the pool.
    pub ticket_index: usize,
}

/// Pick up to one ticket per prize position, uniformly among the tickets not
/// yet selected. Stops early when the pool runs out.
pub fn select_winners<R: RngCore + CryptoRng + ?Sized>(
    pool: &TicketPool,
    rng: &mut R,
) -> Vec<Selection> {
    let mut available: Vec<usize> = (0..pool.len()).collect();
    let mut selections = Vec::with_capacity(PrizePosition::ALL.len());

    for position in PrizePosition::ALL {
        if available.is_empty() {
            break;
        }
        let pick = rng.gen_range(0..available.len());
        let ticket_index = available.swap_remove(pick);
        selections.push(Selection {
            position,
            ticket_index,
        });
    }
    selections
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DrawOutcome {
    pub round: i64,
    pub winners: Vec<Winner>,
    pub participant_count: usize,
    pub ticket_count: usize,
    pub next_round: LotteryRound,
}

/// Draw the winners of a round (default: the active round), close it and
/// open the next one in a single transaction.
///
/// The transaction takes the write lock up front, so two concurrent draws
/// serialize and the loser observes the winner rows of the first one.
pub fn conduct_draw<R: RngCore + CryptoRng + ?Sized>(
    conn: &mut Connection,
    round_id: Option<i64>,
    rng: &mut R,
) -> LotteryResult<DrawOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let round = match round_id {
        Some(id) => find_round_by_id(&tx, id)?,
        None => get_active_round(&tx)?,
    };
    if round.status() != RoundStatus::Open
        || winners::count_in_round(&tx, round.round_number)? > 0
    {
        return Err(LotteryError::AlreadyDrawn {
            round: round.round_number,
        });
    }

    let entrants = participants::list_by_round(&tx, round.round_number)?;
    let pool = TicketPool::from_participants(&entrants);
    if pool.is_empty() {
        return Err(LotteryError::NoParticipants {
            round: round.round_number,
        });
    }

    debug!(
        round = round.round_number,
        status = ?RoundStatus::Drawing,
        participants = entrants.len(),
        tickets = pool.len(),
        "drawing lottery round"
    );

    let (drawn, next_round) = execute_draw(&tx, &round, &entrants, &pool, rng)
        .map_err(|e| LotteryError::draw_failed(round.round_number, e))?;
    tx.commit()
        .map_err(|e| LotteryError::draw_failed(round.round_number, e.into()))?;

    info!(
        round = round.round_number,
        winners = drawn.len(),
        next_round = next_round.round_number,
        "lottery round drawn"
    );

    Ok(DrawOutcome {
        round: round.round_number,
        winners: drawn,
        participant_count: entrants.len(),
        ticket_count: pool.len(),
        next_round,
    })
}

fn execute_draw<R: RngCore + CryptoRng + ?Sized>(
    conn: &Connection,
    round: &LotteryRound,
    entrants: &[Participant],
    pool: &TicketPool,
    rng: &mut R,
) -> LotteryResult<(Vec<Winner>, LotteryRound)> {
    // Prizes come from the snapshot persisted here, so the closed round keeps
    // the fund it paid out.
    let round = &refresh_fund(conn, round)?;
    let drawn_at = Utc::now();
    let mut drawn = Vec::with_capacity(PrizePosition::ALL.len());

    for selection in select_winners(pool, rng) {
        let owner = &entrants[pool.owner(selection.ticket_index)];
        let ticket = pool.ticket(selection.ticket_index);
        let prize_amount = round.prize_fund.amount_for(selection.position);
        let id = winners::insert_winner(
            conn,
            round.round_number,
            owner.id,
            selection.position,
            prize_amount,
            ticket,
            drawn_at,
        )?;
        drawn.push(Winner {
            id,
            lottery_round: round.round_number,
            participant_id: owner.id,
            prize_position: selection.position,
            prize_amount,
            winning_ticket: ticket.to_owned(),
            claimed: false,
            participant_email: owner.participant_email.clone(),
            investment_amount: owner.investment_amount,
            drawn_at,
        });
    }

    close_round(conn, round.id, drawn_at)?;
    let next_round = open_next_round(conn, round.round_number)?;
    Ok((drawn, next_round))
}

/// Winners of a round (default: the active round) by prize position.
pub fn list_winners(conn: &Connection, round: Option<i64>) -> LotteryResult<WinnerList> {
    let round = resolve_round_number(conn, round)?;
    let list = winners::list_by_round(conn, round)?;
    Ok(WinnerList {
        round,
        total_winners: list.len(),
        winners: list,
    })
}

pub fn claim_prize(conn: &mut Connection, round: i64, position: u8) -> LotteryResult<Winner> {
    let prize_position = PrizePosition::try_from(position).map_err(LotteryError::InvalidInput)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let winner = winners::find(&tx, round, prize_position)?.ok_or_else(|| {
        LotteryError::invalid(format!(
            "round {} has no winner at position {}",
            round, position
        ))
    })?;
    if winners::mark_claimed(&tx, winner.id)? == 0 {
        return Err(LotteryError::AlreadyClaimed { round, position });
    }
    tx.commit()?;

    info!(round, position, winner_id = winner.id, "prize claimed");
    Ok(Winner {
        claimed: true,
        ..winner
    })
}
