use chrono::Utc;
use rand::Rng;
use rusqlite::{Connection, TransactionBehavior};
use std::collections::HashSet;
use tracing::info;

use crate::error::{LotteryError, LotteryResult};
use crate::rounds::{get_active_round, resolve_round_number};
use crate::storage::{participants, payments};
use crate::ticket::{generate_ticket, ticket_count};
use crate::types::{Participant, ParticipantList, Registration};

/// Regeneration attempts per ticket before giving up on a unique label.
pub const MAX_TICKET_ATTEMPTS: usize = 32;

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

/// Enter a succeeded investment into the active round. The participant row
/// and its tickets are committed together or not at all.
pub fn register_participant<R: Rng + ?Sized>(
    conn: &mut Connection,
    registration: &Registration,
    rng: &mut R,
) -> LotteryResult<Participant> {
    let payment_id = registration
        .payment_id
        .ok_or_else(|| LotteryError::invalid("payment_id is required"))?;
    if registration.amount <= 0 {
        return Err(LotteryError::invalid(format!(
            "investment amount must be positive, got {}",
            registration.amount
        )));
    }
    let email = registration
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());
    if let Some(email) = email {
        if !looks_like_email(email) {
            return Err(LotteryError::invalid(format!("malformed email '{}'", email)));
        }
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let payment = payments::find_payment(&tx, payment_id)?
        .ok_or_else(|| LotteryError::invalid(format!("payment {} does not exist", payment_id)))?;
    if !payment.is_qualifying_investment() {
        return Err(LotteryError::invalid(format!(
            "payment {} is a {} payment with status {}, only succeeded investments qualify",
            payment_id,
            payment.payment_type.as_str(),
            payment.status.as_str()
        )));
    }
    if registration.amount != payment.amount {
        return Err(LotteryError::invalid(format!(
            "investment amount {} does not match payment {} amount {}",
            registration.amount, payment_id, payment.amount
        )));
    }
    if let Some(existing) = participants::find_by_payment(&tx, payment_id)? {
        return Err(LotteryError::invalid(format!(
            "payment {} is already registered in round {}",
            payment_id, existing.lottery_round
        )));
    }

    let email = email
        .map(str::to_owned)
        .or_else(|| payment.customer_email.clone())
        .or_else(|| payment.metadata.email().map(str::to_owned));

    let round = get_active_round(&tx)?;
    let count = ticket_count(registration.amount);
    let created_at = Utc::now();

    let participant_id = participants::insert_participant(
        &tx,
        payment_id,
        round.round_number,
        email.as_deref(),
        registration.amount,
        created_at,
    )?;
    let tickets = issue_unique_tickets(&tx, rng, count)?;
    for (seq, ticket) in tickets.iter().enumerate() {
        participants::insert_ticket(&tx, ticket, participant_id, round.round_number, seq as i64)?;
    }

    tx.commit()?;

    info!(
        round = round.round_number,
        participant_id,
        payment_id,
        tickets = count,
        "registered lottery participant"
    );

    Ok(Participant {
        id: participant_id,
        payment_id,
        payment_intent_id: Some(payment.payment_intent_id),
        lottery_round: round.round_number,
        participant_email: email,
        investment_amount: registration.amount,
        ticket_numbers: tickets,
        created_at,
    })
}

/// Tickets unique against every ticket already issued and each other.
fn issue_unique_tickets<R: Rng + ?Sized>(
    conn: &Connection,
    rng: &mut R,
    count: usize,
) -> LotteryResult<Vec<String>> {
    let mut issued: Vec<String> = Vec::with_capacity(count);
    let mut seen: HashSet<String> = HashSet::with_capacity(count);

    for _ in 0..count {
        let mut attempts = 0;
        let ticket = loop {
            if attempts == MAX_TICKET_ATTEMPTS {
                return Err(LotteryError::TicketAllocation { attempts });
            }
            attempts += 1;
            let candidate = generate_ticket(rng);
            if !seen.contains(&candidate) && !participants::ticket_exists(conn, &candidate)? {
                break candidate;
            }
        };
        seen.insert(ticket.clone());
        issued.push(ticket);
    }
    Ok(issued)
}

/// Participants of a round (default: the active round), newest first.
pub fn list_participants(conn: &Connection, round: Option<i64>) -> LotteryResult<ParticipantList> {
    let round = resolve_round_number(conn, round)?;
    let mut list = participants::list_by_round(conn, round)?;
    list.reverse();
    let total_tickets = list.iter().map(Participant::tickets_count).sum();
    Ok(ParticipantList {
        round,
        total_participants: list.len(),
        total_tickets,
        participants: list,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(looks_like_email("a@example.com"));
        assert!(!looks_like_email("a@example"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("a@b@example.com"));
        assert!(!looks_like_email("plain"));
    }
}
