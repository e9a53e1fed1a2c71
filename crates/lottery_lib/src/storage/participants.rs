use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Result as SqlResult, Row, params};
use std::collections::HashMap;

use crate::types::{InvestmentTotals, Participant};

const PARTICIPANT_SELECT: &str = "SELECT lp.id, lp.payment_id, p.payment_intent_id, lp.lottery_round,
            lp.participant_email, lp.investment_amount, lp.created_at
     FROM lottery_participants lp
     LEFT JOIN payments p ON lp.payment_id = p.id";

fn participant_from_row(row: &Row<'_>) -> SqlResult<Participant> {
    Ok(Participant {
        id: row.get(0)?,
        payment_id: row.get(1)?,
        payment_intent_id: row.get(2)?,
        lottery_round: row.get(3)?,
        participant_email: row.get(4)?,
        investment_amount: row.get(5)?,
        ticket_numbers: Vec::new(),
        created_at: row.get(6)?,
    })
}

pub fn insert_participant(
    conn: &Connection,
    payment_id: i64,
    lottery_round: i64,
    participant_email: Option<&str>,
    investment_amount: i64,
    created_at: DateTime<Utc>,
) -> SqlResult<i64> {
    conn.execute(
        "INSERT INTO lottery_participants (
            payment_id, lottery_round, participant_email, investment_amount, created_at
        ) VALUES (?, ?, ?, ?, ?)",
        params![
            payment_id,
            lottery_round,
            participant_email,
            investment_amount,
            created_at
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_ticket(
    conn: &Connection,
    ticket: &str,
    participant_id: i64,
    lottery_round: i64,
    seq: i64,
) -> SqlResult<()> {
    conn.execute(
        "INSERT INTO lottery_tickets (ticket, participant_id, lottery_round, seq)
         VALUES (?, ?, ?, ?)",
        params![ticket, participant_id, lottery_round, seq],
    )?;
    Ok(())
}

pub fn ticket_exists(conn: &Connection, ticket: &str) -> SqlResult<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM lottery_tickets WHERE ticket = ?)",
        [ticket],
        |row| row.get(0),
    )
}

pub fn find_by_payment(conn: &Connection, payment_id: i64) -> SqlResult<Option<Participant>> {
    let participant = conn
        .query_row(
            &format!("{} WHERE lp.payment_id = ?", PARTICIPANT_SELECT),
            [payment_id],
            participant_from_row,
        )
        .optional()?;
    match participant {
        Some(mut p) => {
            p.ticket_numbers = tickets_of(conn, p.id)?;
            Ok(Some(p))
        }
        None => Ok(None),
    }
}

pub fn tickets_of(conn: &Connection, participant_id: i64) -> SqlResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT ticket FROM lottery_tickets WHERE participant_id = ? ORDER BY seq ASC",
    )?;
    let tickets = stmt
        .query_map([participant_id], |row| row.get(0))?
        .collect::<SqlResult<Vec<String>>>()?;
    Ok(tickets)
}

/// Participants of a round with their tickets, oldest first.
pub fn list_by_round(conn: &Connection, lottery_round: i64) -> SqlResult<Vec<Participant>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE lp.lottery_round = ? ORDER BY lp.id ASC",
        PARTICIPANT_SELECT
    ))?;
    let mut participants = stmt
        .query_map([lottery_round], participant_from_row)?
        .collect::<SqlResult<Vec<Participant>>>()?;

    let mut stmt = conn.prepare(
        "SELECT participant_id, ticket FROM lottery_tickets
         WHERE lottery_round = ?
         ORDER BY participant_id ASC, seq ASC",
    )?;
    let mut tickets: HashMap<i64, Vec<String>> = HashMap::new();
    let rows = stmt.query_map([lottery_round], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
    })?;
    for row in rows {
        let (participant_id, ticket) = row?;
        tickets.entry(participant_id).or_default().push(ticket);
    }

    for p in participants.iter_mut() {
        p.ticket_numbers = tickets.remove(&p.id).unwrap_or_default();
    }
    Ok(participants)
}

/// Invested cents and participant count of the investments registered in a round.
pub fn investment_totals(conn: &Connection, lottery_round: i64) -> SqlResult<InvestmentTotals> {
    conn.query_row(
        "SELECT COALESCE(SUM(investment_amount), 0), COUNT(*)
         FROM lottery_participants
         WHERE lottery_round = ?",
        [lottery_round],
        |row| {
            Ok(InvestmentTotals {
                total_amount: row.get(0)?,
                investor_count: row.get(1)?,
            })
        },
    )
}

pub fn tickets_in_round(conn: &Connection, lottery_round: i64) -> SqlResult<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM lottery_tickets WHERE lottery_round = ?",
        [lottery_round],
        |row| row.get(0),
    )
}
