use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Result as SqlResult, Row, params};

use crate::types::{PrizePosition, Winner};

const WINNER_SELECT: &str = "SELECT lw.id, lw.lottery_round, lw.participant_id, lw.prize_position,
            lw.prize_amount, lw.winning_ticket, lw.claimed,
            lp.participant_email, lp.investment_amount, lw.created_at
     FROM lottery_winners lw
     JOIN lottery_participants lp ON lw.participant_id = lp.id";

fn winner_from_row(row: &Row<'_>) -> SqlResult<Winner> {
    Ok(Winner {
        id: row.get(0)?,
        lottery_round: row.get(1)?,
        participant_id: row.get(2)?,
        prize_position: row.get(3)?,
        prize_amount: row.get(4)?,
        winning_ticket: row.get(5)?,
        claimed: row.get(6)?,
        participant_email: row.get(7)?,
        investment_amount: row.get(8)?,
        drawn_at: row.get(9)?,
    })
}

pub fn insert_winner(
    conn: &Connection,
    lottery_round: i64,
    participant_id: i64,
    prize_position: PrizePosition,
    prize_amount: i64,
    winning_ticket: &str,
    drawn_at: DateTime<Utc>,
) -> SqlResult<i64> {
    conn.execute(
        "INSERT INTO lottery_winners (
            lottery_round, participant_id, prize_position, prize_amount,
            winning_ticket, claimed, created_at
        ) VALUES (?, ?, ?, ?, ?, 0, ?)",
        params![
            lottery_round,
            participant_id,
            prize_position,
            prize_amount,
            winning_ticket,
            drawn_at
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn count_in_round(conn: &Connection, lottery_round: i64) -> SqlResult<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM lottery_winners WHERE lottery_round = ?",
        [lottery_round],
        |row| row.get(0),
    )
}

pub fn list_by_round(conn: &Connection, lottery_round: i64) -> SqlResult<Vec<Winner>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE lw.lottery_round = ? ORDER BY lw.prize_position ASC",
        WINNER_SELECT
    ))?;
    let winners = stmt
        .query_map([lottery_round], winner_from_row)?
        .collect::<SqlResult<Vec<Winner>>>()?;
    Ok(winners)
}

pub fn find(
    conn: &Connection,
    lottery_round: i64,
    prize_position: PrizePosition,
) -> SqlResult<Option<Winner>> {
    conn.query_row(
        &format!(
            "{} WHERE lw.lottery_round = ? AND lw.prize_position = ?",
            WINNER_SELECT
        ),
        params![lottery_round, prize_position],
        winner_from_row,
    )
    .optional()
}

/// Returns 0 when the prize was already claimed.
pub fn mark_claimed(conn: &Connection, id: i64) -> SqlResult<usize> {
    conn.execute(
        "UPDATE lottery_winners SET claimed = 1 WHERE id = ? AND claimed = 0",
        [id],
    )
}
