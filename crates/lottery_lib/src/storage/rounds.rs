use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Result as SqlResult, Row, params};

use crate::fund::PrizeFund;
use crate::types::LotteryRound;

const ROUND_COLUMNS: &str = "id, round_number, total_investment_amount,
     prize_fund_1, prize_fund_2, prize_fund_3, total_participants,
     draw_date, is_active, created_at, updated_at";

fn round_from_row(row: &Row<'_>) -> SqlResult<LotteryRound> {
    Ok(LotteryRound {
        id: row.get(0)?,
        round_number: row.get(1)?,
        total_investment_amount: row.get(2)?,
        prize_fund: PrizeFund {
            first: row.get(3)?,
            second: row.get(4)?,
            third: row.get(5)?,
        },
        total_participants: row.get(6)?,
        draw_date: row.get(7)?,
        is_active: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

pub fn find_active(conn: &Connection) -> SqlResult<Option<LotteryRound>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM lottery_rounds
             WHERE is_active = 1
             ORDER BY round_number DESC
             LIMIT 1",
            ROUND_COLUMNS
        ),
        [],
        round_from_row,
    )
    .optional()
}

pub fn find_by_id(conn: &Connection, id: i64) -> SqlResult<Option<LotteryRound>> {
    conn.query_row(
        &format!("SELECT {} FROM lottery_rounds WHERE id = ?", ROUND_COLUMNS),
        [id],
        round_from_row,
    )
    .optional()
}

pub fn find_by_number(conn: &Connection, round_number: i64) -> SqlResult<Option<LotteryRound>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM lottery_rounds WHERE round_number = ?",
            ROUND_COLUMNS
        ),
        [round_number],
        round_from_row,
    )
    .optional()
}

pub fn max_round_number(conn: &Connection) -> SqlResult<i64> {
    conn.query_row(
        "SELECT COALESCE(MAX(round_number), 0) FROM lottery_rounds",
        [],
        |row| row.get(0),
    )
}

pub fn count_active(conn: &Connection) -> SqlResult<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM lottery_rounds WHERE is_active = 1",
        [],
        |row| row.get(0),
    )
}

/// Insert a fresh active round with all totals at zero.
pub fn insert_round(conn: &Connection, round_number: i64) -> SqlResult<LotteryRound> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO lottery_rounds (
            round_number, total_investment_amount, prize_fund_1, prize_fund_2, prize_fund_3,
            total_participants, draw_date, is_active, created_at, updated_at
        ) VALUES (?, 0, 0, 0, 0, 0, NULL, 1, ?, ?)",
        params![round_number, now, now],
    )?;
    let id = conn.last_insert_rowid();
    find_by_id(conn, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

pub fn update_fund(
    conn: &Connection,
    id: i64,
    total_investment_amount: i64,
    fund: &PrizeFund,
    total_participants: i64,
) -> SqlResult<usize> {
    conn.execute(
        "UPDATE lottery_rounds
         SET total_investment_amount = ?,
             prize_fund_1 = ?,
             prize_fund_2 = ?,
             prize_fund_3 = ?,
             total_participants = ?,
             updated_at = ?
         WHERE id = ? AND is_active = 1",
        params![
            total_investment_amount,
            fund.first,
            fund.second,
            fund.third,
            total_participants,
            Utc::now(),
            id
        ],
    )
}

/// Returns the number of rows closed: 0 when the round was not open.
pub fn mark_closed(conn: &Connection, id: i64, draw_date: DateTime<Utc>) -> SqlResult<usize> {
    conn.execute(
        "UPDATE lottery_rounds
         SET is_active = 0, draw_date = ?, updated_at = ?
         WHERE id = ? AND is_active = 1 AND draw_date IS NULL",
        params![draw_date, Utc::now(), id],
    )
}
