use rusqlite::{Connection, Result};

pub fn create_tables(conn: &Connection) -> Result<()> {
    // Written by the payment ingestion side, read here.
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS payments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            payment_intent_id TEXT NOT NULL UNIQUE,
            amount INTEGER NOT NULL CHECK (amount > 0),  -- cents
            currency TEXT NOT NULL DEFAULT 'usd',
            status TEXT NOT NULL,                         -- pending|succeeded|failed|canceled
            payment_type TEXT NOT NULL,                   -- investment|donation
            customer_email TEXT,
            metadata TEXT NOT NULL DEFAULT '{}',          -- JSON object of strings
            created_at TEXT NOT NULL
        )
        "#,
        [],
    )?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS lottery_rounds (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            round_number INTEGER NOT NULL UNIQUE,
            total_investment_amount INTEGER NOT NULL DEFAULT 0,
            prize_fund_1 INTEGER NOT NULL DEFAULT 0,
            prize_fund_2 INTEGER NOT NULL DEFAULT 0,
            prize_fund_3 INTEGER NOT NULL DEFAULT 0,
            total_participants INTEGER NOT NULL DEFAULT 0,
            draw_date TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
        [],
    )?;

    // At most one active round.
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_rounds_single_active
            ON lottery_rounds(is_active) WHERE is_active = 1",
        [],
    )?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS lottery_participants (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            payment_id INTEGER NOT NULL UNIQUE REFERENCES payments(id),
            lottery_round INTEGER NOT NULL,               -- round_number
            participant_email TEXT,
            investment_amount INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_participants_round ON lottery_participants(lottery_round)",
        [],
    )?;

    // One row per ticket; the primary key keeps ticket labels globally unique.
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS lottery_tickets (
            ticket TEXT PRIMARY KEY,
            participant_id INTEGER NOT NULL REFERENCES lottery_participants(id),
            lottery_round INTEGER NOT NULL,
            seq INTEGER NOT NULL
        )
        "#,
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_tickets_participant ON lottery_tickets(participant_id, seq)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_tickets_round ON lottery_tickets(lottery_round)",
        [],
    )?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS lottery_winners (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            lottery_round INTEGER NOT NULL,
            participant_id INTEGER NOT NULL REFERENCES lottery_participants(id),
            prize_position INTEGER NOT NULL CHECK (prize_position BETWEEN 1 AND 3),
            prize_amount INTEGER NOT NULL,
            winning_ticket TEXT NOT NULL,
            claimed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            UNIQUE (lottery_round, prize_position),
            UNIQUE (lottery_round, winning_ticket)
        )
        "#,
        [],
    )?;

    // Outbox consumed by the email sender.
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS winner_notifications (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            lottery_round INTEGER NOT NULL,
            prize_position INTEGER NOT NULL,
            recipient TEXT,
            prize_amount INTEGER NOT NULL,
            winning_ticket TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',       -- pending|delivered|failed
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_notifications_status_ts
            ON winner_notifications(status, created_at)",
        [],
    )?;

    Ok(())
}
