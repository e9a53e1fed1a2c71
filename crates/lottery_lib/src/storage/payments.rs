use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Result as SqlResult, Row, params};

use crate::types::{NewPayment, Payment, PaymentMetadata};

const PAYMENT_COLUMNS: &str = "id, payment_intent_id, amount, currency, status, payment_type,
     customer_email, metadata, created_at";

fn payment_from_row(row: &Row<'_>) -> SqlResult<Payment> {
    let metadata_json: String = row.get(7)?;
    let metadata: PaymentMetadata = serde_json::from_str(&metadata_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Payment {
        id: row.get(0)?,
        payment_intent_id: row.get(1)?,
        amount: row.get(2)?,
        currency: row.get(3)?,
        status: row.get(4)?,
        payment_type: row.get(5)?,
        customer_email: row.get(6)?,
        metadata,
        created_at: row.get(8)?,
    })
}

/// Ingestion-side write of a committed payment. Returns the new row id.
pub fn insert_payment(conn: &Connection, payment: &NewPayment) -> SqlResult<i64> {
    let metadata = serde_json::to_string(&payment.metadata)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
    conn.execute(
        "INSERT INTO payments (
            payment_intent_id, amount, currency, status, payment_type,
            customer_email, metadata, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            payment.payment_intent_id,
            payment.amount,
            payment.currency,
            payment.status,
            payment.payment_type,
            payment.customer_email,
            metadata,
            Utc::now(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_payment(conn: &Connection, id: i64) -> SqlResult<Option<Payment>> {
    conn.query_row(
        &format!("SELECT {} FROM payments WHERE id = ?", PAYMENT_COLUMNS),
        [id],
        payment_from_row,
    )
    .optional()
}
