use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a lottery round. `Drawing` only exists inside the draw
/// transaction and is never persisted.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    Open,
    Drawing,
    Closed,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
    Canceled,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Investment,
    Donation,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(into = "u8", try_from = "u8")]
pub enum PrizePosition {
    First,
    Second,
    Third,
}

impl PrizePosition {
    pub const ALL: [PrizePosition; 3] = [
        PrizePosition::First,
        PrizePosition::Second,
        PrizePosition::Third,
    ];

    pub fn number(self) -> u8 {
        match self {
            PrizePosition::First => 1,
            PrizePosition::Second => 2,
            PrizePosition::Third => 3,
        }
    }
}

impl From<PrizePosition> for u8 {
    fn from(p: PrizePosition) -> u8 {
        p.number()
    }
}

impl TryFrom<u8> for PrizePosition {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(PrizePosition::First),
            2 => Ok(PrizePosition::Second),
            3 => Ok(PrizePosition::Third),
            other => Err(format!("prize position must be 1, 2 or 3, got {}", other)),
        }
    }
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Canceled => "canceled",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "succeeded" => Ok(PaymentStatus::Succeeded),
            "failed" => Ok(PaymentStatus::Failed),
            "canceled" => Ok(PaymentStatus::Canceled),
            other => Err(format!("unknown payment status '{}'", other)),
        }
    }
}

impl PaymentType {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentType::Investment => "investment",
            PaymentType::Donation => "donation",
        }
    }
}

impl FromStr for PaymentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "investment" => Ok(PaymentType::Investment),
            "donation" => Ok(PaymentType::Donation),
            other => Err(format!("unknown payment type '{}'", other)),
        }
    }
}

impl fmt::Display for PrizePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

// Stored as TEXT / INTEGER columns.

impl ToSql for PaymentStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PaymentStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

impl ToSql for PaymentType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PaymentType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

impl ToSql for PrizePosition {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(i64::from(self.number())))
    }
}

impl FromSql for PrizePosition {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let n = value.as_i64()?;
        u8::try_from(n)
            .map_err(|_| FromSqlError::OutOfRange(n))?
            .try_into()
            .map_err(|_| FromSqlError::OutOfRange(n))
    }
}
