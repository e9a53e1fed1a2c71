use crate::types::enums::PrizePosition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Winner {
    pub id: i64,
    pub lottery_round: i64,
    pub participant_id: i64,
    pub prize_position: PrizePosition,
    /// Snapshot of the round's fund at draw time.
    pub prize_amount: i64,
    pub winning_ticket: String,
    pub claimed: bool,
    pub participant_email: Option<String>,
    pub investment_amount: i64,
    pub drawn_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WinnerList {
    pub round: i64,
    pub winners: Vec<Winner>,
    pub total_winners: usize,
}
