use crate::fund::{PrizeFund, PrizePercentages};
use crate::types::enums::RoundStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LotteryRound {
    pub id: i64,
    pub round_number: i64,
    pub total_investment_amount: i64,
    pub prize_fund: PrizeFund,
    pub total_participants: i64,
    pub draw_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LotteryRound {
    pub fn status(&self) -> RoundStatus {
        if self.is_active && self.draw_date.is_none() {
            RoundStatus::Open
        } else {
            RoundStatus::Closed
        }
    }
}

/// Active round summary returned by a status query.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RoundSummary {
    pub round_id: i64,
    pub current_round: i64,
    pub status: RoundStatus,
    pub total_investment: i64,
    pub total_participants: i64,
    pub total_tickets: i64,
    pub prize_fund: PrizeFund,
    pub total_prize_fund: i64,
    pub prize_percentages: PrizePercentages,
    pub draw_date: Option<DateTime<Utc>>,
    pub is_active: bool,
}
