use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Participant {
    pub id: i64,
    pub payment_id: i64,
    pub payment_intent_id: Option<String>,
    pub lottery_round: i64,
    pub participant_email: Option<String>,
    pub investment_amount: i64,
    /// Issuance order.
    pub ticket_numbers: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Participant {
    pub fn tickets_count(&self) -> usize {
        self.ticket_numbers.len()
    }
}

/// Request to enter an investment into the active round.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Registration {
    pub payment_id: Option<i64>,
    pub amount: i64,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ParticipantList {
    pub round: i64,
    pub participants: Vec<Participant>,
    pub total_participants: usize,
    pub total_tickets: usize,
}
