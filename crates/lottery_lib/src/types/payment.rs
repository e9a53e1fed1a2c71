use crate::types::enums::{PaymentStatus, PaymentType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Free-form string metadata attached to a payment by the ingestion side.
///
/// Recognized keys:
/// - `payment_type`: `investment` or `donation`, mirrors the payment column
/// - `source`: where the payment was initiated (e.g. `web`)
/// - `email`: contact email when the customer email is absent
/// - `campaign`: marketing campaign tag
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct PaymentMetadata(pub BTreeMap<String, String>);

impl PaymentMetadata {
    pub const PAYMENT_TYPE: &'static str = "payment_type";
    pub const SOURCE: &'static str = "source";
    pub const EMAIL: &'static str = "email";
    pub const CAMPAIGN: &'static str = "campaign";

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn email(&self) -> Option<&str> {
        self.get(Self::EMAIL)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Payment {
    pub id: i64,
    pub payment_intent_id: String,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub payment_type: PaymentType,
    pub customer_email: Option<String>,
    pub metadata: PaymentMetadata,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn is_qualifying_investment(&self) -> bool {
        self.status == PaymentStatus::Succeeded && self.payment_type == PaymentType::Investment
    }
}

/// A payment as handed over by the ingestion side.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NewPayment {
    pub payment_intent_id: String,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub payment_type: PaymentType,
    pub customer_email: Option<String>,
    pub metadata: PaymentMetadata,
}

/// Aggregate over the investments registered in one round.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InvestmentTotals {
    pub total_amount: i64,
    pub investor_count: i64,
}
