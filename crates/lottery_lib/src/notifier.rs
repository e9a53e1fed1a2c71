use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::storage::outbox;
use crate::types::{PrizePosition, Winner};

/// Payload handed to the notifier for each winner after a committed draw.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WinnerNotification {
    pub recipient: Option<String>,
    pub round_number: i64,
    pub prize_position: PrizePosition,
    pub prize_amount: i64,
    pub winning_ticket: String,
}

impl From<&Winner> for WinnerNotification {
    fn from(w: &Winner) -> Self {
        Self {
            recipient: w.participant_email.clone(),
            round_number: w.lottery_round,
            prize_position: w.prize_position,
            prize_amount: w.prize_amount,
            winning_ticket: w.winning_ticket.clone(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &WinnerNotification) -> Result<()>;
}

/// Writes winners to the log only.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, n: &WinnerNotification) -> Result<()> {
        info!(
            round = n.round_number,
            position = n.prize_position.number(),
            prize_amount = n.prize_amount,
            ticket = %n.winning_ticket,
            recipient = n.recipient.as_deref().unwrap_or("-"),
            "lottery winner"
        );
        Ok(())
    }
}

/// Queues winners into the global outbox for the email sender.
#[derive(Clone, Copy, Debug, Default)]
pub struct OutboxNotifier;

impl Notifier for OutboxNotifier {
    fn notify(&self, n: &WinnerNotification) -> Result<()> {
        outbox::enqueue(n.clone())
    }
}

/// Best-effort fan-out; returns how many notifications were accepted.
pub fn notify_winners(notifier: &dyn Notifier, winners: &[Winner]) -> usize {
    let mut delivered = 0;
    for winner in winners {
        let notification = WinnerNotification::from(winner);
        match notifier.notify(&notification) {
            Ok(()) => delivered += 1,
            Err(e) => warn!(
                round = winner.lottery_round,
                position = winner.prize_position.number(),
                error = %e,
                "winner notification failed"
            ),
        }
    }
    delivered
}
