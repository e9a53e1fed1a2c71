use once_cell::sync::OnceCell;
use rusqlite::{Connection, Result as SqlResult, params};
use std::sync::Mutex;
use std::sync::mpsc::{RecvTimeoutError, SyncSender, TrySendError, sync_channel};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

use crate::notifier::WinnerNotification;
use crate::types::PrizePosition;

#[derive(Clone, Debug)]
pub struct OutboxConfig {
    pub path: String,
    pub busy_timeout_ms: u64,
    pub batch_max: usize,
    pub batch_ms: u64,
    pub queue_cap: usize,
    pub retention_days: u64,
}

/// A queued notification as stored in `winner_notifications`.
#[derive(Clone, Debug, PartialEq)]
pub struct OutboxEntry {
    pub id: i64,
    pub notification: WinnerNotification,
    pub status: String,
}

/// Batches winner notifications into the outbox table from a writer thread.
pub struct NotificationOutbox {
    tx: SyncSender<WinnerNotification>,
    handle: JoinHandle<()>,
}

// Emptied by `shutdown_global_outbox`.
static GLOBAL_OUTBOX: OnceCell<Mutex<Option<NotificationOutbox>>> = OnceCell::new();

impl NotificationOutbox {
    pub fn start(cfg: OutboxConfig) -> SqlResult<Self> {
        // Fail fast on an unusable path instead of inside the thread.
        let mut conn = super::open(&cfg.path, cfg.busy_timeout_ms)?;
        let (tx, rx) = sync_channel::<WinnerNotification>(cfg.queue_cap);

        let handle = thread::spawn(move || {
            let mut buffer: Vec<WinnerNotification> = Vec::with_capacity(cfg.batch_max);
            let mut last_flush = Instant::now();
            let flush_interval = Duration::from_millis(cfg.batch_ms);
            let mut last_retention = Instant::now();
            let retention_interval = Duration::from_secs(3600);

            loop {
                let disconnected = match rx.recv_timeout(Duration::from_millis(50)) {
                    Ok(item) => {
                        buffer.push(item);
                        false
                    }
                    Err(RecvTimeoutError::Timeout) => false,
                    Err(RecvTimeoutError::Disconnected) => true,
                };

                let need_time_flush = last_flush.elapsed() >= flush_interval;
                let need_size_flush = buffer.len() >= cfg.batch_max;

                if !buffer.is_empty() && (need_time_flush || need_size_flush || disconnected) {
                    match flush(&mut conn, &buffer) {
                        Ok(n) => debug!(notifications = n, "outbox flushed"),
                        Err(e) => error!(error = %e, dropped = buffer.len(), "outbox flush failed"),
                    }
                    buffer.clear();
                    last_flush = Instant::now();

                    if last_retention.elapsed() >= retention_interval {
                        if let Err(e) = conn.execute(
                            "DELETE FROM winner_notifications
                             WHERE status = 'delivered' AND created_at < datetime('now', ?)",
                            [format!("-{} days", cfg.retention_days)],
                        ) {
                            warn!(error = %e, "outbox retention failed");
                        }
                        last_retention = Instant::now();
                    }
                }

                if disconnected {
                    break;
                }
            }
        });

        Ok(Self { tx, handle })
    }

    /// Queue without blocking; a full queue is reported to the caller.
    pub fn send(&self, entry: WinnerNotification) -> Result<(), TrySendError<WinnerNotification>> {
        self.tx.try_send(entry)
    }

    /// Flush whatever is queued and stop the writer thread.
    pub fn shutdown(self) {
        drop(self.tx);
        let _ = self.handle.join();
    }
}

fn flush(conn: &mut Connection, batch: &[WinnerNotification]) -> SqlResult<usize> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO winner_notifications (
                lottery_round, prize_position, recipient, prize_amount, winning_ticket, status
            ) VALUES (?, ?, ?, ?, ?, 'pending')",
        )?;
        for n in batch {
            stmt.execute(params![
                n.round_number,
                n.prize_position,
                n.recipient,
                n.prize_amount,
                n.winning_ticket,
            ])?;
        }
    }
    tx.commit()?;
    Ok(batch.len())
}

fn global_slot() -> &'static Mutex<Option<NotificationOutbox>> {
    GLOBAL_OUTBOX.get_or_init(|| Mutex::new(None))
}

pub fn init_global_outbox(cfg: OutboxConfig) -> SqlResult<()> {
    let outbox = NotificationOutbox::start(cfg)?;
    match global_slot().lock() {
        Ok(mut slot) if slot.is_none() => *slot = Some(outbox),
        _ => outbox.shutdown(),
    }
    Ok(())
}

pub fn is_initialized() -> bool {
    global_slot().lock().map(|slot| slot.is_some()).unwrap_or(false)
}

pub fn enqueue(entry: WinnerNotification) -> anyhow::Result<()> {
    let slot = global_slot()
        .lock()
        .map_err(|_| anyhow::anyhow!("notification outbox lock poisoned"))?;
    let outbox = slot
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("notification outbox is not initialized"))?;
    outbox
        .send(entry)
        .map_err(|e| anyhow::anyhow!("notification outbox rejected entry: {}", e))
}

/// Flush the global outbox and stop its writer. Returns false if none was
/// running. Later `enqueue` calls fail until it is initialized again.
pub fn shutdown_global_outbox() -> bool {
    let outbox = match global_slot().lock() {
        Ok(mut slot) => slot.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    };
    match outbox {
        Some(outbox) => {
            outbox.shutdown();
            true
        }
        None => false,
    }
}

/// Oldest pending notifications first, for the email sender.
pub fn pending_notifications(conn: &Connection, limit: usize) -> SqlResult<Vec<OutboxEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, lottery_round, prize_position, recipient, prize_amount, winning_ticket, status
         FROM winner_notifications
         WHERE status = 'pending'
         ORDER BY id ASC
         LIMIT ?",
    )?;
    let rows = stmt.query_map([limit as i64], |row| {
        let position: PrizePosition = row.get(2)?;
        Ok(OutboxEntry {
            id: row.get(0)?,
            notification: WinnerNotification {
                round_number: row.get(1)?,
                prize_position: position,
                recipient: row.get(3)?,
                prize_amount: row.get(4)?,
                winning_ticket: row.get(5)?,
            },
            status: row.get(6)?,
        })
    })?;
    rows.collect()
}

pub fn mark_delivered(conn: &Connection, id: i64) -> SqlResult<usize> {
    conn.execute(
        "UPDATE winner_notifications SET status = 'delivered' WHERE id = ?",
        [id],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::{Notifier, OutboxNotifier};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_db(name: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir()
            .join(format!("lottery-outbox-{}-{}-{}.db", name, std::process::id(), nanos))
            .to_string_lossy()
            .into_owned()
    }

    fn notification(position: PrizePosition) -> WinnerNotification {
        WinnerNotification {
            recipient: Some("winner@example.com".into()),
            round_number: 4,
            prize_position: position,
            prize_amount: 1_000,
            winning_ticket: format!("LT-ABC10{}", position.number()),
        }
    }

    #[test]
    fn shutdown_flushes_queued_notifications() {
        let path = temp_db("flush");
        let outbox = NotificationOutbox::start(OutboxConfig {
            path: path.clone(),
            busy_timeout_ms: 5_000,
            batch_max: 100,
            batch_ms: 60_000,
            queue_cap: 16,
            retention_days: 30,
        })
        .unwrap();

        outbox.send(notification(PrizePosition::First)).unwrap();
        outbox.send(notification(PrizePosition::Second)).unwrap();
        outbox.shutdown();

        let conn = crate::storage::open(&path, 5_000).unwrap();
        let pending = pending_notifications(&conn, 10).unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].notification, notification(PrizePosition::First));
        assert_eq!(pending[1].status, "pending");

        assert_eq!(mark_delivered(&conn, pending[0].id).unwrap(), 1);
        assert_eq!(pending_notifications(&conn, 10).unwrap().len(), 1);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn global_shutdown_flushes_and_disables_enqueue() {
        let path = temp_db("global");
        init_global_outbox(OutboxConfig {
            path: path.clone(),
            busy_timeout_ms: 5_000,
            batch_max: 100,
            batch_ms: 60_000,
            queue_cap: 16,
            retention_days: 30,
        })
        .unwrap();
        assert!(is_initialized());

        OutboxNotifier
            .notify(&notification(PrizePosition::Third))
            .unwrap();
        assert!(shutdown_global_outbox());
        assert!(!is_initialized());
        assert!(!shutdown_global_outbox());
        assert!(OutboxNotifier.notify(&notification(PrizePosition::First)).is_err());

        let conn = crate::storage::open(&path, 5_000).unwrap();
        let pending = pending_notifications(&conn, 10).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].notification, notification(PrizePosition::Third));

        let _ = std::fs::remove_file(&path);
    }
}
