use crate::config::{NotifierKind, RuntimeConfig};
use anyhow::{Context, Result};
use lottery_lib::{
    LotteryResult,
    draw::{self, DrawOutcome},
    notifier::{LogNotifier, Notifier, OutboxNotifier, notify_winners},
    registry,
    rounds,
    storage::{
        self,
        outbox::{OutboxConfig, init_global_outbox, shutdown_global_outbox},
    },
    types::{Participant, ParticipantList, Registration, RoundSummary, Winner, WinnerList},
};
use rand::rngs::OsRng;
use rusqlite::Connection;
use std::sync::Arc;
use tracing::{info, warn};

pub mod config;
pub mod jobs;
pub mod logging;

/// Lottery operations over the durable store. Every call opens its own
/// connection, so any number of `App`s can serve the same database.
pub struct App {
    database_path: String,
    busy_timeout_ms: u64,
    notifier: Arc<dyn Notifier>,
}

impl App {
    pub fn init_from(cfg: RuntimeConfig) -> Result<Self> {
        let notifier: Arc<dyn Notifier> = match cfg.notifier {
            NotifierKind::Log => Arc::new(LogNotifier),
            NotifierKind::Outbox => {
                init_global_outbox(OutboxConfig {
                    path: cfg.database_path.clone(),
                    busy_timeout_ms: cfg.db_busy_timeout_ms,
                    batch_max: cfg.outbox_batch_max,
                    batch_ms: cfg.outbox_batch_ms,
                    queue_cap: cfg.outbox_queue_cap,
                    retention_days: cfg.outbox_retention_days,
                })
                .context("Failed to start notification outbox")?;
                Arc::new(OutboxNotifier)
            }
        };

        Self::with_notifier(cfg.database_path, cfg.db_busy_timeout_ms, notifier)
    }

    /// Creates the schema once here, so misconfiguration fails at startup and
    /// later calls only open a connection.
    pub fn with_notifier(
        database_path: impl Into<String>,
        busy_timeout_ms: u64,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let database_path = database_path.into();
        storage::open(&database_path, busy_timeout_ms)
            .with_context(|| format!("Failed to open lottery database {}", database_path))?;
        Ok(Self {
            database_path,
            busy_timeout_ms,
            notifier,
        })
    }

    pub fn connect(&self) -> LotteryResult<Connection> {
        Ok(storage::connect(&self.database_path, self.busy_timeout_ms)?)
    }

    /// Flush queued winner notifications before the process exits.
    pub fn shutdown(&self) {
        if shutdown_global_outbox() {
            info!("notification outbox flushed");
        }
    }

    /// Active round summary; also persists the refreshed fund snapshot.
    pub fn get_status(&self) -> LotteryResult<RoundSummary> {
        rounds::get_status(&mut self.connect()?)
    }

    /// Same as a status query, named for the admin fund update action.
    pub fn refresh_fund(&self) -> LotteryResult<RoundSummary> {
        self.get_status()
    }

    pub fn get_participants(&self, round: Option<i64>) -> LotteryResult<ParticipantList> {
        registry::list_participants(&self.connect()?, round)
    }

    pub fn get_winners(&self, round: Option<i64>) -> LotteryResult<WinnerList> {
        draw::list_winners(&self.connect()?, round)
    }

    pub fn register_participant(&self, registration: &Registration) -> LotteryResult<Participant> {
        registry::register_participant(&mut self.connect()?, registration, &mut rand::thread_rng())
    }

    /// Draw a round (default: the active one) and notify its winners. Notifier
    /// failures are logged and never undo the draw.
    pub fn conduct_draw(&self, round_id: Option<i64>) -> LotteryResult<DrawOutcome> {
        let outcome = draw::conduct_draw(&mut self.connect()?, round_id, &mut OsRng)?;
        let notified = notify_winners(self.notifier.as_ref(), &outcome.winners);
        if notified < outcome.winners.len() {
            warn!(
                round = outcome.round,
                notified,
                winners = outcome.winners.len(),
                "some winners were not notified"
            );
        }
        Ok(outcome)
    }

    pub fn claim_prize(&self, round: i64, position: u8) -> LotteryResult<Winner> {
        draw::claim_prize(&mut self.connect()?, round, position)
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => {}
        _ = terminate => {}
    }
}
