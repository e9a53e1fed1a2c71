use anyhow::{Context, Result};
use lottery_lib::LotteryError;
use lottery_lib::storage::DEFAULT_BUSY_TIMEOUT_MS;
use std::env;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotifierKind {
    Log,
    Outbox,
}

#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub database_path: String,
    pub db_busy_timeout_ms: u64,

    pub log_level: String,
    pub log_format: String,
    pub log_color: bool,

    pub notifier: NotifierKind,
    pub outbox_batch_max: usize,
    pub outbox_batch_ms: u64,
    pub outbox_queue_cap: usize,
    pub outbox_retention_days: u64,

    pub draw_period_in_secs: u64,
    pub fund_refresh_period_in_secs: u64,
}

pub fn load() -> Result<RuntimeConfig> {
    let _ = dotenvy::dotenv();
    from_env()
}

/// Build the config from the current process environment only.
pub fn from_env() -> Result<RuntimeConfig> {
    let database_path = env_str("DATABASE_PATH", None)
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| LotteryError::NotConfigured("DATABASE_PATH must be set".into()))?;
    let db_busy_timeout_ms = env_u64("DB_BUSY_TIMEOUT_MS", Some(DEFAULT_BUSY_TIMEOUT_MS))
        .context("DB_BUSY_TIMEOUT_MS must be a number")?;

    let log_level = env_str("LOG_LEVEL", Some("info".into())).unwrap_or_default();
    let log_format = env_str("LOG_FORMAT", Some("json".into())).unwrap_or_default();
    let log_color = env_bool("LOG_COLOR", Some(false)).context("LOG_COLOR must be true or false")?;

    let notifier = env_notifier("NOTIFIER", Some(NotifierKind::Log))
        .context("NOTIFIER must be 'log' or 'outbox'")?;
    let outbox_batch_max =
        env_usize("OUTBOX_BATCH_MAX", Some(50)).context("OUTBOX_BATCH_MAX must be a number")?;
    let outbox_batch_ms =
        env_u64("OUTBOX_BATCH_MS", Some(500)).context("OUTBOX_BATCH_MS must be a number")?;
    let outbox_queue_cap =
        env_usize("OUTBOX_QUEUE_CAP", Some(1024)).context("OUTBOX_QUEUE_CAP must be a number")?;
    let outbox_retention_days = env_u64("OUTBOX_RETENTION_DAYS", Some(30))
        .context("OUTBOX_RETENTION_DAYS must be a number")?;

    let draw_period_in_secs = env_u64("DRAW_PERIOD_IN_SECS", Some(7 * 24 * 3600))
        .context("DRAW_PERIOD_IN_SECS must be a number")?;
    let fund_refresh_period_in_secs = env_u64("FUND_REFRESH_PERIOD_IN_SECS", Some(300))
        .context("FUND_REFRESH_PERIOD_IN_SECS must be a number")?;

    Ok(RuntimeConfig {
        database_path,
        db_busy_timeout_ms,
        log_level,
        log_format,
        log_color,
        notifier,
        outbox_batch_max,
        outbox_batch_ms,
        outbox_queue_cap,
        outbox_retention_days,
        draw_period_in_secs,
        fund_refresh_period_in_secs,
    })
}

// A present but unparsable value is treated as unset, so it fails when there
// is no default.

fn env_str(key: &str, default: Option<String>) -> Option<String> {
    env::var(key).ok().or(default)
}

fn env_bool(key: &str, default: Option<bool>) -> Option<bool> {
    match env::var(key) {
        Ok(v) => v.parse().ok(),
        Err(_) => default,
    }
}

fn env_u64(key: &str, default: Option<u64>) -> Option<u64> {
    match env::var(key) {
        Ok(v) => v.parse().ok(),
        Err(_) => default,
    }
}

fn env_usize(key: &str, default: Option<usize>) -> Option<usize> {
    match env::var(key) {
        Ok(v) => v.parse().ok(),
        Err(_) => default,
    }
}

fn env_notifier(key: &str, default: Option<NotifierKind>) -> Option<NotifierKind> {
    match env::var(key) {
        Ok(v) => match v.to_lowercase().as_str() {
            "log" => Some(NotifierKind::Log),
            "outbox" => Some(NotifierKind::Outbox),
            _ => None,
        },
        Err(_) => default,
    }
}
