use anyhow::Result;
use lottery_service::{App, config, shutdown_signal};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = config::load()?;
    lottery_service::logging::init_tracing(&cfg);

    let period = Duration::from_secs(cfg.fund_refresh_period_in_secs);
    let start = Instant::now();
    let mut ticker = interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let app = App::init_from(cfg)?;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
        }

        if let Err(e) = lottery_service::jobs::refresh_fund::run_one(&app) {
            error!(error = %format!("{:#}", e), "run_one error");
        }
    }

    info!("shutting down");
    app.shutdown();
    Ok(())
}
