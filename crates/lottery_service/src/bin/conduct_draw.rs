use anyhow::Result;
use lottery_service::{App, config, shutdown_signal};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = config::load()?;
    lottery_service::logging::init_tracing(&cfg);

    let period = Duration::from_secs(cfg.draw_period_in_secs);
    // First draw one full period after startup.
    let start = Instant::now() + period;
    let mut ticker = interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let app = App::init_from(cfg)?;
    info!(period_secs = period.as_secs(), "draw keeper started");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
        }

        match lottery_service::jobs::conduct_draw::run_one(&app) {
            Ok(Some(outcome)) => {
                info!(
                    round = outcome.round,
                    next_round = outcome.next_round.round_number,
                    "round drawn"
                );
            }
            Ok(None) => {}
            Err(e) => {
                error!(error = %format!("{:#}", e), "run_one error");
            }
        }
    }

    info!("shutting down");
    app.shutdown();
    Ok(())
}
