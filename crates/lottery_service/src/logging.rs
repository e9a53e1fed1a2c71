use crate::config::RuntimeConfig;
use std::io;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter, Registry, filter::Directive, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

const LOTTERY_TARGETS: [&str; 2] = ["lottery_lib", "lottery_service"];

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Our crates log at `LOG_LEVEL`; rusqlite and the runtime stay at warn.
fn lottery_directives(level: Level) -> Vec<Directive> {
    let mut directives: Vec<Directive> = vec![Level::WARN.into()];
    for target in LOTTERY_TARGETS {
        if let Ok(d) = format!("{}={}", target, level.as_str().to_lowercase()).parse() {
            directives.push(d);
        }
    }
    directives
}

pub fn init_tracing(cfg: &RuntimeConfig) {
    let level = parse_level(&cfg.log_level);

    let filter = lottery_directives(level)
        .into_iter()
        .fold(EnvFilter::from_default_env(), |f, d| f.add_directive(d));

    let make_writer = io::stdout;

    if cfg.log_format.to_lowercase() == "pretty" {
        let layer = fmt::layer()
            .with_writer(make_writer)
            .with_ansi(cfg.log_color)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_level(true);

        let _ = Registry::default().with(filter).with(layer).try_init();
    } else {
        let layer = fmt::layer()
            .with_writer(make_writer)
            .with_ansi(false)
            .with_target(true)
            .with_level(true)
            .json()
            .flatten_event(true);

        let _ = Registry::default().with(filter).with(layer).try_init();
    }
}
