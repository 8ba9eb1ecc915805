//! Diagnostic logging setup
//!
//! Diagnostics go to stderr through `tracing`; progress and results are
//! printed to stdout by the output module and are not affected by `RUST_LOG`.

use std::env;
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Install the global subscriber
///
/// `RUST_LOG` wins when set. Otherwise this crate logs at INFO, or DEBUG when
/// `debug` is true, and everything else at WARN.
pub fn init(debug: bool) {
    let (level, env_filter) = parse_rust_log(debug);
    let format = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(format.with_filter(LevelFilter::from(level)))
        .with(env_filter)
        .try_init()
        .ok();
}

fn parse_rust_log(debug: bool) -> (Level, EnvFilter) {
    let default = if debug { Level::DEBUG } else { Level::INFO };
    let level = match env::var(EnvFilter::DEFAULT_ENV) {
        Ok(value) => match value.parse::<Level>() {
            Ok(level) => level,
            Err(_) => return (Level::TRACE, EnvFilter::new(value)),
        },
        Err(_) => default,
    };

    let env_filter = EnvFilter::new(format!("WARN,blockstress={}", level));
    (level, env_filter)
}
