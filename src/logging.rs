//! Diagnostics go to stderr through `tracing`, so rendered tables on stdout
//! stay clean.
//!
//! `RUST_LOG` wins when set. Otherwise the level comes from `-v`/`-q`:
//! warn by default, then info, debug and trace with more `-v`, error only
//! with `-q`.

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn level_for(verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // Dependencies (reqwest, hyper) stay at warn unless RUST_LOG says otherwise.
        EnvFilter::new(format!("warn,{}={}", env!("CARGO_CRATE_NAME"), level))
    })
}

pub fn init_logging(verbose: u8, quiet: bool) -> anyhow::Result<()> {
    let filter = build_env_filter(level_for(verbose, quiet));
    let layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install log subscriber: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_for(0, false), Level::WARN);
        assert_eq!(level_for(1, false), Level::INFO);
        assert_eq!(level_for(2, false), Level::DEBUG);
        assert_eq!(level_for(5, false), Level::TRACE);
        assert_eq!(level_for(3, true), Level::ERROR);
    }
}
