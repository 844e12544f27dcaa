//! Tracing subscriber setup.
//!
//! Console output is one human-readable line per event. With a log directory,
//! a second layer writes JSON lines to a daily-rotated file named after the
//! module. `RUST_LOG` takes precedence over the level passed in.

use anyhow::{Result, anyhow};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber.
///
/// Fails if a global subscriber is already set or `log_level` is not a valid
/// filter directive.
pub fn init_logging(log_level: &str, log_dir: Option<&str>, module_name: &str) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_level)
            .map_err(|e| anyhow!("invalid log level '{log_level}': {e}"))?,
    };

    let console = fmt::layer().with_target(true).with_ansi(true);
    let file = log_dir.map(|dir| {
        fmt::layer()
            .json()
            .with_current_span(false)
            .with_writer(tracing_appender::rolling::daily(dir, module_name))
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| anyhow!("logging already initialized: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_rejected() {
        // Whichever test in this binary initializes first wins; the next call
        // must fail rather than panic.
        let _ = init_logging("debug", None, "cet-test");
        assert!(init_logging("debug", None, "cet-test").is_err());
    }
}
