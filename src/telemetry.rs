//! Tracing subscriber setup
//!
//! The library itself only emits `tracing` events; binaries and demos call
//! [`init_tracing`] once to see them.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber.
///
/// * `json` - emit newline-delimited JSON instead of human-readable lines
/// * `level` - default verbosity when `RUST_LOG` is not set
///
/// Returns `false` when a global subscriber was already installed, in which
/// case the call has no effect.
pub fn init_tracing(json: bool, level: Level) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(fmt::layer().with_target(false).json())
            .try_init()
            .is_ok()
    } else {
        registry
            .with(fmt::layer().with_target(false))
            .try_init()
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_noop() {
        init_tracing(false, Level::WARN);
        assert!(!init_tracing(true, Level::DEBUG));
    }
}
