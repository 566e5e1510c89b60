//! Tracing subscriber setup.

use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::LogSettings;

/// Filter used when neither `RUST_LOG` nor a config file sets one.
pub const DEFAULT_LOG_FILTER: &str = "info,reroute=debug";

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages from every crate
/// - `RUST_LOG=reroute_core=trace` - Trace the solver only
/// - Default: `settings.filter`, normally `info,reroute=debug`
///
/// Safe to call more than once; later calls keep the first subscriber.
pub fn init_tracing(settings: &LogSettings) {
    let filter = build_filter(settings);

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_err()
    {
        debug!("Tracing subscriber already installed");
    }
}

fn build_filter(settings: &LogSettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        let settings = LogSettings::default();
        init_tracing(&settings);
        init_tracing(&settings);
    }

    #[test]
    fn test_bad_directive_falls_back() {
        let settings = LogSettings {
            filter: "info,reroute=notalevel".to_string(),
        };
        // Must not panic on an unparseable directive.
        let _ = build_filter(&settings);
    }
}
