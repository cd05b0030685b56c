use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

const DEFAULT_FILTER: &str = "info";

/// Install the global tracing subscriber, filtered by `RUST_LOG` (default `info`)
///
/// Records emitted through the `log` facade by dependencies are forwarded too.
/// Safe to call more than once, only the first call has an effect.
#[uniffi::export]
pub fn init_logging() {
    INIT.call_once(|| {
        // another logger may already be installed by the host
        if let Err(error) = tracing_log::LogTracer::init() {
            eprintln!("log bridge not installed: {error}");
        }

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let subscriber = tracing_subscriber::registry().with(filter).with(fmt::layer());
        if let Err(error) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("tracing subscriber not installed: {error}");
            return;
        }

        tracing::info!(
            "logging initialized, version: {} ({}), profile: {}",
            crate::build::version(),
            crate::build::git_short_hash(),
            crate::build::profile()
        );
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_logging();
        init_logging();

        tracing::debug!("still logging after repeated init");
        assert!(INIT.is_completed());
    }
}
