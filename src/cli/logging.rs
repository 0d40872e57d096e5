//! Tracing setup for the binary
//!
//! Logs go to stderr so stdout carries only command output. The filter can
//! be raised to debug after the config files are read, since `debug = true`
//! may come from there rather than the command line.

use tracing_subscriber::{
    fmt, layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

const DEBUG_FILTER: &str = "test_delta=debug,warn";

/// Handle on the installed subscriber
pub(crate) struct Logging {
    filter: reload::Handle<EnvFilter, Registry>,
}

/// Install the global subscriber. `RUST_LOG` applies unless `debug` is set.
pub(crate) fn init(debug: bool) -> Logging {
    let (filter, handle) = reload::Layer::new(initial_filter(debug));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();

    Logging { filter: handle }
}

impl Logging {
    /// Switch to debug output for the rest of the run
    pub(crate) fn enable_debug(&self) {
        if let Err(e) = self.filter.modify(|f| *f = EnvFilter::new(DEBUG_FILTER)) {
            tracing::warn!(error = %e, "Failed to raise log level");
        }
    }
}

fn initial_filter(debug: bool) -> EnvFilter {
    if debug {
        EnvFilter::new(DEBUG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}
