//! Tracing initialisation for the `vmsweep` binary.
//!
//! Call [`init_tracing`] once at program start. Later calls are ignored; the
//! global subscriber can only be set once per process.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Targets that log at the requested level; everything else stays at `warn`.
const SWEEP_TARGETS: [&str; 2] = ["vmsweep_core", "vmsweep"];

/// Filter used when `RUST_LOG` is not set.
pub fn default_directives(level: Level) -> String {
    let mut directives = vec!["warn".to_string()];
    directives.extend(
        SWEEP_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, level.as_str().to_lowercase())),
    );
    directives.join(",")
}

/// Initialise the global tracing subscriber.
///
/// Sweep and point spans are attached to every event, so each log line
/// carries the sweep id and the point being measured. With `json` the lines
/// are newline-delimited JSON.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(fmt::layer().json().with_current_span(true).with_span_list(false))
            .try_init()
            .ok();
    } else {
        registry
            .with(fmt::layer().with_target(level >= Level::DEBUG))
            .try_init()
            .ok();
    }
}
