//! Developer-facing structured logging (spec.md §7 "Logging").
//!
//! `tracing` is the JSON-to-file log a human or log aggregator reads; it is
//! complementary to, not a replacement for, the `log.events` Bus topic
//! (`model::LogEvent`) that UI/bench collaborators consume as a documented
//! wire contract. One-time init follows the teacher's `telemetry.rs` almost
//! unchanged: a `OnceLock`-guarded subscriber, `UtcTime::rfc_3339()` timer,
//! env-var-selected log path.

use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing_subscriber::fmt::time::UtcTime;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

pub fn tracing_log_path() -> PathBuf {
    env::var("FOCUSFIELD_TRACE_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| env::temp_dir().join("focusfield_trace.jsonl"))
}

/// Initialize the global `tracing` subscriber the first time it's called.
/// Subsequent calls (e.g. from tests that each construct a `Runtime`) are
/// no-ops, matching the teacher's once-per-process init pattern.
pub fn init_tracing(enabled: bool) {
    if !enabled {
        return;
    }

    let _ = TRACING_INIT.get_or_init(|| {
        let path = tracing_log_path();
        let file = match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => file,
            Err(_) => return,
        };
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_timer(UtcTime::rfc_3339())
            .with_writer(file)
            .with_current_span(false)
            .with_span_list(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
