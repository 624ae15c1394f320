//! Error taxonomy (spec.md §7).
//!
//! Kind 1 (transient input gaps) and kind 3 (runtime faults) are recovered
//! locally by the component that hits them and surfaced only as `log.events`
//! messages (see `model::LogEvent`) — they never reach this module. This
//! module covers kind 2 (fatal config errors, typed so callers can match on
//! them) and kind 4 (programming faults / invariant violations, which demand
//! a crash report and an orderly shutdown request).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Kind 2: configuration errors. Fatal at startup; the CLI entry point prints
/// these and exits non-zero without starting any component thread.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path} as {format}: {source}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{field} must be {constraint}, got {got}")]
    OutOfRange {
        field: &'static str,
        constraint: String,
        got: String,
    },

    #[error("{field}: {detail}")]
    Inconsistent { field: &'static str, detail: String },

    #[error("array geometry is degenerate (fewer than 2 distinct mic positions)")]
    DegenerateGeometry,
}

/// Kind 4: invariant violations / impossible states. Recoverable only in the
/// sense that the runtime requests an orderly shutdown after writing a crash
/// report; never unwinds as a panic.
#[derive(Debug, Error)]
pub enum FocusFieldError {
    #[error("invariant violated in {module}: {detail}")]
    InvariantViolation { module: &'static str, detail: String },

    #[error("bus is shut down")]
    BusShutDown,
}

/// Snapshot written to `crash/crash.json` when a kind-4 error fires, so a
/// post-mortem can see what the lock machine and DOA stage last knew.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrashReport {
    pub t_ns: u64,
    pub module: String,
    pub detail: String,
    pub last_lock_state: Option<String>,
    pub last_target_bearing_deg: Option<f32>,
    pub last_doa_seq: Option<u64>,
}

impl CrashReport {
    pub fn new(t_ns: u64, module: &str, detail: impl Into<String>) -> Self {
        Self {
            t_ns,
            module: module.to_string(),
            detail: detail.into(),
            last_lock_state: None,
            last_target_bearing_deg: None,
            last_doa_seq: None,
        }
    }

    /// Write this report to `<dir>/crash/crash.json`, creating the directory
    /// if needed. Best-effort: an error here is logged, not propagated,
    /// since we are already on the kind-4 failure path.
    pub fn write_to(&self, dir: &std::path::Path) -> std::io::Result<PathBuf> {
        let crash_dir = dir.join("crash");
        std::fs::create_dir_all(&crash_dir)?;
        let path = crash_dir.join("crash.json");
        let json = serde_json::to_vec_pretty(self).unwrap_or_default();
        std::fs::write(&path, json)?;
        Ok(path)
    }
}

impl fmt::Display for CrashReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "crash in {} at t_ns={}: {}", self.module, self.t_ns, self.detail)
    }
}
