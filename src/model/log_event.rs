use serde::{Deserialize, Serialize};

/// Severity of a `log.events` entry (spec.md §4.1 "Failure", §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Info,
    Warn,
    Fatal,
}

/// One diagnostic entry on the `log.events` topic — the wire-visible
/// counterpart to `tracing`'s developer-facing structured log
/// (spec.md §6, §7).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub t_ns: u64,
    pub level: LogLevel,
    pub module: String,
    pub event: String,
    pub detail: Option<String>,
}

impl LogEvent {
    pub fn info(t_ns: u64, module: &str, event: &str) -> Self {
        Self { t_ns, level: LogLevel::Info, module: module.to_string(), event: event.to_string(), detail: None }
    }

    pub fn warn(t_ns: u64, module: &str, event: &str, detail: impl Into<String>) -> Self {
        Self { t_ns, level: LogLevel::Warn, module: module.to_string(), event: event.to_string(), detail: Some(detail.into()) }
    }

    pub fn fatal(t_ns: u64, module: &str, event: &str, detail: impl Into<String>) -> Self {
        Self { t_ns, level: LogLevel::Fatal, module: module.to_string(), event: event.to_string(), detail: Some(detail.into()) }
    }

    /// `"module=<name>, event=stopped"` shape required at shutdown
    /// (spec.md §5).
    pub fn stopped(t_ns: u64, module: &str) -> Self {
        Self::info(t_ns, module, "stopped")
    }
}
