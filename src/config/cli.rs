//! CLI surface. The external-collaborator boundary in spec.md §2 names CLI
//! parsing as out of scope for the sensor-fusion core proper, but a runnable
//! binary still needs *some* entry point — this mirrors the teacher's
//! `AppConfig` (a flat `clap::Parser` struct with one flag per tunable,
//! `Option<T>` so an absent flag means "use the file/default value").

use super::{FocusFieldConfig, NoLockBehavior, OverflowPolicyConfig};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[command(about = "FocusField sensor-fusion core", author, version)]
pub struct Cli {
    /// Path to a YAML or JSON config file (extension selects the parser)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Replay an NDJSON trace instead of reading live devices
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Replay speed multiplier; 0 means "as fast as possible", ignoring
    /// recorded inter-message gaps
    #[arg(long, default_value_t = 1)]
    pub replay_speed: u32,

    /// Enable file logging (JSON lines)
    #[arg(long = "logs", default_value_t = false)]
    pub logs: bool,

    /// Directory crash reports and log files are written under
    #[arg(long = "state-dir", default_value = ".")]
    pub state_dir: PathBuf,

    #[arg(long = "doa-bin-size-deg")]
    pub doa_bin_size_deg: Option<f32>,
    #[arg(long = "doa-update-hz")]
    pub doa_update_hz: Option<f32>,
    #[arg(long = "doa-smoothing-alpha")]
    pub doa_smoothing_alpha: Option<f32>,
    #[arg(long = "doa-top-k-peaks")]
    pub doa_top_k_peaks: Option<usize>,
    #[arg(long = "doa-gate-on-vad")]
    pub doa_gate_on_vad: Option<bool>,

    #[arg(long = "fusion-max-assoc-deg")]
    pub fusion_max_assoc_deg: Option<f32>,
    #[arg(long = "fusion-require-vad")]
    pub fusion_require_vad: Option<bool>,
    #[arg(long = "fusion-faces-max-age-ms")]
    pub fusion_faces_max_age_ms: Option<u64>,

    #[arg(long = "lock-acquire-threshold")]
    pub lock_acquire_threshold: Option<f32>,
    #[arg(long = "lock-drop-threshold")]
    pub lock_drop_threshold: Option<f32>,
    #[arg(long = "lock-acquire-dwell-ms")]
    pub lock_acquire_dwell_ms: Option<u64>,
    #[arg(long = "lock-hold-ms")]
    pub lock_hold_ms: Option<u64>,
    #[arg(long = "lock-handoff-min-ms")]
    pub lock_handoff_min_ms: Option<u64>,
    #[arg(long = "lock-handoff-margin")]
    pub lock_handoff_margin: Option<f32>,
    #[arg(long = "lock-speaking-on-mouth-activity")]
    pub lock_speaking_on_mouth_activity: Option<f32>,

    #[arg(long = "beamform-use-last-lock-ms")]
    pub beamform_use_last_lock_ms: Option<u64>,
    #[arg(long = "beamform-no-lock-behavior", value_enum)]
    pub beamform_no_lock_behavior: Option<NoLockBehavior>,

    #[arg(long = "bus-default-capacity")]
    pub bus_default_capacity: Option<usize>,
    #[arg(long = "bus-overflow-policy", value_enum)]
    pub bus_overflow_policy: Option<OverflowPolicyConfig>,

    #[arg(long = "health-staleness-yellow-ms")]
    pub health_staleness_yellow_ms: Option<u64>,
    #[arg(long = "health-staleness-red-ms")]
    pub health_staleness_red_ms: Option<u64>,

    #[arg(long = "shutdown-deadline-ms")]
    pub shutdown_deadline_ms: Option<u64>,
}

impl Cli {
    /// Parse argv and immediately load+validate the config it describes.
    /// Mirrors the teacher's `AppConfig::parse_args` "parse then validate"
    /// shape.
    pub fn parse_and_load() -> Result<(Self, FocusFieldConfig), crate::error::ConfigError> {
        let cli = Self::parse();
        let config = FocusFieldConfig::load(&cli)?;
        Ok((cli, config))
    }

    /// Apply every `Some(..)` override onto `config` in place. Absent flags
    /// leave the file/default value untouched.
    pub(super) fn apply_overrides(&self, config: &mut FocusFieldConfig) {
        if let Some(v) = self.doa_bin_size_deg {
            config.doa.bin_size_deg = v;
        }
        if let Some(v) = self.doa_update_hz {
            config.doa.update_hz = v;
        }
        if let Some(v) = self.doa_smoothing_alpha {
            config.doa.smoothing_alpha = v;
        }
        if let Some(v) = self.doa_top_k_peaks {
            config.doa.top_k_peaks = v;
        }
        if let Some(v) = self.doa_gate_on_vad {
            config.doa.gate_on_vad = v;
        }
        if let Some(v) = self.fusion_max_assoc_deg {
            config.fusion.max_assoc_deg = v;
        }
        if let Some(v) = self.fusion_require_vad {
            config.fusion.require_vad = v;
        }
        if let Some(v) = self.fusion_faces_max_age_ms {
            config.fusion.faces_max_age_ms = v;
        }
        if let Some(v) = self.lock_acquire_threshold {
            config.lock.acquire_threshold = v;
        }
        if let Some(v) = self.lock_drop_threshold {
            config.lock.drop_threshold = v;
        }
        if let Some(v) = self.lock_acquire_dwell_ms {
            config.lock.acquire_dwell_ms = v;
        }
        if let Some(v) = self.lock_hold_ms {
            config.lock.hold_ms = v;
        }
        if let Some(v) = self.lock_handoff_min_ms {
            config.lock.handoff_min_ms = v;
        }
        if let Some(v) = self.lock_handoff_margin {
            config.lock.handoff_margin = v;
        }
        if let Some(v) = self.lock_speaking_on_mouth_activity {
            config.lock.speaking_on_mouth_activity = v;
        }
        if let Some(v) = self.beamform_use_last_lock_ms {
            config.beamform.use_last_lock_ms = v;
        }
        if let Some(v) = self.beamform_no_lock_behavior {
            config.beamform.no_lock_behavior = v;
        }
        if let Some(v) = self.bus_default_capacity {
            config.bus.default_capacity = v;
        }
        if let Some(v) = self.bus_overflow_policy {
            config.bus.overflow_policy = v;
        }
        if let Some(v) = self.health_staleness_yellow_ms {
            config.health.staleness_yellow_ms = v;
        }
        if let Some(v) = self.health_staleness_red_ms {
            config.health.staleness_red_ms = v;
        }
        if let Some(v) = self.shutdown_deadline_ms {
            config.shutdown_deadline_ms = v;
        }
    }
}
