//! Configuration surface (spec.md §6) and its CLI presentation.
//!
//! Mirrors the teacher's `config/mod.rs` + `config/validation.rs` shape: one
//! struct carries every tunable with a `#[serde(default = ...)]` per field
//! so a config file only needs to name the values it wants to override, a
//! `clap::Parser` CLI struct (`Cli`, in `cli.rs`) exposes the same keys as
//! flags the way the teacher's `AppConfig` exposes the voice pipeline's
//! tunables, and a `validate()` pass does range/cross-field checks and
//! returns a closed `ConfigError` rather than a bare `anyhow::bail!` string,
//! since spec.md §7 kind 2 wants a matchable error set.

mod cli;
mod defaults;
#[cfg(test)]
mod tests;
mod validation;

use crate::bus::OverflowPolicy;
use serde::{Deserialize, Serialize};

pub use cli::Cli;

/// A 2D position in meters, in the array's local plane (spec.md §4.2
/// "array geometry (mic positions in meters)").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MicPosition {
    pub x: f32,
    pub y: f32,
}

/// Microphone array geometry and camera-yaw compensation. The contracts
/// never name another source for this than the config file, so it lives
/// here alongside the rest of the tunables (spec.md §4.2, §4.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayConfig {
    #[serde(default = "defaults::default_mic_positions")]
    pub mic_positions_m: Vec<MicPosition>,
    #[serde(default = "defaults::default_speed_of_sound_mps")]
    pub speed_of_sound_mps: f32,
    #[serde(default)]
    pub camera_yaw_deg: f32,
}

impl Default for ArrayConfig {
    fn default() -> Self {
        Self {
            mic_positions_m: defaults::default_mic_positions(),
            speed_of_sound_mps: defaults::default_speed_of_sound_mps(),
            camera_yaw_deg: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreqBand {
    pub lo_hz: f32,
    pub hi_hz: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoaConfig {
    #[serde(default = "defaults::default_bin_size_deg")]
    pub bin_size_deg: f32,
    #[serde(default = "defaults::default_update_hz")]
    pub update_hz: f32,
    #[serde(default = "defaults::default_freq_band")]
    pub freq_band_hz: FreqBand,
    #[serde(default = "defaults::default_smoothing_alpha")]
    pub smoothing_alpha: f32,
    #[serde(default = "defaults::default_top_k_peaks")]
    pub top_k_peaks: usize,
    #[serde(default = "defaults::default_true")]
    pub gate_on_vad: bool,
    #[serde(default = "defaults::default_low_confidence_factor")]
    pub low_confidence_factor: f32,
}

impl Default for DoaConfig {
    fn default() -> Self {
        Self {
            bin_size_deg: defaults::default_bin_size_deg(),
            update_hz: defaults::default_update_hz(),
            freq_band_hz: defaults::default_freq_band(),
            smoothing_alpha: defaults::default_smoothing_alpha(),
            top_k_peaks: defaults::default_top_k_peaks(),
            gate_on_vad: true,
            low_confidence_factor: defaults::default_low_confidence_factor(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssociationWeights {
    pub mouth: f32,
    pub face: f32,
    pub doa: f32,
}

impl Default for AssociationWeights {
    fn default() -> Self {
        defaults::default_weights()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    #[serde(default = "defaults::default_max_assoc_deg")]
    pub max_assoc_deg: f32,
    #[serde(default)]
    pub weights: AssociationWeights,
    #[serde(default = "defaults::default_true")]
    pub require_vad: bool,
    #[serde(default = "defaults::default_faces_max_age_ms")]
    pub faces_max_age_ms: u64,
    #[serde(default = "defaults::default_update_hz")]
    pub update_hz: f32,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            max_assoc_deg: defaults::default_max_assoc_deg(),
            weights: AssociationWeights::default(),
            require_vad: true,
            faces_max_age_ms: defaults::default_faces_max_age_ms(),
            update_hz: defaults::default_update_hz(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockConfig {
    #[serde(default = "defaults::default_acquire_threshold")]
    pub acquire_threshold: f32,
    #[serde(default = "defaults::default_drop_threshold")]
    pub drop_threshold: f32,
    #[serde(default = "defaults::default_acquire_dwell_ms")]
    pub acquire_dwell_ms: u64,
    #[serde(default = "defaults::default_hold_ms")]
    pub hold_ms: u64,
    #[serde(default = "defaults::default_handoff_min_ms")]
    pub handoff_min_ms: u64,
    #[serde(default = "defaults::default_handoff_margin")]
    pub handoff_margin: f32,
    #[serde(default)]
    pub require_vad: bool,
    /// Minimum `mouth_activity` that counts as "speaking" for the
    /// `NO_LOCK -> ACQUIRE` transition (spec.md §4.4) when `require_vad` is
    /// not set, or in addition to `vad.speech` when it is.
    #[serde(default = "defaults::default_speaking_on")]
    pub speaking_on_mouth_activity: f32,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            acquire_threshold: defaults::default_acquire_threshold(),
            drop_threshold: defaults::default_drop_threshold(),
            acquire_dwell_ms: defaults::default_acquire_dwell_ms(),
            hold_ms: defaults::default_hold_ms(),
            handoff_min_ms: defaults::default_handoff_min_ms(),
            handoff_margin: defaults::default_handoff_margin(),
            require_vad: false,
            speaking_on_mouth_activity: defaults::default_speaking_on(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum NoLockBehavior {
    Omni,
    HoldLast,
    Mute,
}

impl Default for NoLockBehavior {
    fn default() -> Self {
        NoLockBehavior::Omni
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamformConfig {
    #[serde(default = "defaults::default_use_last_lock_ms")]
    pub use_last_lock_ms: u64,
    #[serde(default)]
    pub no_lock_behavior: NoLockBehavior,
    #[serde(default = "defaults::default_latency_budget_ms")]
    pub latency_budget_ms: u64,
}

impl Default for BeamformConfig {
    fn default() -> Self {
        Self {
            use_last_lock_ms: defaults::default_use_last_lock_ms(),
            no_lock_behavior: NoLockBehavior::default(),
            latency_budget_ms: defaults::default_latency_budget_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicyConfig {
    DropNewest,
    DropOldest,
    Block,
}

impl Default for OverflowPolicyConfig {
    fn default() -> Self {
        OverflowPolicyConfig::DropNewest
    }
}

impl From<OverflowPolicyConfig> for OverflowPolicy {
    fn from(value: OverflowPolicyConfig) -> Self {
        match value {
            OverflowPolicyConfig::DropNewest => OverflowPolicy::DropNewest,
            OverflowPolicyConfig::DropOldest => OverflowPolicy::DropOldest,
            OverflowPolicyConfig::Block => OverflowPolicy::Block,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusConfig {
    #[serde(default = "defaults::default_bus_capacity")]
    pub default_capacity: usize,
    #[serde(default)]
    pub overflow_policy: OverflowPolicyConfig,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            default_capacity: defaults::default_bus_capacity(),
            overflow_policy: OverflowPolicyConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthConfig {
    #[serde(default = "defaults::default_staleness_yellow_ms")]
    pub staleness_yellow_ms: u64,
    #[serde(default = "defaults::default_staleness_red_ms")]
    pub staleness_red_ms: u64,
    #[serde(default = "defaults::default_health_hz")]
    pub publish_hz: f32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            staleness_yellow_ms: defaults::default_staleness_yellow_ms(),
            staleness_red_ms: defaults::default_staleness_red_ms(),
            publish_hz: defaults::default_health_hz(),
        }
    }
}

/// The full, validated configuration snapshot a [`crate::Runtime`] is built
/// from. Immutable after startup — spec.md §5 treats reconfiguration as a
/// full shutdown + restart, never a live patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusFieldConfig {
    #[serde(default)]
    pub array: ArrayConfig,
    #[serde(default)]
    pub doa: DoaConfig,
    #[serde(default)]
    pub fusion: FusionConfig,
    #[serde(default)]
    pub lock: LockConfig,
    #[serde(default)]
    pub beamform: BeamformConfig,
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default = "defaults::default_shutdown_deadline_ms")]
    pub shutdown_deadline_ms: u64,
}

impl Default for FocusFieldConfig {
    fn default() -> Self {
        Self {
            array: ArrayConfig::default(),
            doa: DoaConfig::default(),
            fusion: FusionConfig::default(),
            lock: LockConfig::default(),
            beamform: BeamformConfig::default(),
            bus: BusConfig::default(),
            health: HealthConfig::default(),
            shutdown_deadline_ms: defaults::default_shutdown_deadline_ms(),
        }
    }
}

impl FocusFieldConfig {
    /// Load a config file (YAML or JSON, by extension) if given, apply CLI
    /// overrides on top, then validate. Mirrors the teacher's
    /// `AppConfig::parse_args` two-step "parse then validate" shape.
    pub fn load(cli: &Cli) -> Result<Self, crate::error::ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        cli.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &std::path::Path) -> Result<Self, crate::error::ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| crate::error::ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = matches!(path.extension().and_then(|ext| ext.to_str()), Some("json"));
        if is_json {
            serde_json::from_str(&text).map_err(|source| crate::error::ConfigError::Parse {
                path: path.to_path_buf(),
                format: "json",
                source: Box::new(source),
            })
        } else {
            serde_yaml::from_str(&text).map_err(|source| crate::error::ConfigError::Parse {
                path: path.to_path_buf(),
                format: "yaml",
                source: Box::new(source),
            })
        }
    }
}
