//! Default values for every tunable in [`super::FocusFieldConfig`]
//! (spec.md §6 "Configuration surface"). Kept as free functions, matching
//! the teacher's `config/defaults.rs` shape, so `serde(default = "...")`
//! and `clap`'s `default_value_t` can both reference them without
//! duplicating literals.

use super::{AssociationWeights, FreqBand, MicPosition};

pub(super) fn default_true() -> bool {
    true
}

/// A 4-mic linear array spaced 5 cm apart, centered on the origin — a
/// reasonable bench default; real deployments always override this via
/// `array.mic_positions_m`.
pub(super) fn default_mic_positions() -> Vec<MicPosition> {
    vec![
        MicPosition { x: -0.075, y: 0.0 },
        MicPosition { x: -0.025, y: 0.0 },
        MicPosition { x: 0.025, y: 0.0 },
        MicPosition { x: 0.075, y: 0.0 },
    ]
}

pub(super) fn default_speed_of_sound_mps() -> f32 {
    343.0
}

pub(super) fn default_bin_size_deg() -> f32 {
    2.0
}

pub(super) fn default_update_hz() -> f32 {
    10.0
}

pub(super) fn default_freq_band() -> FreqBand {
    FreqBand { lo_hz: 300.0, hi_hz: 3800.0 }
}

pub(super) fn default_smoothing_alpha() -> f32 {
    0.3
}

pub(super) fn default_top_k_peaks() -> usize {
    3
}

pub(super) fn default_low_confidence_factor() -> f32 {
    0.3
}

pub(super) fn default_max_assoc_deg() -> f32 {
    20.0
}

pub(super) fn default_weights() -> AssociationWeights {
    AssociationWeights { mouth: 0.4, face: 0.2, doa: 0.4 }
}

pub(super) fn default_faces_max_age_ms() -> u64 {
    300
}

pub(super) fn default_acquire_threshold() -> f32 {
    0.6
}

pub(super) fn default_drop_threshold() -> f32 {
    0.35
}

pub(super) fn default_acquire_dwell_ms() -> u64 {
    150
}

pub(super) fn default_hold_ms() -> u64 {
    800
}

pub(super) fn default_handoff_min_ms() -> u64 {
    700
}

pub(super) fn default_handoff_margin() -> f32 {
    0.1
}

pub(super) fn default_speaking_on() -> f32 {
    0.5
}

pub(super) fn default_use_last_lock_ms() -> u64 {
    500
}

pub(super) fn default_latency_budget_ms() -> u64 {
    50
}

pub(super) fn default_bus_capacity() -> usize {
    32
}

pub(super) fn default_staleness_yellow_ms() -> u64 {
    250
}

pub(super) fn default_staleness_red_ms() -> u64 {
    750
}

pub(super) fn default_health_hz() -> f32 {
    2.0
}

pub(super) fn default_shutdown_deadline_ms() -> u64 {
    2_000
}
