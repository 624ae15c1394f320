use serde::{Deserialize, Serialize};

/// The five hysteretic states of the lock machine (spec.md §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockState {
    NoLock,
    Acquire,
    Locked,
    Hold,
    Handoff,
}

impl LockState {
    pub fn label(self) -> &'static str {
        match self {
            LockState::NoLock => "no_lock",
            LockState::Acquire => "acquire",
            LockState::Locked => "locked",
            LockState::Hold => "hold",
            LockState::Handoff => "handoff",
        }
    }
}

/// Derived from the locked candidate's composition, not a primary state
/// (spec.md §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockMode {
    NoLock,
    VisionOnly,
    AudioOnly,
    AvLock,
}

impl LockMode {
    pub fn label(self) -> &'static str {
        match self {
            LockMode::NoLock => "no_lock",
            LockMode::VisionOnly => "vision_only",
            LockMode::AudioOnly => "audio_only",
            LockMode::AvLock => "av_lock",
        }
    }
}

/// Stability bookkeeping surfaced for diagnostics (not read by the
/// beamformer, which only needs `target_bearing_deg`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StabilityStats {
    pub ticks_in_state: u64,
    pub target_changes: u64,
    pub last_commit_t_ns: Option<u64>,
}

/// One tick of the lock machine's output (spec.md §3, §4.4). Emitted once
/// per candidate batch or heartbeat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetLock {
    pub t_ns: u64,
    pub seq: u64,
    pub state: LockState,
    pub mode: LockMode,
    pub target_id: Option<u64>,
    /// Populated even in `AudioOnly` mode so the beamformer always has a
    /// steering angle (spec.md §4.4).
    pub target_bearing_deg: Option<f32>,
    pub confidence: f32,
    pub reason: String,
    pub stability: StabilityStats,
}

impl TargetLock {
    pub fn no_lock(t_ns: u64, seq: u64, reason: impl Into<String>) -> Self {
        Self {
            t_ns,
            seq,
            state: LockState::NoLock,
            mode: LockMode::NoLock,
            target_id: None,
            target_bearing_deg: None,
            confidence: 0.0,
            reason: reason.into(),
            stability: StabilityStats::default(),
        }
    }

    /// spec.md §3 invariant: `state == NoLock` implies no target identity.
    pub fn respects_no_lock_invariant(&self) -> bool {
        self.state != LockState::NoLock || self.target_id.is_none()
    }
}
