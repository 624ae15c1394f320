//! The core data model (spec.md §3): the message types carried on the Bus.
//!
//! All timestamps are monotonic nanoseconds (see `crate::clock`); all
//! sequence numbers are per-stream and strictly increasing by one; all
//! azimuths are wrapped into `[0, 360)` degrees before they leave a
//! component.

mod audio_frame;
mod candidate;
mod doa_heatmap;
mod enhanced_audio;
mod face_track;
mod health;
mod log_event;
mod target_lock;
mod voice_activity;

pub use audio_frame::AudioFrame;
pub use candidate::AssociationCandidate;
pub use doa_heatmap::{DoaHeatmap, DoaPeak};
pub use enhanced_audio::{EnhancedAudio, EnhancedAudioStats};
pub use face_track::FaceTrack;
pub use health::{HealthSnapshot, PerfSnapshot, StageLatency, Staleness, TopicHealth};
pub use log_event::{LogEvent, LogLevel};
pub use target_lock::{LockMode, LockState, TargetLock};
pub use voice_activity::VoiceActivity;

/// Binds a payload type to the canonical Bus topic name it travels on
/// (spec.md §6). Kept as a trait rather than a bare string constant so
/// `Bus::publish`/`Bus::subscribe` are generic over message type instead of
/// stringly typed at every call site; the topic name string itself still
/// appears exactly once, in each impl below.
pub trait Topic: Send + Sync + 'static {
    const NAME: &'static str;
}

impl Topic for AudioFrame {
    const NAME: &'static str = "audio.frames";
}

impl Topic for VoiceActivity {
    const NAME: &'static str = "audio.vad";
}

impl Topic for Vec<FaceTrack> {
    const NAME: &'static str = "vision.face_tracks";
}

impl Topic for DoaHeatmap {
    const NAME: &'static str = "audio.doa_heatmap";
}

impl Topic for Vec<AssociationCandidate> {
    const NAME: &'static str = "fusion.candidates";
}

impl Topic for TargetLock {
    const NAME: &'static str = "fusion.target_lock";
}

impl Topic for EnhancedAudio {
    const NAME: &'static str = "audio.enhanced.beamformed";
}

impl Topic for LogEvent {
    const NAME: &'static str = "log.events";
}

impl Topic for HealthSnapshot {
    const NAME: &'static str = "runtime.health";
}

impl Topic for PerfSnapshot {
    const NAME: &'static str = "runtime.perf";
}

/// Wrap an azimuth in degrees into `[0, 360)`, per spec.md §3 and the
/// "angle wrap" testable property in §8: `((x mod 360) + 360) mod 360`.
pub fn wrap_deg(deg: f32) -> f32 {
    let wrapped = deg % 360.0;
    if wrapped < 0.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}
