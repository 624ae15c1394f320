use serde::{Deserialize, Serialize};

/// Per-track (or audio-only) component scores that fed `combined_score`
/// (spec.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateScores {
    pub mouth: f32,
    pub face_conf: f32,
    pub doa_peak: f32,
}

/// One scored pairing of a DOA peak with at most one face track, or an
/// audio-only fallback when `track_id` is `None` (spec.md §3, §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssociationCandidate {
    pub t_ns: u64,
    pub seq: u64,
    pub track_id: Option<u64>,
    pub doa_peak_deg: f32,
    pub angular_distance_deg: f32,
    pub scores: CandidateScores,
    pub combined_score: f32,
}

impl AssociationCandidate {
    pub fn is_audio_only(&self) -> bool {
        self.track_id.is_none()
    }
}
