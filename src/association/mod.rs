//! AV association stage (spec.md §4.3): pairs DOA peaks with face tracks
//! into scored candidates, greedily matching each peak and each track at
//! most once, falling back to audio-only candidates when faces are stale.


use crate::clock::Clock;
use crate::config::FusionConfig;
use crate::model::{AssociationCandidate, CandidateScores, DoaHeatmap, FaceTrack, VoiceActivity, wrap_deg};

pub struct AssociationEngine {
    config: FusionConfig,
    seq: u64,
}

impl AssociationEngine {
    pub fn new(config: FusionConfig) -> Self {
        Self { config, seq: 0 }
    }

    /// One association tick (spec.md §4.3). `faces` is the most recent
    /// batch; each track's freshness is judged against `clock.now_ns()`
    /// independently of the heatmap's own timestamp (spec.md §5: "it must
    /// not assume cross-topic timestamp equality").
    pub fn process(
        &mut self,
        heatmap: &DoaHeatmap,
        faces: &[FaceTrack],
        vad: Option<&VoiceActivity>,
        clock: &Clock,
    ) -> Vec<AssociationCandidate> {
        let fresh_faces: Vec<&FaceTrack> = faces
            .iter()
            .filter(|f| f.is_fresh(clock.age_ms(f.t_ns), self.config.faces_max_age_ms))
            .collect();
        let faces_stale = fresh_faces.is_empty();

        let weights = &self.config.weights;
        let mut pairs: Vec<AssociationCandidate> = Vec::new();
        for peak in &heatmap.peaks {
            for track in &fresh_faces {
                let angular_distance_deg = angular_distance(peak.angle_deg, track.bearing_deg);
                if angular_distance_deg > self.config.max_assoc_deg {
                    continue;
                }
                let scores = CandidateScores { mouth: track.mouth_activity, face_conf: track.confidence, doa_peak: peak.score };
                let combined_score = weights.mouth * scores.mouth + weights.face * scores.face_conf + weights.doa * scores.doa_peak;
                pairs.push(AssociationCandidate {
                    t_ns: heatmap.t_ns,
                    seq: 0,
                    track_id: Some(track.track_id),
                    doa_peak_deg: peak.angle_deg,
                    angular_distance_deg,
                    scores,
                    combined_score: combined_score.clamp(0.0, 1.0),
                });
            }
        }
        // Greedy by descending combined score; each track and each peak
        // used at most once (spec.md §4.3 "Matching").
        pairs.sort_by(|a, b| b.combined_score.partial_cmp(&a.combined_score).unwrap_or(std::cmp::Ordering::Equal));

        let mut used_tracks = std::collections::HashSet::new();
        let mut used_peaks = std::collections::HashSet::new();
        let mut matched = Vec::new();
        for candidate in pairs {
            let peak_key = candidate.doa_peak_deg.to_bits();
            let track_key = candidate.track_id;
            if used_peaks.contains(&peak_key) || track_key.map(|id| used_tracks.contains(&id)).unwrap_or(false) {
                continue;
            }
            used_peaks.insert(peak_key);
            if let Some(id) = track_key {
                used_tracks.insert(id);
            }
            matched.push(candidate);
        }

        let vad_speaking = vad.map(|v| v.speech).unwrap_or(false);
        if vad_speaking && faces_stale {
            for peak in &heatmap.peaks {
                let peak_key = peak.angle_deg.to_bits();
                if used_peaks.contains(&peak_key) {
                    continue;
                }
                matched.push(AssociationCandidate {
                    t_ns: heatmap.t_ns,
                    seq: 0,
                    track_id: None,
                    doa_peak_deg: peak.angle_deg,
                    angular_distance_deg: 0.0,
                    scores: CandidateScores { mouth: 0.0, face_conf: 0.0, doa_peak: peak.score },
                    combined_score: (weights.doa * peak.score).clamp(0.0, 1.0),
                });
            }
        }

        matched.sort_by(|a, b| b.combined_score.partial_cmp(&a.combined_score).unwrap_or(std::cmp::Ordering::Equal));
        self.seq += 1;
        for candidate in matched.iter_mut() {
            candidate.seq = self.seq;
        }
        matched
    }
}

/// Shortest angular distance between two wrapped azimuths, in `[0, 180]`.
pub(crate) fn angular_distance(a_deg: f32, b_deg: f32) -> f32 {
    let a = wrap_deg(a_deg);
    let b = wrap_deg(b_deg);
    let diff = (a - b).abs() % 360.0;
    diff.min(360.0 - diff)
}

#[cfg(test)]
mod angular_distance_tests {
    use super::*;

    #[test]
    fn zero_for_identical_angles() {
        assert_eq!(angular_distance(45.0, 45.0), 0.0);
    }

    #[test]
    fn wraps_across_the_0_360_boundary() {
        assert!((angular_distance(1.0, 359.0) - 2.0).abs() < 1e-4);
    }

    #[test]
    fn caps_at_180_for_opposite_angles() {
        assert!((angular_distance(0.0, 180.0) - 180.0).abs() < 1e-4);
    }
}
