use serde::{Deserialize, Serialize};

/// A local maximum in the heatmap (spec.md §4.2 peak picking).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoaPeak {
    pub angle_deg: f32,
    pub score: f32,
}

/// The 360°-azimuth SRP-PHAT likelihood surface for one DOA update
/// (spec.md §3, §4.2). `scores.len() == 360 / bin_size_deg` and
/// `max(scores) <= 1` after normalization + smoothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoaHeatmap {
    pub t_ns: u64,
    pub seq: u64,
    pub bin_count: usize,
    pub bin_size_deg: f32,
    pub scores: Vec<f32>,
    pub peaks: Vec<DoaPeak>,
    /// Downweighted when VAD says no speech and `doa.gate_on_vad` is set, or
    /// when geometry degraded to the GCC-PHAT fallback (spec.md §4.2).
    pub confidence: f32,
    pub low_confidence: bool,
}

impl DoaHeatmap {
    pub fn bin_angle_deg(&self, bin: usize) -> f32 {
        bin as f32 * self.bin_size_deg
    }

    pub fn max_score(&self) -> f32 {
        self.scores.iter().cloned().fold(0.0, f32::max)
    }

    /// spec.md §8: `scores.len() == 360 / bin_size_deg`.
    pub fn has_expected_bin_count(&self) -> bool {
        self.bin_count == self.scores.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DoaHeatmap {
        DoaHeatmap {
            t_ns: 0,
            seq: 0,
            bin_count: 180,
            bin_size_deg: 2.0,
            scores: vec![0.1; 180],
            peaks: vec![DoaPeak { angle_deg: 90.0, score: 1.0 }],
            confidence: 1.0,
            low_confidence: false,
        }
    }

    #[test]
    fn bin_angle_deg_scales_by_bin_size() {
        let h = sample();
        assert_eq!(h.bin_angle_deg(45), 90.0);
    }

    #[test]
    fn max_score_finds_peak() {
        let mut h = sample();
        h.scores[10] = 0.87;
        assert_eq!(h.max_score(), 0.87);
    }

    #[test]
    fn round_trips_through_json() {
        let h = sample();
        let json = serde_json::to_string(&h).unwrap();
        let back: DoaHeatmap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }
}
