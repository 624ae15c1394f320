use serde::{Deserialize, Serialize};

/// Per-block speech/no-speech decision, produced externally (spec.md §6:
/// `audio.vad` is an input topic the core consumes, never produces).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceActivity {
    pub t_ns: u64,
    pub seq: u64,
    pub speech: bool,
    pub confidence: f32,
}

impl VoiceActivity {
    /// `confidence` clamped into `[0, 1]`, per spec.md §3's invariant.
    pub fn clamped_confidence(&self) -> f32 {
        self.confidence.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_range_confidence() {
        let va = VoiceActivity { t_ns: 0, seq: 0, speech: true, confidence: 1.5 };
        assert_eq!(va.clamped_confidence(), 1.0);
        let va = VoiceActivity { t_ns: 0, seq: 0, speech: true, confidence: -0.5 };
        assert_eq!(va.clamped_confidence(), 0.0);
    }
}
