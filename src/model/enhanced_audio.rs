use serde::{Deserialize, Serialize};

/// Observability stats attached to each beamformer output block
/// (spec.md §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnhancedAudioStats {
    pub rms: f32,
    pub clipping_count: u32,
    pub suppression_db: f32,
}

/// The single monaural output block, aligned 1:1 with the input `AudioFrame`
/// by `seq` (spec.md §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedAudio {
    pub t_ns: u64,
    pub seq: u64,
    pub sample_rate_hz: u32,
    pub block_samples: usize,
    pub samples: Vec<f32>,
    pub stats: EnhancedAudioStats,
}
