use serde::{Deserialize, Serialize};

/// One captured block of interleaved multichannel PCM (spec.md §3, §9 open
/// question: interleaved with channel-stride access, chosen over planar).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFrame {
    pub t_ns: u64,
    pub seq: u64,
    pub sample_rate_hz: u32,
    pub block_samples: usize,
    pub channels: usize,
    /// Interleaved samples, length `block_samples * channels`.
    pub samples: Vec<f32>,
}

impl AudioFrame {
    /// Samples for channel `ch`, read with the interleaved stride.
    pub fn channel(&self, ch: usize) -> impl Iterator<Item = f32> + '_ {
        self.samples[ch..].iter().copied().step_by(self.channels.max(1))
    }

    /// `true` if `samples.len()` matches `block_samples * channels` and
    /// `channels` is nonzero — the shape invariant from spec.md §3.
    pub fn is_well_formed(&self) -> bool {
        self.channels > 0 && self.samples.len() == self.block_samples * self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(channels: usize, block_samples: usize) -> AudioFrame {
        let samples: Vec<f32> = (0..channels * block_samples).map(|i| i as f32).collect();
        AudioFrame {
            t_ns: 0,
            seq: 0,
            sample_rate_hz: 16_000,
            block_samples,
            channels,
            samples,
        }
    }

    #[test]
    fn channel_reads_with_correct_stride() {
        let f = frame(2, 3);
        // interleaved: ch0 ch1 ch0 ch1 ch0 ch1 -> values 0,1,2,3,4,5
        let ch0: Vec<f32> = f.channel(0).collect();
        let ch1: Vec<f32> = f.channel(1).collect();
        assert_eq!(ch0, vec![0.0, 2.0, 4.0]);
        assert_eq!(ch1, vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn well_formed_detects_shape_mismatch() {
        let mut f = frame(4, 128);
        assert!(f.is_well_formed());
        f.samples.pop();
        assert!(!f.is_well_formed());
    }

    #[test]
    fn well_formed_rejects_zero_channels() {
        let f = frame(0, 128);
        assert!(!f.is_well_formed());
    }
}
