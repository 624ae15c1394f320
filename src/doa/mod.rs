//! SRP-PHAT direction-of-arrival estimator (spec.md §4.2).
//!
//! Produces one [`DoaHeatmap`] per DOA update tick from accumulated
//! multichannel audio blocks: Hann-windowed FFT per channel, PHAT-whitened
//! cross-spectra per mic pair, a steered-sum score per azimuth bin, EMA
//! smoothing across ticks, and top-K peak picking. Falls back to a single
//! canonical-pair GCC-PHAT estimate when the array geometry is missing or
//! degenerate (spec.md §4.2 "Failure").

pub(crate) mod geometry;
mod peaks;
pub(crate) mod spectrum;

use crate::clock::Clock;
use crate::config::{ArrayConfig, DoaConfig};
use crate::model::{AudioFrame, DoaHeatmap, LogEvent, VoiceActivity};
use num_complex::Complex;
use spectrum::SpectrumAnalyzer;

/// PHAT whitening denominator epsilon (spec.md §4.2 step 2, `+ eps`).
const PHAT_EPS: f32 = 1e-9;

pub struct DoaEngine {
    config: DoaConfig,
    array: ArrayConfig,
    bin_count: usize,
    degenerate: bool,
    /// Set once the first frame establishes channel count and block size;
    /// `None` channels means "accumulate, do not yet know the FFT length".
    channels: Option<usize>,
    blocks_per_update: usize,
    accum_blocks: usize,
    accum: Vec<f32>,
    last_t_ns: u64,
    analyzer: Option<SpectrumAnalyzer>,
    prev_scores: Option<Vec<f32>>,
    seq: u64,
    logged_degraded: bool,
    pending_logs: Vec<LogEvent>,
}

impl DoaEngine {
    pub fn new(config: DoaConfig, array: ArrayConfig) -> Self {
        let bin_count = ((360.0 / config.bin_size_deg).round() as usize).max(1);
        let degenerate = geometry::is_degenerate(&array.mic_positions_m);
        Self {
            config,
            array,
            bin_count,
            degenerate,
            channels: None,
            blocks_per_update: 1,
            accum_blocks: 0,
            accum: Vec::new(),
            last_t_ns: 0,
            analyzer: None,
            prev_scores: None,
            seq: 0,
            logged_degraded: false,
            pending_logs: Vec::new(),
        }
    }

    /// Drain log events accumulated since the last call (e.g.
    /// `doa.geometry_degraded`), for the owning thread to publish onto
    /// `log.events`.
    pub fn take_log_events(&mut self) -> Vec<LogEvent> {
        std::mem::take(&mut self.pending_logs)
    }

    /// Feed one captured block. Returns `Some(heatmap)` once enough blocks
    /// have accumulated to meet `doa.update_hz` (spec.md §4.2 step 1,
    /// "accumulate or decimate input blocks ... so that at least update_hz
    /// updates/sec are emitted").
    pub fn process(&mut self, frame: &AudioFrame, vad: Option<&VoiceActivity>, clock: &Clock) -> Option<DoaHeatmap> {
        if self.channels.is_none() {
            self.channels = Some(frame.channels);
            let capture_hz = frame.sample_rate_hz as f32 / frame.block_samples.max(1) as f32;
            self.blocks_per_update = (capture_hz / self.config.update_hz.max(0.001)).round().max(1.0) as usize;
        }
        let channels = self.channels.unwrap_or(frame.channels).max(1);

        self.accum.extend_from_slice(&frame.samples);
        self.accum_blocks += 1;
        self.last_t_ns = frame.t_ns;

        if self.accum_blocks < self.blocks_per_update {
            return None;
        }

        let heatmap = self.compute_heatmap(channels, frame.sample_rate_hz, vad, clock);
        self.accum.clear();
        self.accum_blocks = 0;
        Some(heatmap)
    }

    fn compute_heatmap(&mut self, channels: usize, sample_rate_hz: u32, vad: Option<&VoiceActivity>, clock: &Clock) -> DoaHeatmap {
        let per_channel_len = self.accum.len() / channels;
        if self.analyzer.as_ref().map(|a| a.len()) != Some(per_channel_len) && per_channel_len > 0 {
            self.analyzer = Some(SpectrumAnalyzer::new(per_channel_len));
        }

        let spectra: Vec<Vec<Complex<f32>>> = match &self.analyzer {
            Some(analyzer) => (0..channels)
                .map(|ch| {
                    let channel_samples: Vec<f32> = self.accum[ch..].iter().copied().step_by(channels).collect();
                    analyzer.transform(&channel_samples)
                })
                .collect(),
            None => Vec::new(),
        };

        let fft_len = per_channel_len;
        let (lo_bin, hi_bin) = if fft_len > 0 {
            (
                spectrum::bin_for_freq(self.config.freq_band_hz.lo_hz, sample_rate_hz, fft_len),
                spectrum::bin_for_freq(self.config.freq_band_hz.hi_hz, sample_rate_hz, fft_len),
            )
        } else {
            (0, 0)
        };

        if self.degenerate && !self.logged_degraded {
            self.pending_logs.push(LogEvent::warn(
                clock.now_ns(),
                "doa",
                "doa.geometry_degraded",
                "array geometry missing or degenerate; falling back to single-pair GCC-PHAT",
            ));
            self.logged_degraded = true;
        }

        let pairs: Vec<(usize, usize)> = if self.degenerate {
            if channels >= 2 {
                vec![(0, 1)]
            } else {
                Vec::new()
            }
        } else {
            (0..channels).flat_map(|i| (i + 1..channels).map(move |j| (i, j))).collect()
        };

        let mut scores = vec![0.0f32; self.bin_count];
        if !pairs.is_empty() && fft_len > 0 {
            for (bin, score) in scores.iter_mut().enumerate() {
                let theta_deg = bin as f32 * self.config.bin_size_deg;
                let mut sum = 0.0f32;
                for &(i, j) in &pairs {
                    let mic_i = self.array.mic_positions_m[i];
                    let mic_j = self.array.mic_positions_m[j];
                    let tau = geometry::pairwise_delay_s(mic_i, mic_j, theta_deg, self.array.speed_of_sound_mps);
                    for k in lo_bin..=hi_bin.max(lo_bin) {
                        let freq_hz = k as f32 * sample_rate_hz as f32 / fft_len as f32;
                        let g = spectrum::phat_whiten(spectra[i][k], spectra[j][k], PHAT_EPS);
                        let rotation = Complex::from_polar(1.0, 2.0 * std::f32::consts::PI * freq_hz * tau);
                        sum += (g * rotation).re;
                    }
                }
                *score = sum;
            }
        }

        normalize(&mut scores);

        if let Some(prev) = &self.prev_scores {
            if prev.len() == scores.len() {
                let alpha = self.config.smoothing_alpha;
                for (s, p) in scores.iter_mut().zip(prev.iter()) {
                    *s = (1.0 - alpha) * *s + alpha * *p;
                }
            }
        }
        self.prev_scores = Some(scores.clone());

        let top_k = if self.degenerate { 1 } else { self.config.top_k_peaks };
        let min_sep = (3.0 * self.config.bin_size_deg).max(10.0);
        let peaks = peaks::pick_peaks(&scores, self.config.bin_size_deg, top_k, min_sep);

        let no_speech_gate = self.config.gate_on_vad && vad.map(|v| !v.speech).unwrap_or(false);
        let (confidence, low_confidence) = if self.degenerate {
            (0.0, true)
        } else if no_speech_gate {
            (self.config.low_confidence_factor, true)
        } else {
            (1.0, false)
        };

        self.seq += 1;
        DoaHeatmap {
            t_ns: self.last_t_ns,
            seq: self.seq,
            bin_count: self.bin_count,
            bin_size_deg: self.config.bin_size_deg,
            scores,
            peaks,
            confidence,
            low_confidence,
        }
    }
}

/// Normalize so `max(S) == 1` after subtracting `min(S)` (spec.md §4.2 step
/// 4, "prevents negative scores from wide-band noise"). An all-equal input
/// (e.g. silence) normalizes to all zeros rather than dividing by zero.
fn normalize(scores: &mut [f32]) {
    let min = scores.iter().cloned().fold(f32::INFINITY, f32::min);
    let min = if min.is_finite() { min } else { 0.0 };
    for s in scores.iter_mut() {
        *s -= min;
    }
    let max = scores.iter().cloned().fold(0.0f32, f32::max);
    if max > 1e-12 {
        for s in scores.iter_mut() {
            *s /= max;
        }
    }
}

#[cfg(test)]
mod normalize_tests {
    use super::*;

    #[test]
    fn normalizes_max_to_one() {
        let mut scores = vec![0.5, 1.5, 2.5];
        normalize(&mut scores);
        assert!((scores.iter().cloned().fold(0.0f32, f32::max) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn flat_input_stays_flat_without_dividing_by_zero() {
        let mut scores = vec![3.0; 8];
        normalize(&mut scores);
        assert!(scores.iter().all(|&s| s == 0.0));
    }
}
