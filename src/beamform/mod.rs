//! Delay-and-sum beamformer (spec.md §4.5). Steers the array toward the
//! locked target's bearing by rotating each channel's spectrum by its
//! expected arrival delay before summing, so sound from that direction adds
//! in phase while everything else partially cancels. Falls back to an
//! unweighted channel average when there is no bearing to steer toward, and
//! to silence or the last known bearing depending on `no_lock_behavior`.

#[cfg(test)]
mod tests;

use crate::clock::Clock;
use crate::config::{ArrayConfig, BeamformConfig, MicPosition, NoLockBehavior};
use crate::doa::geometry;
use crate::model::{AudioFrame, EnhancedAudio, EnhancedAudioStats, LockMode, LogEvent, TargetLock};
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

const CLIP_THRESHOLD: f32 = 0.999;
const METER_FLOOR_DB: f32 = -60.0;

/// A matched forward/inverse FFT pair for one block length, planned once and
/// reused across blocks (same caching shape as `doa::spectrum::SpectrumAnalyzer`,
/// the crate's other `rustfft` user).
struct FftPair {
    len: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
}

impl FftPair {
    fn new(len: usize) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        Self {
            len,
            forward: planner.plan_fft_forward(len),
            inverse: planner.plan_fft_inverse(len),
        }
    }
}

pub struct Beamformer {
    config: BeamformConfig,
    array: ArrayConfig,
    degenerate: bool,
    logged_degraded: bool,
    pending_logs: Vec<LogEvent>,
    fft: Option<FftPair>,
    last_lock_bearing_deg: Option<f32>,
    last_lock_t_ns: Option<u64>,
    last_output_level: f32,
    seq: u64,
}

impl Beamformer {
    pub fn new(config: BeamformConfig, array: ArrayConfig) -> Self {
        let degenerate = geometry::is_degenerate(&array.mic_positions_m);
        Self {
            config,
            array,
            degenerate,
            logged_degraded: false,
            pending_logs: Vec::new(),
            fft: None,
            last_lock_bearing_deg: None,
            last_lock_t_ns: None,
            last_output_level: 0.0,
            seq: 0,
        }
    }

    /// Drain log events accumulated since the last call (e.g.
    /// `beamform.geometry_degraded`), for the owning thread to publish onto
    /// `log.events`.
    pub fn take_log_events(&mut self) -> Vec<LogEvent> {
        std::mem::take(&mut self.pending_logs)
    }

    /// Steer (or fall back) one captured block into a single monaural
    /// output block, aligned by `seq` with the input `frame` (spec.md §3).
    pub fn process(&mut self, frame: &AudioFrame, lock: Option<&TargetLock>, clock: &Clock) -> EnhancedAudio {
        let is_no_lock = lock.map(|l| l.mode == LockMode::NoLock).unwrap_or(true);
        if let (Some(lock), false) = (lock, is_no_lock) {
            if let Some(bearing) = lock.target_bearing_deg {
                self.last_lock_bearing_deg = Some(bearing);
                self.last_lock_t_ns = Some(lock.t_ns);
            }
        }

        let bearing_deg = self.steering_bearing(is_no_lock, clock);
        self.seq += 1;

        let (samples, steered) = if bearing_deg.is_none() && is_no_lock && matches!(self.config.no_lock_behavior, NoLockBehavior::Mute) {
            (self.muted_block(frame.block_samples), false)
        } else {
            match bearing_deg {
                Some(theta) => (self.steer(frame, theta), true),
                None => (self.omni(frame), false),
            }
        };
        self.last_output_level = samples.last().copied().unwrap_or(0.0);

        let stats = self.stats(frame, &samples, steered);
        EnhancedAudio {
            t_ns: frame.t_ns,
            seq: self.seq,
            sample_rate_hz: frame.sample_rate_hz,
            block_samples: frame.block_samples,
            samples,
            stats,
        }
    }

    /// Which bearing (if any) to steer toward this tick. `None` means "no
    /// steering": the caller falls back to an unweighted average or silence
    /// depending on `no_lock_behavior`.
    fn steering_bearing(&mut self, is_no_lock: bool, clock: &Clock) -> Option<f32> {
        if self.degenerate {
            if !self.logged_degraded {
                self.pending_logs.push(LogEvent::warn(
                    clock.now_ns(),
                    "beamform",
                    "beamform.geometry_degraded",
                    "array geometry missing or degenerate; falling back to omni",
                ));
                self.logged_degraded = true;
            }
            return None;
        }

        if !is_no_lock {
            return self.last_lock_bearing_deg;
        }

        match self.config.no_lock_behavior {
            NoLockBehavior::Omni | NoLockBehavior::Mute => None,
            NoLockBehavior::HoldLast => {
                let age_ms = self.last_lock_t_ns.map(|t| clock.age_ms(t)).unwrap_or(u64::MAX);
                if age_ms <= self.config.use_last_lock_ms {
                    self.last_lock_bearing_deg
                } else {
                    None
                }
            }
        }
    }

    /// Delay-and-sum via per-channel FFT phase rotation: rotate each
    /// channel's spectrum by `exp(-j*2*pi*f*tau)` where `tau` is that
    /// channel's expected arrival delay for `theta_deg`, inverse-transform,
    /// then average across channels (spec.md §4.5 step 1-2).
    fn steer(&mut self, frame: &AudioFrame, theta_deg: f32) -> Vec<f32> {
        let channels = frame.channels.max(1);
        let len = frame.block_samples;
        if len == 0 {
            return Vec::new();
        }
        if self.fft.as_ref().map(|f| f.len) != Some(len) {
            self.fft = Some(FftPair::new(len));
        }
        let fft = self.fft.as_ref().expect("fft pair just initialized above");

        let mut acc = vec![0.0f32; len];
        for ch in 0..channels {
            let mic = self.array.mic_positions_m.get(ch).copied().unwrap_or(MicPosition { x: 0.0, y: 0.0 });
            let tau = geometry::channel_delay_s(mic, theta_deg, self.array.speed_of_sound_mps);

            let mut buf: Vec<Complex<f32>> = frame.channel(ch).map(|s| Complex::new(s, 0.0)).collect();
            fft.forward.process(&mut buf);
            for (k, bin) in buf.iter_mut().enumerate() {
                let freq_hz = signed_freq_hz(k, len, frame.sample_rate_hz);
                let rotation = Complex::from_polar(1.0, -2.0 * std::f32::consts::PI * freq_hz * tau);
                *bin *= rotation;
            }
            fft.inverse.process(&mut buf);

            let scale = 1.0 / len as f32;
            for (a, c) in acc.iter_mut().zip(buf.iter()) {
                *a += c.re * scale;
            }
        }

        let gain = 1.0 / channels as f32;
        for s in acc.iter_mut() {
            *s *= gain;
        }
        acc
    }

    /// Silence with a short linear fade from the last emitted sample level,
    /// so switching into `mute` does not produce an audible click (spec.md
    /// §4.5 step 3, "mute (zero output with fade to avoid clicks)").
    fn muted_block(&self, block_samples: usize) -> Vec<f32> {
        const FADE_SAMPLES: usize = 32;
        let fade_len = FADE_SAMPLES.min(block_samples);
        let mut out = vec![0.0f32; block_samples];
        if fade_len > 0 && self.last_output_level != 0.0 {
            for (n, s) in out.iter_mut().take(fade_len).enumerate() {
                let frac = 1.0 - (n as f32 + 1.0) / fade_len as f32;
                *s = self.last_output_level * frac;
            }
        }
        out
    }

    /// Unweighted channel average: no steering direction available, so no
    /// delay compensation is applied (spec.md §4.5 "no lock" fallback).
    fn omni(&self, frame: &AudioFrame) -> Vec<f32> {
        let channels = frame.channels.max(1);
        let mut acc = vec![0.0f32; frame.block_samples];
        for ch in 0..channels {
            for (a, s) in acc.iter_mut().zip(frame.channel(ch)) {
                *a += s;
            }
        }
        let gain = 1.0 / channels as f32;
        for s in acc.iter_mut() {
            *s *= gain;
        }
        acc
    }

    fn stats(&self, frame: &AudioFrame, samples: &[f32], steered: bool) -> EnhancedAudioStats {
        let rms = rms_db(samples);
        let clipping_count = samples.iter().filter(|s| s.abs() >= CLIP_THRESHOLD).count() as u32;
        let suppression_db = if steered {
            let reference: Vec<f32> = frame.channel(0).collect();
            (rms_db(&reference) - rms).max(0.0)
        } else {
            0.0
        };
        EnhancedAudioStats { rms, clipping_count, suppression_db }
    }
}

/// Signed frequency in Hz for FFT bin `k` of a length-`len` transform: bins
/// past the midpoint represent negative frequencies. Using the signed value
/// keeps the per-bin rotation conjugate-symmetric, so the inverse transform
/// of a real input stays (numerically) real.
fn signed_freq_hz(k: usize, len: usize, sample_rate_hz: u32) -> f32 {
    let n = len as i64;
    let kk = k as i64;
    let signed_k = if kk <= n / 2 { kk } else { kk - n };
    signed_k as f32 * sample_rate_hz as f32 / len as f32
}

/// Same shape as `audio/meter.rs::rms_db` in the teacher: mean of squares,
/// floor the RMS before taking the log so silence doesn't produce `-inf`.
fn rms_db(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return METER_FLOOR_DB;
    }
    let energy: f32 = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
    let rms = energy.sqrt().max(1e-6);
    20.0 * rms.log10()
}
