//! Per-channel FFT and PHAT-whitened cross-spectrum computation
//! (spec.md §4.2 steps 1-2), grounded on the `FftPlanner::<f32>` +
//! `Complex::new` + Hann-window-then-`fft.process` pattern used for
//! real-time spectral analysis in the reference corpus
//! (`KSattaluri-MangoChat/src/audio.rs`).

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Precomputed Hann window, cached per FFT length the same way the DOA
/// engine caches its FFT plan: windows are deterministic given only
/// `len`, so there is no reason to recompute per block.
pub(crate) fn hann_window(len: usize) -> Vec<f32> {
    if len <= 1 {
        return vec![1.0; len];
    }
    (0..len)
        .map(|n| {
            let x = (std::f32::consts::PI * n as f32 / (len - 1) as f32).sin();
            x * x
        })
        .collect()
}

/// Owns one forward FFT plan and reuses it across blocks, following
/// `FftPlanner::<f32>::plan_fft_forward` planned once at construction
/// (SPEC_FULL.md §4.2 "[ADDED detail]").
pub(crate) struct SpectrumAnalyzer {
    len: usize,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
}

impl SpectrumAnalyzer {
    pub(crate) fn new(len: usize) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        Self {
            len,
            window: hann_window(len),
            fft: planner.plan_fft_forward(len),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Window `samples` (truncated/zero-padded to `self.len`) and return its
    /// forward FFT. Only bins `0..=len/2` are meaningful for a real input
    /// (the upper half is the conjugate mirror); callers index by frequency
    /// via [`bin_for_freq`].
    pub(crate) fn transform(&self, samples: &[f32]) -> Vec<Complex<f32>> {
        let mut buf: Vec<Complex<f32>> = (0..self.len)
            .map(|i| {
                let s = samples.get(i).copied().unwrap_or(0.0);
                let w = self.window.get(i).copied().unwrap_or(1.0);
                Complex::new(s * w, 0.0)
            })
            .collect();
        self.fft.process(&mut buf);
        buf
    }
}

/// Map a frequency in Hz to the nearest FFT bin index for a transform of
/// length `fft_len` at `sample_rate_hz`.
pub(crate) fn bin_for_freq(freq_hz: f32, sample_rate_hz: u32, fft_len: usize) -> usize {
    let bin = (freq_hz * fft_len as f32 / sample_rate_hz as f32).round();
    (bin.max(0.0) as usize).min(fft_len / 2)
}

/// PHAT-whitened cross-spectrum: `G_ij(f) = X_i(f) * conj(X_j(f)) /
/// (|X_i(f) * conj(X_j(f))| + eps)` (spec.md §4.2 step 2). Keeps only phase
/// information, which is what makes SRP-PHAT robust to differing channel
/// gains and to wideband noise.
pub(crate) fn phat_whiten(xi: Complex<f32>, xj: Complex<f32>, eps: f32) -> Complex<f32> {
    let cross = xi * xj.conj();
    cross / (cross.norm() + eps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hann_window_is_zero_at_the_edges() {
        let w = hann_window(8);
        assert!(w[0] < 1e-6);
        assert!(w[7] < 1e-6);
        assert!(w[4] > 0.9);
    }

    #[test]
    fn bin_for_freq_maps_nyquist_to_half_length() {
        let bin = bin_for_freq(8_000.0, 16_000, 256);
        assert_eq!(bin, 128);
    }

    #[test]
    fn phat_whiten_preserves_phase_normalizes_magnitude() {
        let xi = Complex::new(3.0, 4.0);
        let xj = Complex::new(1.0, 0.0);
        let g = phat_whiten(xi, xj, 1e-9);
        assert!((g.norm() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn transform_of_dc_signal_has_energy_in_bin_zero() {
        let analyzer = SpectrumAnalyzer::new(16);
        let samples = vec![1.0f32; 16];
        let spectrum = analyzer.transform(&samples);
        // Windowed DC still concentrates most energy at bin 0 relative to
        // the upper bins.
        assert!(spectrum[0].norm() > spectrum[8].norm());
    }
}
