//! Range and cross-field validation for [`super::FocusFieldConfig`],
//! mirroring the teacher's `config/validation.rs`: one `validate()` method,
//! each failure raised as a specific, matchable [`crate::error::ConfigError`]
//! variant instead of a generic `anyhow::bail!` string.

use super::FocusFieldConfig;
use crate::error::ConfigError;

fn out_of_range(field: &'static str, constraint: impl Into<String>, got: impl std::fmt::Display) -> ConfigError {
    ConfigError::OutOfRange { field, constraint: constraint.into(), got: got.to_string() }
}

impl FocusFieldConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_array()?;
        self.validate_doa()?;
        self.validate_fusion()?;
        self.validate_lock()?;
        self.validate_beamform()?;
        self.validate_bus()?;
        self.validate_health()?;

        if self.shutdown_deadline_ms == 0 {
            return Err(out_of_range("shutdown_deadline_ms", "> 0", self.shutdown_deadline_ms));
        }
        Ok(())
    }

    fn validate_array(&self) -> Result<(), ConfigError> {
        let mics = &self.array.mic_positions_m;
        if mics.len() < 2 {
            return Err(ConfigError::DegenerateGeometry);
        }

        // Degenerate if every mic shares the same x (or same y) coordinate:
        // a single-axis array gives SRP-PHAT no usable phase difference in
        // the orthogonal direction, and a perfectly collinear array on a
        // non-axis-aligned line reduces to the same rank-deficient geometry
        // one projects onto its own axis — check variance along the array's
        // own principal direction instead of raw x/y to catch both.
        let mean_x = mics.iter().map(|m| m.x).sum::<f32>() / mics.len() as f32;
        let mean_y = mics.iter().map(|m| m.y).sum::<f32>() / mics.len() as f32;
        let mut sxx = 0.0f32;
        let mut sxy = 0.0f32;
        let mut syy = 0.0f32;
        for m in mics {
            let dx = m.x - mean_x;
            let dy = m.y - mean_y;
            sxx += dx * dx;
            sxy += dx * dy;
            syy += dy * dy;
        }
        // Smaller eigenvalue of the 2x2 scatter matrix; near zero means the
        // mics lie on (or very near) a single line.
        let trace = sxx + syy;
        let det = sxx * syy - sxy * sxy;
        let discriminant = (trace * trace - 4.0 * det).max(0.0).sqrt();
        let min_eigenvalue = (trace - discriminant) / 2.0;
        // A 2-mic array is inherently collinear (one baseline); that's a
        // supported minimal-rank configuration, not a fault. Flag only when
        // 3+ mics were meant to give 2D bearing information but don't.
        if mics.len() >= 3 && min_eigenvalue.abs() < 1e-9 {
            return Err(ConfigError::DegenerateGeometry);
        }

        if !(self.array.speed_of_sound_mps > 0.0) {
            return Err(out_of_range("array.speed_of_sound_mps", "> 0", self.array.speed_of_sound_mps));
        }
        Ok(())
    }

    fn validate_doa(&self) -> Result<(), ConfigError> {
        let d = &self.doa;
        if !(0.0..360.0).contains(&d.bin_size_deg) {
            return Err(out_of_range("doa.bin_size_deg", "in (0, 360)", d.bin_size_deg));
        }
        if (360.0 / d.bin_size_deg).round() < 1.0 {
            return Err(out_of_range("doa.bin_size_deg", "divide 360 into at least one bin", d.bin_size_deg));
        }
        if !(d.update_hz > 0.0) {
            return Err(out_of_range("doa.update_hz", "> 0", d.update_hz));
        }
        if d.freq_band_hz.lo_hz < 0.0 || d.freq_band_hz.lo_hz >= d.freq_band_hz.hi_hz {
            return Err(ConfigError::Inconsistent {
                field: "doa.freq_band_hz",
                detail: format!("lo_hz ({}) must be >= 0 and < hi_hz ({})", d.freq_band_hz.lo_hz, d.freq_band_hz.hi_hz),
            });
        }
        if !(0.0..=1.0).contains(&d.smoothing_alpha) {
            return Err(out_of_range("doa.smoothing_alpha", "in [0, 1]", d.smoothing_alpha));
        }
        if d.top_k_peaks == 0 {
            return Err(out_of_range("doa.top_k_peaks", ">= 1", d.top_k_peaks));
        }
        if !(0.0..=1.0).contains(&d.low_confidence_factor) {
            return Err(out_of_range("doa.low_confidence_factor", "in [0, 1]", d.low_confidence_factor));
        }
        Ok(())
    }

    fn validate_fusion(&self) -> Result<(), ConfigError> {
        let f = &self.fusion;
        if !(0.0..=180.0).contains(&f.max_assoc_deg) {
            return Err(out_of_range("fusion.max_assoc_deg", "in [0, 180]", f.max_assoc_deg));
        }
        let w = &f.weights;
        if w.mouth < 0.0 || w.face < 0.0 || w.doa < 0.0 {
            return Err(ConfigError::Inconsistent {
                field: "fusion.weights",
                detail: "component weights must be non-negative".to_string(),
            });
        }
        let sum = w.mouth + w.face + w.doa;
        if (sum - 1.0).abs() > 1e-3 {
            return Err(ConfigError::Inconsistent {
                field: "fusion.weights",
                detail: format!("mouth + face + doa must sum to 1.0, got {sum}"),
            });
        }
        if f.faces_max_age_ms == 0 {
            return Err(out_of_range("fusion.faces_max_age_ms", "> 0", f.faces_max_age_ms));
        }
        if !(f.update_hz > 0.0) {
            return Err(out_of_range("fusion.update_hz", "> 0", f.update_hz));
        }
        Ok(())
    }

    fn validate_lock(&self) -> Result<(), ConfigError> {
        let l = &self.lock;
        if !(0.0..=1.0).contains(&l.acquire_threshold) {
            return Err(out_of_range("lock.acquire_threshold", "in [0, 1]", l.acquire_threshold));
        }
        if !(0.0..=1.0).contains(&l.drop_threshold) {
            return Err(out_of_range("lock.drop_threshold", "in [0, 1]", l.drop_threshold));
        }
        if l.drop_threshold >= l.acquire_threshold {
            return Err(ConfigError::Inconsistent {
                field: "lock.drop_threshold",
                detail: format!(
                    "must be < lock.acquire_threshold ({}) to provide hysteresis, got {}",
                    l.acquire_threshold, l.drop_threshold
                ),
            });
        }
        if l.acquire_dwell_ms == 0 {
            return Err(out_of_range("lock.acquire_dwell_ms", "> 0", l.acquire_dwell_ms));
        }
        if l.hold_ms == 0 {
            return Err(out_of_range("lock.hold_ms", "> 0", l.hold_ms));
        }
        if l.handoff_min_ms == 0 {
            return Err(out_of_range("lock.handoff_min_ms", "> 0", l.handoff_min_ms));
        }
        if !(0.0..=1.0).contains(&l.handoff_margin) {
            return Err(out_of_range("lock.handoff_margin", "in [0, 1]", l.handoff_margin));
        }
        if !(0.0..=1.0).contains(&l.speaking_on_mouth_activity) {
            return Err(out_of_range("lock.speaking_on_mouth_activity", "in [0, 1]", l.speaking_on_mouth_activity));
        }
        Ok(())
    }

    fn validate_beamform(&self) -> Result<(), ConfigError> {
        let b = &self.beamform;
        if b.use_last_lock_ms == 0 {
            return Err(out_of_range("beamform.use_last_lock_ms", "> 0", b.use_last_lock_ms));
        }
        if b.latency_budget_ms == 0 {
            return Err(out_of_range("beamform.latency_budget_ms", "> 0", b.latency_budget_ms));
        }
        Ok(())
    }

    fn validate_bus(&self) -> Result<(), ConfigError> {
        if self.bus.default_capacity == 0 {
            return Err(out_of_range("bus.default_capacity", ">= 1", self.bus.default_capacity));
        }
        Ok(())
    }

    fn validate_health(&self) -> Result<(), ConfigError> {
        let h = &self.health;
        if h.staleness_yellow_ms == 0 {
            return Err(out_of_range("health.staleness_yellow_ms", "> 0", h.staleness_yellow_ms));
        }
        if h.staleness_red_ms <= h.staleness_yellow_ms {
            return Err(ConfigError::Inconsistent {
                field: "health.staleness_red_ms",
                detail: format!(
                    "must be > health.staleness_yellow_ms ({}), got {}",
                    h.staleness_yellow_ms, h.staleness_red_ms
                ),
            });
        }
        if !(h.publish_hz > 0.0 && h.publish_hz <= 2.0) {
            return Err(out_of_range("health.publish_hz", "in (0, 2] (spec.md §4.6 slow cadence)", h.publish_hz));
        }
        Ok(())
    }
}
