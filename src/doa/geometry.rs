//! Array geometry helpers shared by the DOA estimator and the beamformer:
//! per-pair baseline vectors, expected inter-mic delay for a candidate
//! steering direction, and the collinearity check used to decide whether
//! SRP-PHAT has enough spatial information to run (spec.md §4.2 "Failure").

use crate::config::MicPosition;

/// Unit steering vector for azimuth `theta_deg`, in the array's local plane.
/// Azimuth increases counterclockwise from the positive x-axis; the mapping
/// to the camera-yaw-compensated global azimuth of spec.md §3 happens at the
/// config boundary (`array.camera_yaw_deg`), not here.
pub fn steering_unit_vector(theta_deg: f32) -> (f32, f32) {
    let rad = theta_deg.to_radians();
    (rad.cos(), rad.sin())
}

/// Expected delay in seconds for a wavefront arriving from `theta_deg` to
/// travel from mic `j` to mic `i`: `d_i = (r_i . u(theta)) / c` per spec.md
/// §4.5, generalized to the pairwise difference used by §4.2's cross-spectrum
/// steering sum.
pub fn pairwise_delay_s(mic_i: MicPosition, mic_j: MicPosition, theta_deg: f32, speed_of_sound_mps: f32) -> f32 {
    let (ux, uy) = steering_unit_vector(theta_deg);
    let dx = mic_i.x - mic_j.x;
    let dy = mic_i.y - mic_j.y;
    (dx * ux + dy * uy) / speed_of_sound_mps
}

/// Per-channel delay relative to the array's centroid, for beamform steering
/// (spec.md §4.5 step 1).
pub fn channel_delay_s(mic: MicPosition, theta_deg: f32, speed_of_sound_mps: f32) -> f32 {
    let (ux, uy) = steering_unit_vector(theta_deg);
    (mic.x * ux + mic.y * uy) / speed_of_sound_mps
}

/// `true` when the mic array has too little spatial information for a 2D
/// bearing estimate: fewer than two mics, or three-or-more mics that all lie
/// on one line. Mirrors `config::validation`'s scatter-matrix check (kept
/// independent here since this one runs on the DOA hot path against
/// whatever geometry the config carried, as a last-resort defensive check —
/// startup validation should already have rejected a degenerate config).
pub fn is_degenerate(mics: &[MicPosition]) -> bool {
    if mics.len() < 2 {
        return true;
    }
    if mics.len() == 2 {
        return false;
    }
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
    let trace = sxx + syy;
    let det = sxx * syy - sxy * sxy;
    let discriminant = (trace * trace - 4.0 * det).max(0.0).sqrt();
    let min_eigenvalue = (trace - discriminant) / 2.0;
    min_eigenvalue.abs() < 1e-9
}
