//! Top-K peak picking over a circular (wraparound) azimuth heatmap
//! (spec.md §4.2 step 6).

use crate::model::DoaPeak;

/// Local maxima in `scores` (one value per `bin_size_deg`-wide bin, covering
/// the full circle), keeping at most `top_k` peaks with a minimum angular
/// separation of `min_sep_deg`. Ties break by higher raw score, then by
/// smaller angle.
pub(super) fn pick_peaks(scores: &[f32], bin_size_deg: f32, top_k: usize, min_sep_deg: f32) -> Vec<DoaPeak> {
    let n = scores.len();
    if n == 0 || top_k == 0 {
        return Vec::new();
    }

    let mut candidates: Vec<(usize, f32)> = (0..n)
        .filter(|&i| {
            let prev = scores[(i + n - 1) % n];
            let next = scores[(i + 1) % n];
            scores[i] >= prev && scores[i] >= next
        })
        .map(|i| (i, scores[i]))
        .collect();

    // Higher score first; smaller angle (bin index) breaks ties, per
    // spec.md §4.2 step 6.
    candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0)));

    let min_sep_bins = (min_sep_deg / bin_size_deg).ceil().max(0.0) as usize;
    let mut chosen: Vec<(usize, f32)> = Vec::with_capacity(top_k);
    for (bin, score) in candidates {
        let too_close = chosen.iter().any(|&(chosen_bin, _)| circular_distance(bin, chosen_bin, n) < min_sep_bins);
        if too_close {
            continue;
        }
        chosen.push((bin, score));
        if chosen.len() == top_k {
            break;
        }
    }

    chosen
        .into_iter()
        .map(|(bin, score)| DoaPeak { angle_deg: bin as f32 * bin_size_deg, score })
        .collect()
}

fn circular_distance(a: usize, b: usize, n: usize) -> usize {
    let diff = if a > b { a - b } else { b - a };
    diff.min(n - diff)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_single_isolated_peak() {
        let mut scores = vec![0.1; 180];
        scores[45] = 1.0;
        let peaks = pick_peaks(&scores, 2.0, 3, 10.0);
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].angle_deg, 90.0);
    }

    #[test]
    fn enforces_minimum_angular_separation() {
        let mut scores = vec![0.1; 180];
        scores[45] = 1.0;
        scores[46] = 0.9; // 2 deg away from the first peak, below 10 deg min.
        let peaks = pick_peaks(&scores, 2.0, 3, 10.0);
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].angle_deg, 90.0);
    }

    #[test]
    fn respects_top_k_limit() {
        let mut scores = vec![0.1; 36];
        for i in (0..36).step_by(6) {
            scores[i] = 0.5 + i as f32 * 0.001;
        }
        let peaks = pick_peaks(&scores, 10.0, 2, 10.0);
        assert_eq!(peaks.len(), 2);
    }

    #[test]
    fn wraps_around_the_circle_boundary() {
        let mut scores = vec![0.1; 180];
        scores[0] = 1.0;
        scores[179] = 0.95; // adjacent across the wrap, within min separation.
        let peaks = pick_peaks(&scores, 2.0, 3, 10.0);
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].angle_deg, 0.0);
    }

    #[test]
    fn empty_scores_yields_no_peaks() {
        assert!(pick_peaks(&[], 2.0, 3, 10.0).is_empty());
    }
}
