//! Scalar error metrics used to score every fit.

/// Root-mean-square difference between a reference and an estimate.
///
/// Both slices must have the same length; an empty input scores 0.
pub fn rms_error(reference: &[f64], estimate: &[f64]) -> f64 {
    debug_assert_eq!(reference.len(), estimate.len());
    if reference.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = reference
        .iter()
        .zip(estimate)
        .map(|(r, e)| (r - e) * (r - e))
        .sum();
    (sum_sq / reference.len() as f64).sqrt()
}

/// Largest relative deviation `|r - e| / |r|` over points with `r != 0`.
///
/// Zero-reference points carry no usable scale and are skipped; if every
/// reference point is zero the metric is 0.
pub fn max_relative_error(reference: &[f64], estimate: &[f64]) -> f64 {
    debug_assert_eq!(reference.len(), estimate.len());
    reference
        .iter()
        .zip(estimate)
        .filter(|(r, _)| **r != 0.0)
        .map(|(r, e)| ((r - e) / r).abs())
        .fold(0.0, f64::max)
}

/// Median of the absolute first differences of a profile, used as a local
/// dispersion estimate. Non-finite samples are ignored.
pub fn median_abs_diff(profile: &[f64]) -> Option<f64> {
    let mut diffs: Vec<f64> = profile
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).abs())
        .filter(|diff| diff.is_finite())
        .collect();
    if diffs.is_empty() {
        return None;
    }
    diffs.sort_by(|a, b| a.total_cmp(b));
    let mid = diffs.len() / 2;
    if diffs.len() % 2 == 0 {
        Some((diffs[mid - 1] + diffs[mid]) / 2.0)
    } else {
        Some(diffs[mid])
    }
}
