//! Shape fitters: nonlinear Gaussian and Moffat fits over one extracted
//! line window.

mod gaussian;
mod moffat;

pub use gaussian::{fit_gaussian, gaussian_profile};
pub use moffat::{fit_moffat, moffat_profile};

use crate::domain::{FitResult, LineWindow, LsfError, LsfResult, ShapeKind};

/// Fit the configured shape to a window's (offset, intensity) samples.
pub fn fit_window(kind: ShapeKind, window: &LineWindow) -> LsfResult<FitResult> {
    if window.is_empty() {
        return Err(LsfError::empty_window(
            "FIT.EMPTY_WINDOW",
            format!(
                "cannot fit line {} on slice {}: window has no retained pixels",
                window.line(),
                window.slice()
            ),
        ));
    }
    let offsets = window.offsets();
    match kind {
        ShapeKind::Gaussian => fit_gaussian(&offsets, window.intensities()),
        ShapeKind::Moffat => fit_moffat(&offsets, window.intensities()),
    }
}

/// (offset, intensity) pairs sorted ascending by offset.
pub(super) fn sorted_pairs(offsets: &[f64], intensities: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut order: Vec<usize> = (0..offsets.len()).collect();
    order.sort_by(|a, b| offsets[*a].total_cmp(&offsets[*b]));
    let sorted_offsets = order.iter().map(|index| offsets[*index]).collect();
    let sorted_intensities = order.iter().map(|index| intensities[*index]).collect();
    (sorted_offsets, sorted_intensities)
}

/// Data-driven starting point shared by both fitters: the peak position and
/// height come from the argmax sample, the width from the half-maximum
/// crossing nearest the peak.
#[derive(Debug, Clone, Copy)]
pub(super) struct PeakGuess {
    pub center: f64,
    pub height: f64,
    pub half_width: f64,
}

pub(super) fn peak_guess(offsets: &[f64], intensities: &[f64]) -> PeakGuess {
    debug_assert!(!offsets.is_empty());
    let mut peak_index = 0;
    for (index, value) in intensities.iter().enumerate() {
        if *value > intensities[peak_index] {
            peak_index = index;
        }
    }
    let center = offsets[peak_index];
    let height = intensities[peak_index];
    let half = height / 2.0;

    let mut half_width = f64::INFINITY;
    for index in (peak_index + 1)..offsets.len() {
        if intensities[index] <= half {
            half_width = offsets[index] - center;
            break;
        }
    }
    for index in (0..peak_index).rev() {
        if intensities[index] <= half {
            half_width = half_width.min(center - offsets[index]);
            break;
        }
    }
    if !half_width.is_finite() {
        let span = offsets[offsets.len() - 1] - offsets[0];
        half_width = span / 4.0;
    }

    PeakGuess {
        center,
        height,
        half_width: half_width.max(1.0e-12),
    }
}
