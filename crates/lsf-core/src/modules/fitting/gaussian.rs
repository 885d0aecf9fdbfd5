use super::{peak_guess, sorted_pairs};
use crate::domain::{FitResult, LsfError, LsfResult};
use crate::numerics::{LevMarOptions, ShapeFunction, fit_curve, max_relative_error, rms_error};
use std::collections::BTreeMap;

const SQRT_2PI: f64 = 2.506_628_274_631_000_5;
const SQRT_2LN2: f64 = 1.177_410_022_515_474_6;

/// Area-normalized Gaussian:
/// `A * (1 / (sigma * sqrt(2 pi))) * exp(-0.5 * ((x - mu) / sigma)^2)`.
pub fn gaussian_profile(x: f64, amplitude: f64, mean: f64, sigma: f64) -> f64 {
    let reduced = (x - mean) / sigma;
    amplitude / (sigma * SQRT_2PI) * (-0.5 * reduced * reduced).exp()
}

struct GaussianShape;

impl ShapeFunction for GaussianShape {
    fn param_count(&self) -> usize {
        3
    }

    fn eval(&self, x: f64, params: &[f64]) -> f64 {
        gaussian_profile(x, params[0], params[1], params[2])
    }

    fn gradient(&self, x: f64, params: &[f64], out: &mut [f64]) {
        let (amplitude, mean, sigma) = (params[0], params[1], params[2]);
        let reduced = (x - mean) / sigma;
        let kernel = (-0.5 * reduced * reduced).exp() / (sigma * SQRT_2PI);
        out[0] = kernel;
        out[1] = amplitude * kernel * reduced / sigma;
        out[2] = amplitude * kernel * (reduced * reduced - 1.0) / sigma;
    }

    fn clamp(&self, params: &mut [f64]) {
        // The profile is even in sigma; keep the solver on the positive
        // branch.
        params[2] = params[2].abs().max(1.0e-12);
    }
}

/// Fit the Gaussian LSF shape to (wavelength-offset, intensity) samples.
///
/// Samples are sorted ascending by offset before fitting; errors are scored
/// against the sorted observed intensities.
pub fn fit_gaussian(offsets: &[f64], intensities: &[f64]) -> LsfResult<FitResult> {
    let (offsets, observed) = sorted_pairs(offsets, intensities);
    if offsets.len() < 3 {
        return Err(LsfError::fit_convergence(
            "FIT.GAUSSIAN_POINTS",
            format!(
                "Gaussian fit needs at least 3 points to resolve 3 parameters, got {}",
                offsets.len()
            ),
        ));
    }

    let guess = peak_guess(&offsets, &observed);
    let sigma0 = (guess.half_width / SQRT_2LN2).max(1.0e-12);
    let initial = [guess.height * sigma0 * SQRT_2PI, guess.center, sigma0];

    let params = fit_curve(
        &GaussianShape,
        &offsets,
        &observed,
        &initial,
        &LevMarOptions::default(),
    )
    .map_err(|source| {
        LsfError::fit_convergence("FIT.GAUSSIAN", format!("Gaussian fit failed: {source}"))
    })?;

    let fitted: Vec<f64> = offsets
        .iter()
        .map(|x| gaussian_profile(*x, params[0], params[1], params[2]))
        .collect();
    let rms = rms_error(&observed, &fitted);
    let max_relative = max_relative_error(&observed, &fitted);

    let mut parameters = BTreeMap::new();
    parameters.insert("Amplitude".to_string(), params[0]);
    parameters.insert("Mean".to_string(), params[1]);
    parameters.insert("Sigma".to_string(), params[2].abs());

    Ok(FitResult {
        offsets,
        fitted,
        parameters,
        rms_error: rms,
        max_relative_error: max_relative,
    })
}
