use super::{peak_guess, sorted_pairs};
use crate::domain::{FitResult, LsfError, LsfResult};
use crate::numerics::{LevMarOptions, ShapeFunction, fit_curve, max_relative_error, rms_error};
use std::collections::BTreeMap;

const SIGMA_FLOOR: f64 = 1.0e-12;
const BETA_RANGE: (f64, f64) = (1.0e-3, 1.0e3);

/// Moffat profile: `A * (((x - mu) / sigma)^2 + 1)^(-beta)`.
pub fn moffat_profile(x: f64, amplitude: f64, center: f64, sigma: f64, beta: f64) -> f64 {
    let reduced = (x - center) / sigma;
    amplitude * (reduced * reduced + 1.0).powf(-beta)
}

struct MoffatShape;

impl ShapeFunction for MoffatShape {
    fn param_count(&self) -> usize {
        4
    }

    fn eval(&self, x: f64, params: &[f64]) -> f64 {
        moffat_profile(x, params[0], params[1], params[2], params[3])
    }

    fn gradient(&self, x: f64, params: &[f64], out: &mut [f64]) {
        let (amplitude, center, sigma, beta) = (params[0], params[1], params[2], params[3]);
        let reduced = (x - center) / sigma;
        let base = reduced * reduced + 1.0;
        let envelope = base.powf(-beta);
        let inner = base.powf(-beta - 1.0);
        out[0] = envelope;
        out[1] = 2.0 * amplitude * beta * reduced / sigma * inner;
        out[2] = 2.0 * amplitude * beta * reduced * reduced / sigma * inner;
        out[3] = -amplitude * base.ln() * envelope;
    }

    fn clamp(&self, params: &mut [f64]) {
        // Bounded solve by projection: width and exponent stay positive.
        params[2] = params[2].abs().max(SIGMA_FLOOR);
        params[3] = params[3].clamp(BETA_RANGE.0, BETA_RANGE.1);
    }
}

/// Fit the Moffat LSF shape to (wavelength-offset, intensity) samples.
pub fn fit_moffat(offsets: &[f64], intensities: &[f64]) -> LsfResult<FitResult> {
    let (offsets, observed) = sorted_pairs(offsets, intensities);
    if offsets.len() < 4 {
        return Err(LsfError::fit_convergence(
            "FIT.MOFFAT_POINTS",
            format!(
                "Moffat fit needs at least 4 points to resolve 4 parameters, got {}",
                offsets.len()
            ),
        ));
    }

    let guess = peak_guess(&offsets, &observed);
    // At beta = 1 the half maximum sits at |reduced| = 1, so the half-width
    // is the starting sigma.
    let initial = [guess.height, guess.center, guess.half_width, 1.0];

    let params = fit_curve(
        &MoffatShape,
        &offsets,
        &observed,
        &initial,
        &LevMarOptions::default(),
    )
    .map_err(|source| {
        LsfError::fit_convergence("FIT.MOFFAT", format!("Moffat fit failed: {source}"))
    })?;

    let fitted: Vec<f64> = offsets
        .iter()
        .map(|x| moffat_profile(*x, params[0], params[1], params[2], params[3]))
        .collect();
    let rms = rms_error(&observed, &fitted);
    let max_relative = max_relative_error(&observed, &fitted);

    let mut parameters = BTreeMap::new();
    parameters.insert("amplitude".to_string(), params[0]);
    parameters.insert("center".to_string(), params[1]);
    parameters.insert("sigma".to_string(), params[2].abs());
    parameters.insert("beta".to_string(), params[3]);

    Ok(FitResult {
        offsets,
        fitted,
        parameters,
        rms_error: rms,
        max_relative_error: max_relative,
    })
}
