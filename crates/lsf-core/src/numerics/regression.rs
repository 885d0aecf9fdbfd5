//! Ordinary least squares for the linear-parameterization stage.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegressionError {
    #[error("abscissa and ordinate lengths differ: {abscissa} vs {ordinate}")]
    LengthMismatch { abscissa: usize, ordinate: usize },
    #[error("linear fit needs at least 2 points, got {actual}")]
    TooFewPoints { actual: usize },
    #[error("abscissa values are degenerate, slope is undefined")]
    DegenerateAbscissa,
}

/// OLS slope and intercept of `y` against `x`.
pub fn linear_fit(x: &[f64], y: &[f64]) -> Result<(f64, f64), RegressionError> {
    if x.len() != y.len() {
        return Err(RegressionError::LengthMismatch {
            abscissa: x.len(),
            ordinate: y.len(),
        });
    }
    if x.len() < 2 {
        return Err(RegressionError::TooFewPoints { actual: x.len() });
    }

    let count = x.len() as f64;
    let mean_x: f64 = x.iter().sum::<f64>() / count;
    let mean_y: f64 = y.iter().sum::<f64>() / count;

    let mut covariance = 0.0;
    let mut variance = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        covariance += (xi - mean_x) * (yi - mean_y);
        variance += (xi - mean_x) * (xi - mean_x);
    }

    if variance <= f64::EPSILON * mean_x.abs().max(1.0) {
        return Err(RegressionError::DegenerateAbscissa);
    }

    let slope = covariance / variance;
    let intercept = mean_y - slope * mean_x;
    Ok((slope, intercept))
}
