//! Damped nonlinear least squares (Levenberg-Marquardt) for the shape
//! fitters, solving the damped normal equations with a partially pivoted
//! LU factorization over `faer` matrices.

use faer::Mat;

const SINGULAR_PIVOT_EPSILON: f64 = 1.0e-15;
const LAMBDA_CEILING: f64 = 1.0e12;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    #[error("fit needs at least {needed} points to resolve {needed} parameters, got {actual}")]
    TooFewPoints { needed: usize, actual: usize },
    #[error("normal matrix is singular at pivot index {pivot_index}")]
    SingularNormalMatrix { pivot_index: usize },
    #[error("model produced a non-finite value during fitting")]
    NonFiniteModel,
    #[error("no convergence after {iterations} iterations")]
    NoConvergence { iterations: usize },
}

/// Parametric curve shape the solver refines.
///
/// `gradient` fills the partial derivatives of the model with respect to
/// each parameter at one abscissa. `clamp` projects a trial parameter vector
/// back into its admissible region after each step (bounded parameters such
/// as widths and exponents stay positive this way).
pub trait ShapeFunction {
    fn param_count(&self) -> usize;
    fn eval(&self, x: f64, params: &[f64]) -> f64;
    fn gradient(&self, x: f64, params: &[f64], out: &mut [f64]);
    fn clamp(&self, _params: &mut [f64]) {}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevMarOptions {
    pub max_iterations: usize,
    pub lambda_init: f64,
    pub lambda_up: f64,
    pub lambda_down: f64,
    pub step_tolerance: f64,
    pub cost_tolerance: f64,
}

impl Default for LevMarOptions {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            lambda_init: 1.0e-3,
            lambda_up: 10.0,
            lambda_down: 0.1,
            step_tolerance: 1.0e-12,
            cost_tolerance: 1.0e-14,
        }
    }
}

/// Refine `initial` so that `shape` matches `(x, y)` in the least-squares
/// sense. Returns the fitted parameter vector.
pub fn fit_curve(
    shape: &dyn ShapeFunction,
    x: &[f64],
    y: &[f64],
    initial: &[f64],
    options: &LevMarOptions,
) -> Result<Vec<f64>, FitError> {
    let param_count = shape.param_count();
    debug_assert_eq!(initial.len(), param_count);
    debug_assert_eq!(x.len(), y.len());
    if x.len() < param_count {
        return Err(FitError::TooFewPoints {
            needed: param_count,
            actual: x.len(),
        });
    }

    let mut params = initial.to_vec();
    shape.clamp(&mut params);
    let mut cost = residual_cost(shape, x, y, &params)?;
    let mut lambda = options.lambda_init;

    let mut jacobian_row = vec![0.0; param_count];
    for _iteration in 0..options.max_iterations {
        // Normal equations: (J^T J + lambda diag(J^T J)) delta = J^T r.
        let mut normal = Mat::<f64>::zeros(param_count, param_count);
        let mut gradient = vec![0.0; param_count];
        for (xi, yi) in x.iter().zip(y) {
            let model = shape.eval(*xi, &params);
            if !model.is_finite() {
                return Err(FitError::NonFiniteModel);
            }
            shape.gradient(*xi, &params, &mut jacobian_row);
            let residual = yi - model;
            for row in 0..param_count {
                gradient[row] += jacobian_row[row] * residual;
                for col in 0..param_count {
                    normal[(row, col)] += jacobian_row[row] * jacobian_row[col];
                }
            }
        }

        loop {
            let mut damped = normal.clone();
            for diagonal in 0..param_count {
                let scaled = normal[(diagonal, diagonal)] * lambda;
                damped[(diagonal, diagonal)] += scaled.max(lambda * 1.0e-12);
            }

            let delta = lu_solve(damped, &gradient)?;
            let mut trial = params.clone();
            for (value, step) in trial.iter_mut().zip(&delta) {
                *value += step;
            }
            shape.clamp(&mut trial);

            let trial_cost = residual_cost(shape, x, y, &trial)?;
            if trial_cost <= cost {
                let step_size = delta
                    .iter()
                    .zip(&params)
                    .map(|(step, value)| step.abs() / (value.abs() + 1.0e-12))
                    .fold(0.0, f64::max);
                let improvement = cost - trial_cost;
                params = trial;
                cost = trial_cost;
                lambda = (lambda * options.lambda_down).max(1.0e-12);

                if step_size < options.step_tolerance
                    || improvement <= options.cost_tolerance * cost.max(1.0)
                {
                    return Ok(params);
                }
                break;
            }

            lambda *= options.lambda_up;
            if lambda > LAMBDA_CEILING {
                // The surface no longer admits a descent step; treat the
                // current point as converged if the gradient is flat.
                let gradient_norm = gradient.iter().map(|g| g.abs()).fold(0.0, f64::max);
                if gradient_norm < 1.0e-10 * cost.max(1.0) {
                    return Ok(params);
                }
                return Err(FitError::NoConvergence {
                    iterations: options.max_iterations,
                });
            }
        }
    }

    Err(FitError::NoConvergence {
        iterations: options.max_iterations,
    })
}

fn residual_cost(
    shape: &dyn ShapeFunction,
    x: &[f64],
    y: &[f64],
    params: &[f64],
) -> Result<f64, FitError> {
    let mut cost = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let model = shape.eval(*xi, params);
        if !model.is_finite() {
            return Err(FitError::NonFiniteModel);
        }
        cost += (yi - model) * (yi - model);
    }
    Ok(cost)
}

/// Solve `matrix * solution = rhs` in place with partial pivoting.
fn lu_solve(mut matrix: Mat<f64>, rhs: &[f64]) -> Result<Vec<f64>, FitError> {
    let dimension = matrix.nrows();
    debug_assert_eq!(rhs.len(), dimension);

    let mut norm_infty: f64 = 0.0;
    for row in 0..dimension {
        let mut row_sum = 0.0;
        for col in 0..dimension {
            row_sum += matrix[(row, col)].abs();
        }
        norm_infty = norm_infty.max(row_sum);
    }

    let mut solution = rhs.to_vec();
    let mut pivots: Vec<usize> = (0..dimension).collect();

    for pivot_index in 0..dimension {
        let mut best_row = pivot_index;
        let mut best_value = matrix[(pivot_index, pivot_index)].abs();
        for row in (pivot_index + 1)..dimension {
            let candidate = matrix[(row, pivot_index)].abs();
            if candidate > best_value {
                best_value = candidate;
                best_row = row;
            }
        }
        if best_value <= SINGULAR_PIVOT_EPSILON * norm_infty.max(1.0) {
            return Err(FitError::SingularNormalMatrix { pivot_index });
        }
        if best_row != pivot_index {
            for col in 0..dimension {
                let held = matrix[(pivot_index, col)];
                matrix[(pivot_index, col)] = matrix[(best_row, col)];
                matrix[(best_row, col)] = held;
            }
            solution.swap(pivot_index, best_row);
            pivots.swap(pivot_index, best_row);
        }

        for row in (pivot_index + 1)..dimension {
            let factor = matrix[(row, pivot_index)] / matrix[(pivot_index, pivot_index)];
            matrix[(row, pivot_index)] = factor;
            for col in (pivot_index + 1)..dimension {
                let update = factor * matrix[(pivot_index, col)];
                matrix[(row, col)] -= update;
            }
            solution[row] -= factor * solution[pivot_index];
        }
    }

    for row in (0..dimension).rev() {
        for col in (row + 1)..dimension {
            solution[row] -= matrix[(row, col)] * solution[col];
        }
        solution[row] /= matrix[(row, row)];
    }

    Ok(solution)
}
