pub mod leastsq;
pub mod metrics;
pub mod regression;

pub use leastsq::{FitError, LevMarOptions, ShapeFunction, fit_curve};
pub use metrics::{max_relative_error, median_abs_diff, rms_error};
pub use regression::{RegressionError, linear_fit};
