//! Line-spread-function extraction and parameterization for multi-detector
//! spectrograph calibration exposures.
//!
//! The pipeline locates a catalog emission line on one detector slice, cuts
//! out its local sample window, fits a parametric LSF shape (Gaussian or
//! Moffat) to the window, repeats over the usable catalog-line range, and
//! linearizes every shape parameter as an affine function of wavelength.

pub mod domain;
pub mod modules;
pub mod numerics;
