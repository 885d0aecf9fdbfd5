use crate::domain::LsfResult;
use crate::modules::image::DetectorImage;

/// Query surface over the wavelength-calibration and slitlet-geometry
/// tables, in detector pixel coordinates for the accessor's pose.
///
/// Implementations own the pose scaling: the oversampled pose maps a
/// detector pixel `p` to table coordinate `(p - 1) / 3` before querying and
/// maps boundary columns back through `c * 3 + 1`; the sampled pose is 1:1.
pub trait CalibrationAccessor {
    fn wavelength_at(&self, slice: usize, x: f64, y: f64) -> LsfResult<f64>;
    fn left_boundary(&self, slice: usize, y: f64) -> LsfResult<f64>;
    fn center_boundary(&self, slice: usize, y: f64) -> LsfResult<f64>;
    fn right_boundary(&self, slice: usize, y: f64) -> LsfResult<f64>;
}

/// Emission-line catalog for one spectral configuration.
pub trait LineCatalog {
    fn reference_wavelength(&self, line: usize) -> LsfResult<f64>;
    fn line_count(&self) -> usize;
}

/// Per-slice policy naming the inclusive range of usable catalog lines.
pub trait LineSelection {
    fn first_usable_line(&self, slice: usize) -> usize;
    fn last_usable_line(&self, slice: usize) -> usize;
}

/// Detector exposure planes for one (pose, config, detector) binding.
pub trait ImageSource {
    fn arc_image(&self) -> LsfResult<DetectorImage>;
    fn flat_image(&self) -> LsfResult<DetectorImage>;
}
