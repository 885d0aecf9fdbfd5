use crate::domain::{LsfError, LsfResult, Pose};
use crate::modules::traits::CalibrationAccessor;
use serde::Deserialize;

/// 2-D polynomial wavelength surface for one slice:
/// `lambda(x, y) = sum c[i][j] * x^i * y^j` in table coordinates.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PolySurface {
    pub coefficients: Vec<Vec<f64>>,
}

impl PolySurface {
    pub fn evaluate(&self, x: f64, y: f64) -> f64 {
        let mut value = 0.0;
        let mut x_power = 1.0;
        for row in &self.coefficients {
            let mut y_power = 1.0;
            for coefficient in row {
                value += coefficient * x_power * y_power;
                y_power *= y;
            }
            x_power *= x;
        }
        value
    }
}

/// 1-D polynomial in `y`, lowest order first.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct PolyLine {
    pub coefficients: Vec<f64>,
}

impl PolyLine {
    pub fn evaluate(&self, y: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, coefficient| acc * y + coefficient)
    }
}

/// Wavelength-calibration table for one (config, detector) pair: one
/// polynomial surface per slice, indexed by slice number.
#[derive(Debug, Clone, PartialEq)]
pub struct WavecalTable {
    slices: Vec<PolySurface>,
}

impl WavecalTable {
    pub fn new(slices: Vec<PolySurface>) -> Self {
        Self { slices }
    }

    pub fn slice_count(&self) -> usize {
        self.slices.len()
    }

    pub fn wavelength(&self, slice: usize, x: f64, y: f64) -> LsfResult<f64> {
        let surface = self.slices.get(slice).ok_or_else(|| {
            LsfError::input_validation(
                "CALIB.WAVECAL_SLICE",
                format!(
                    "wavelength table covers {} slices, slice {} requested",
                    self.slices.len(),
                    slice
                ),
            )
        })?;
        Ok(surface.evaluate(x, y))
    }
}

/// Per-slice slitlet geometry: left/center/right pixel-column boundaries as
/// polynomials in the table row coordinate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SlitletBounds {
    pub left: PolyLine,
    pub center: PolyLine,
    pub right: PolyLine,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlitletTable {
    slices: Vec<SlitletBounds>,
}

impl SlitletTable {
    pub fn new(slices: Vec<SlitletBounds>) -> Self {
        Self { slices }
    }

    pub fn slice_count(&self) -> usize {
        self.slices.len()
    }

    fn bounds(&self, slice: usize) -> LsfResult<&SlitletBounds> {
        self.slices.get(slice).ok_or_else(|| {
            LsfError::input_validation(
                "CALIB.SLITLET_SLICE",
                format!(
                    "slitlet table covers {} slices, slice {} requested",
                    self.slices.len(),
                    slice
                ),
            )
        })
    }

    pub fn left(&self, slice: usize, y: f64) -> LsfResult<f64> {
        Ok(self.bounds(slice)?.left.evaluate(y))
    }

    pub fn center(&self, slice: usize, y: f64) -> LsfResult<f64> {
        Ok(self.bounds(slice)?.center.evaluate(y))
    }

    pub fn right(&self, slice: usize, y: f64) -> LsfResult<f64> {
        Ok(self.bounds(slice)?.right.evaluate(y))
    }
}

/// Pose-aware view over both calibration tables, implementing the detector
/// pixel-space query contract.
#[derive(Debug, Clone)]
pub struct PoseCalibration {
    pose: Pose,
    wavecal: WavecalTable,
    slitlet: SlitletTable,
}

impl PoseCalibration {
    pub fn new(pose: Pose, wavecal: WavecalTable, slitlet: SlitletTable) -> Self {
        Self {
            pose,
            wavecal,
            slitlet,
        }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }
}

impl CalibrationAccessor for PoseCalibration {
    fn wavelength_at(&self, slice: usize, x: f64, y: f64) -> LsfResult<f64> {
        self.wavecal.wavelength(
            slice,
            self.pose.pixel_to_table(x),
            self.pose.pixel_to_table(y),
        )
    }

    fn left_boundary(&self, slice: usize, y: f64) -> LsfResult<f64> {
        let column = self.slitlet.left(slice, self.pose.pixel_to_table(y))?;
        Ok(self.pose.table_to_pixel(column))
    }

    fn center_boundary(&self, slice: usize, y: f64) -> LsfResult<f64> {
        let column = self.slitlet.center(slice, self.pose.pixel_to_table(y))?;
        Ok(self.pose.table_to_pixel(column))
    }

    fn right_boundary(&self, slice: usize, y: f64) -> LsfResult<f64> {
        let column = self.slitlet.right(slice, self.pose.pixel_to_table(y))?;
        Ok(self.pose.table_to_pixel(column))
    }
}
