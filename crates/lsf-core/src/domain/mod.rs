pub mod errors;

pub use errors::{LsfError, LsfErrorCategory, LsfResult};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Sampling mode of a calibration exposure.
///
/// The oversampled pose carries 3x the detector sampling; detector pixel `p`
/// maps to calibration-table coordinate `(p - 1) / 3` and table columns map
/// back through `c * 3 + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pose {
    #[default]
    Sampled,
    Oversampled,
}

impl Pose {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sampled => "sampled",
            Self::Oversampled => "oversampled",
        }
    }

    pub const fn oversampling_factor(self) -> f64 {
        match self {
            Self::Sampled => 1.0,
            Self::Oversampled => 3.0,
        }
    }

    /// Row padding and dispersion-mask multiplier for window extraction.
    pub const fn window_margin(self) -> usize {
        match self {
            Self::Sampled => 4,
            Self::Oversampled => 12,
        }
    }

    /// Detector pixel index to calibration-table coordinate.
    pub fn pixel_to_table(self, pixel: f64) -> f64 {
        match self {
            Self::Sampled => pixel,
            Self::Oversampled => (pixel - 1.0) / 3.0,
        }
    }

    /// Calibration-table coordinate back to detector pixel index.
    pub fn table_to_pixel(self, table: f64) -> f64 {
        match self {
            Self::Sampled => table,
            Self::Oversampled => table * 3.0 + 1.0,
        }
    }
}

impl Display for Pose {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for Pose {
    type Err = LsfError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "sampled" => Ok(Self::Sampled),
            "oversampled" => Ok(Self::Oversampled),
            other => Err(LsfError::input_validation(
                "INPUT.POSE",
                format!("unknown pose '{other}', expected 'sampled' or 'oversampled'"),
            )),
        }
    }
}

/// LSF shape family fitted to each extracted window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Gaussian,
    Moffat,
}

impl ShapeKind {
    /// Discriminator tag stored in persisted model records.
    pub const fn record_tag(self) -> &'static str {
        match self {
            Self::Gaussian => "GAUSSIAN_MODEL",
            Self::Moffat => "MOFFAT_MODEL",
        }
    }

    pub fn from_record_tag(tag: &str) -> LsfResult<Self> {
        match tag {
            "GAUSSIAN_MODEL" => Ok(Self::Gaussian),
            "MOFFAT_MODEL" => Ok(Self::Moffat),
            other => Err(LsfError::incompatible_model(
                "MODEL.RECORD_TAG",
                format!("unknown model record tag '{other}'"),
            )),
        }
    }

    /// Shape-parameter names, in the order the fitters report them.
    pub const fn parameter_names(self) -> &'static [&'static str] {
        match self {
            Self::Gaussian => &["Amplitude", "Mean", "Sigma"],
            Self::Moffat => &["amplitude", "center", "sigma", "beta"],
        }
    }
}

impl Display for ShapeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.record_tag())
    }
}

/// Immutable configuration of one per-slice, per-detector LSF model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub shape: ShapeKind,
    pub pose: Pose,
    /// Spectral configuration tag (instrument band, e.g. "H", "HK", "Hhigh").
    pub config: String,
    pub slice: usize,
    pub det_id: u32,
    /// Catalog line used for single-line diagnostics.
    pub nb_line: usize,
    pub normal: bool,
    pub flatfield: bool,
}

impl ModelConfig {
    pub fn new(shape: ShapeKind, pose: Pose, config: impl Into<String>) -> Self {
        Self {
            shape,
            pose,
            config: config.into(),
            slice: 0,
            det_id: 1,
            nb_line: 100,
            normal: true,
            flatfield: false,
        }
    }
}

/// Extracted sample set for one catalog line on one detector slice.
///
/// All arrays are co-indexed over the same retained pixels; the constructor
/// rejects length mismatches so the invariant holds for every instance.
#[derive(Debug, Clone, PartialEq)]
pub struct LineWindow {
    wavelengths: Vec<f64>,
    reference_wavelength: f64,
    intensities: Vec<f64>,
    x: Vec<f64>,
    y: Vec<f64>,
    slice: usize,
    line: usize,
}

impl LineWindow {
    pub fn new(
        wavelengths: Vec<f64>,
        reference_wavelength: f64,
        intensities: Vec<f64>,
        x: Vec<f64>,
        y: Vec<f64>,
        slice: usize,
        line: usize,
    ) -> LsfResult<Self> {
        let len = wavelengths.len();
        if intensities.len() != len || x.len() != len || y.len() != len {
            return Err(LsfError::internal(
                "WINDOW.CO_INDEX",
                format!(
                    "window arrays must be co-indexed: wavelengths={}, intensities={}, x={}, y={}",
                    len,
                    intensities.len(),
                    x.len(),
                    y.len()
                ),
            ));
        }
        Ok(Self {
            wavelengths,
            reference_wavelength,
            intensities,
            x,
            y,
            slice,
            line,
        })
    }

    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    pub fn reference_wavelength(&self) -> f64 {
        self.reference_wavelength
    }

    pub fn intensities(&self) -> &[f64] {
        &self.intensities
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn slice(&self) -> usize {
        self.slice
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn len(&self) -> usize {
        self.wavelengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelengths.is_empty()
    }

    /// Wavelengths relative to the reference line.
    pub fn offsets(&self) -> Vec<f64> {
        self.wavelengths
            .iter()
            .map(|wavelength| wavelength - self.reference_wavelength)
            .collect()
    }
}

/// Output of one shape fit over an extracted window.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    /// Wavelength offsets relative to the reference line, ascending.
    pub offsets: Vec<f64>,
    /// Fitted curve resampled at `offsets`.
    pub fitted: Vec<f64>,
    /// Shape-parameter name to fitted value.
    pub parameters: BTreeMap<String, f64>,
    pub rms_error: f64,
    pub max_relative_error: f64,
}

impl FitResult {
    pub fn parameter(&self, name: &str) -> LsfResult<f64> {
        self.parameters.get(name).copied().ok_or_else(|| {
            LsfError::internal(
                "FIT.PARAMETER_NAME",
                format!("fit result has no parameter '{name}'"),
            )
        })
    }
}

/// Affine wavelength dependence of every shape parameter: the persisted,
/// reusable artifact of a parameterization run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinearParams(pub BTreeMap<String, [f64; 2]>);

impl LinearParams {
    /// `slope * wavelength + intercept` for one shape parameter.
    pub fn evaluate(&self, name: &str, wavelength: f64) -> LsfResult<f64> {
        let [slope, intercept] = self.0.get(name).ok_or_else(|| {
            LsfError::incompatible_model(
                "MODEL.PARAMETER_NAME",
                format!("linear parameters carry no entry for '{name}'"),
            )
        })?;
        Ok(slope * wavelength + intercept)
    }

    pub fn insert(&mut self, name: impl Into<String>, slope: f64, intercept: f64) {
        self.0.insert(name.into(), [slope, intercept]);
    }
}

/// What the parameterization stage does when one catalog line fails to
/// extract or fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitFailurePolicy {
    /// Surface the per-line error and abort the whole run.
    #[default]
    Abort,
    /// Log the failure and continue with the remaining lines.
    SkipLine,
}
