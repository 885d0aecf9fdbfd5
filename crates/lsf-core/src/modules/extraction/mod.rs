//! Window extractor: locates one catalog line's footprint on the detector
//! and cuts out its co-indexed sample window.

use crate::domain::{LineWindow, LsfError, LsfResult, Pose};
use crate::modules::image::{DetectorImage, flatfield_correct};
use crate::modules::traits::{CalibrationAccessor, ImageSource, LineCatalog};
use crate::numerics::median_abs_diff;

/// Per-slice extractor bound to one (pose, config, detector) exposure.
pub struct WindowExtractor<'a> {
    calibration: &'a dyn CalibrationAccessor,
    catalog: &'a dyn LineCatalog,
    images: &'a dyn ImageSource,
    pose: Pose,
    slice: usize,
    normalize: bool,
    flatfield: bool,
}

struct BoundaryProfile {
    columns: Vec<f64>,
    wavelengths: Vec<f64>,
}

impl<'a> WindowExtractor<'a> {
    pub fn new(
        calibration: &'a dyn CalibrationAccessor,
        catalog: &'a dyn LineCatalog,
        images: &'a dyn ImageSource,
        pose: Pose,
        slice: usize,
        normalize: bool,
        flatfield: bool,
    ) -> Self {
        Self {
            calibration,
            catalog,
            images,
            pose,
            slice,
            normalize,
            flatfield,
        }
    }

    /// Extract the sample window of one catalog line.
    pub fn extract(&self, line: usize) -> LsfResult<LineWindow> {
        let reference_wavelength = self.catalog.reference_wavelength(line)?;

        let image = self.load_image()?;
        let rows = image.rows();

        let left = self.boundary_profile(rows, BoundaryKind::Left)?;
        let center = self.boundary_profile(rows, BoundaryKind::Center)?;
        let right = self.boundary_profile(rows, BoundaryKind::Right)?;

        let (left_column, left_row) = nearest_line(&left, reference_wavelength);
        let (_, center_row) = nearest_line(&center, reference_wavelength);
        let (right_column, right_row) = nearest_line(&right, reference_wavelength);
        tracing::debug!(
            line,
            slice = self.slice,
            left_row,
            center_row,
            right_row,
            "anchored catalog line on detector"
        );

        let margin = self.pose.window_margin();
        let row_low = left_row.min(center_row).min(right_row) as i64 - margin as i64;
        let row_high = left_row.max(center_row).max(right_row) as i64 + margin as i64;
        let col_low = left_column.ceil() as i64 + margin as i64;
        let col_high = right_column.floor() as i64 - margin as i64;

        let row_low = row_low.max(0) as usize;
        let row_high = row_high.min(rows as i64 - 1);
        let col_low = col_low.max(0) as usize;
        let col_high = col_high.min(image.cols() as i64);
        if row_high < row_low as i64 || col_high <= col_low as i64 {
            return Err(LsfError::empty_window(
                "EXTRACT.DEGENERATE_RECTANGLE",
                format!(
                    "line {line} yields an empty pixel rectangle on slice {}",
                    self.slice
                ),
            ));
        }
        let row_high = row_high as usize;
        let col_high = col_high as usize;

        let dispersion = median_abs_diff(&center.wavelengths).ok_or_else(|| {
            LsfError::empty_window(
                "EXTRACT.DISPERSION",
                "center wavelength profile is too short for a dispersion estimate",
            )
        })?;
        let mask_limit = margin as f64 * dispersion;

        let mut wavelengths = Vec::new();
        let mut intensities = Vec::new();
        let mut x_coords = Vec::new();
        let mut y_coords = Vec::new();
        for y in row_low..=row_high {
            for x in col_low..col_high {
                let wavelength = self
                    .calibration
                    .wavelength_at(self.slice, x as f64, y as f64)?;
                if (wavelength - reference_wavelength).abs() <= mask_limit {
                    wavelengths.push(wavelength);
                    intensities.push(image.get(y, x)?);
                    x_coords.push(x as f64);
                    y_coords.push(y as f64);
                }
            }
        }

        if wavelengths.is_empty() {
            return Err(LsfError::empty_window(
                "EXTRACT.EMPTY_WINDOW",
                format!(
                    "dispersion mask retained no pixel for line {line} on slice {}",
                    self.slice
                ),
            ));
        }

        if self.normalize {
            normalize_to_unit_max(&mut intensities);
        }

        // Back to physical detector units for the oversampled pose.
        if self.pose == Pose::Oversampled {
            for coordinate in x_coords.iter_mut().chain(y_coords.iter_mut()) {
                *coordinate = self.pose.pixel_to_table(*coordinate);
            }
        }

        tracing::debug!(
            line,
            slice = self.slice,
            retained = wavelengths.len(),
            "extracted line window"
        );
        LineWindow::new(
            wavelengths,
            reference_wavelength,
            intensities,
            x_coords,
            y_coords,
            self.slice,
            line,
        )
    }

    fn load_image(&self) -> LsfResult<DetectorImage> {
        let arc = self.images.arc_image()?;
        if !self.flatfield {
            return Ok(arc);
        }
        let flat = self.images.flat_image()?;
        flatfield_correct(&arc, &flat)
    }

    fn boundary_profile(&self, rows: usize, kind: BoundaryKind) -> LsfResult<BoundaryProfile> {
        let mut columns = Vec::with_capacity(rows);
        let mut wavelengths = Vec::with_capacity(rows);
        for row in 0..rows {
            let y = row as f64;
            let column = match kind {
                BoundaryKind::Left => self.calibration.left_boundary(self.slice, y)?,
                BoundaryKind::Center => self.calibration.center_boundary(self.slice, y)?,
                BoundaryKind::Right => self.calibration.right_boundary(self.slice, y)?,
            };
            wavelengths.push(self.calibration.wavelength_at(self.slice, column, y)?);
            columns.push(column);
        }
        Ok(BoundaryProfile {
            columns,
            wavelengths,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum BoundaryKind {
    Left,
    Center,
    Right,
}

/// Row index minimizing the absolute wavelength distance to the reference
/// line, paired with the boundary column at that row.
fn nearest_line(profile: &BoundaryProfile, reference_wavelength: f64) -> (f64, usize) {
    let mut best_row = 0;
    let mut best_distance = f64::INFINITY;
    for (row, wavelength) in profile.wavelengths.iter().enumerate() {
        let distance = (wavelength - reference_wavelength).abs();
        if distance < best_distance {
            best_distance = distance;
            best_row = row;
        }
    }
    (profile.columns[best_row], best_row)
}

/// Scale-to-unit-max normalization strategy.
fn normalize_to_unit_max(intensities: &mut [f64]) {
    let max = intensities.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max.is_finite() && max != 0.0 {
        for value in intensities.iter_mut() {
            *value /= max;
        }
    }
}
