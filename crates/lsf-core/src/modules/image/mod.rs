//! Detector image planes and the data-directory exposure archive.

mod parser;

pub use parser::{ExposureArchive, arc_file_name, flat_file_name};

use crate::domain::{LsfError, LsfResult};

/// One row-major detector plane.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorImage {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl DetectorImage {
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> LsfResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(LsfError::data_shape(
                "IMAGE.EMPTY_PLANE",
                format!("detector plane declares a degenerate {rows}x{cols} shape"),
            ));
        }
        if data.len() != rows * cols {
            return Err(LsfError::data_shape(
                "IMAGE.PLANE_SHAPE",
                format!(
                    "detector plane declares {rows}x{cols} pixels but carries {} samples",
                    data.len()
                ),
            ));
        }
        Ok(Self { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, y: usize, x: usize) -> LsfResult<f64> {
        if y >= self.rows || x >= self.cols {
            return Err(LsfError::input_validation(
                "IMAGE.PIXEL_BOUNDS",
                format!(
                    "pixel ({x}, {y}) outside {}x{} detector plane",
                    self.cols, self.rows
                ),
            ));
        }
        Ok(self.data[y * self.cols + x])
    }
}

/// Element-wise flat-field division; the two planes must share a shape.
pub fn flatfield_correct(image: &DetectorImage, flat: &DetectorImage) -> LsfResult<DetectorImage> {
    if image.rows != flat.rows || image.cols != flat.cols {
        return Err(LsfError::data_shape(
            "IMAGE.FLAT_SHAPE",
            format!(
                "arc plane is {}x{} but flat plane is {}x{}",
                image.rows, image.cols, flat.rows, flat.cols
            ),
        ));
    }
    let data = image
        .data
        .iter()
        .zip(&flat.data)
        .map(|(value, reference)| value / reference)
        .collect();
    DetectorImage::new(image.rows, image.cols, data)
}
