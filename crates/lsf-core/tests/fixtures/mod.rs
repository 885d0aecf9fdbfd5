//! Synthetic calibration data: a linear wavelength solution, constant
//! slitlet boundaries, and arc exposures carrying exact Gaussian lines
//! whose amplitude and width drift linearly with wavelength.
#![allow(dead_code)]

use lsf_core::domain::Pose;
use lsf_core::modules::image::{arc_file_name, flat_file_name};
use serde_json::json;
use std::fs;
use std::path::Path;

pub const CONFIG: &str = "H";
pub const DET_ID: u32 = 1;

pub const BASE_WAVELENGTH: f64 = 1.6;
pub const ROW_DISPERSION: f64 = 2.0e-4;
pub const COLUMN_TERM: f64 = 1.0e-6;

pub const LEFT_COLUMN: f64 = 10.0;
pub const CENTER_COLUMN: f64 = 25.0;
pub const RIGHT_COLUMN: f64 = 40.0;

pub const LINE_ROWS: [f64; 5] = [40.0, 80.0, 120.0, 160.0, 200.0];
pub const TABLE_ROWS: usize = 240;
pub const TABLE_COLS: usize = 64;

pub const FLAT_LEVEL: f64 = 2.0;

const SQRT_2PI: f64 = 2.506_628_274_631_000_5;

/// Wavelength solution in table coordinates.
pub fn wavelength(x_table: f64, y_table: f64) -> f64 {
    BASE_WAVELENGTH + ROW_DISPERSION * y_table + COLUMN_TERM * x_table
}

/// Ground-truth amplitude trend: slope 10, intercept 2 - 10 * 1.6.
pub fn amplitude_at(line_wavelength: f64) -> f64 {
    2.0 + 10.0 * (line_wavelength - BASE_WAVELENGTH)
}

/// Ground-truth sigma trend: slope 5e-3, intercept 3e-4 - 5e-3 * 1.6.
pub fn sigma_at(line_wavelength: f64) -> f64 {
    3.0e-4 + 5.0e-3 * (line_wavelength - BASE_WAVELENGTH)
}

/// Catalog reference wavelengths, one per emission line, evaluated at the
/// slice center column.
pub fn line_wavelengths() -> Vec<f64> {
    LINE_ROWS
        .iter()
        .map(|row| wavelength(CENTER_COLUMN, *row))
        .collect()
}

fn arc_value(x_table: f64, y_table: f64) -> f64 {
    let pixel_wavelength = wavelength(x_table, y_table);
    line_wavelengths()
        .iter()
        .map(|line| {
            let amplitude = amplitude_at(*line);
            let sigma = sigma_at(*line);
            let reduced = (pixel_wavelength - line) / sigma;
            amplitude / (sigma * SQRT_2PI) * (-0.5 * reduced * reduced).exp()
        })
        .sum()
}

pub fn detector_shape(pose: Pose) -> (usize, usize) {
    match pose {
        Pose::Sampled => (TABLE_ROWS, TABLE_COLS),
        Pose::Oversampled => (3 * TABLE_ROWS, 3 * TABLE_COLS),
    }
}

pub fn write_calibration_tables(dir: &Path) {
    fs::write(
        dir.join(format!("WAVECAL_TABLE_{CONFIG}.json")),
        json!({
            "detectors": { DET_ID.to_string(): { "slices": [
                { "coefficients": [[BASE_WAVELENGTH, ROW_DISPERSION], [COLUMN_TERM]] }
            ]}}
        })
        .to_string(),
    )
    .expect("wavecal table should be written");

    fs::write(
        dir.join(format!("SLITLET_TABLE_{CONFIG}.json")),
        json!({
            "detectors": { DET_ID.to_string(): { "slices": [
                { "left": [LEFT_COLUMN], "center": [CENTER_COLUMN], "right": [RIGHT_COLUMN] }
            ]}}
        })
        .to_string(),
    )
    .expect("slitlet table should be written");
}

pub fn write_line_catalog(dir: &Path, wavelengths: &[f64]) {
    fs::write(
        dir.join("line_catalog.json"),
        json!({ "configs": { CONFIG: wavelengths } }).to_string(),
    )
    .expect("line catalog should be written");
}

pub fn write_exposures(dir: &Path, pose: Pose) {
    let (rows, cols) = detector_shape(pose);
    let mut arc = Vec::with_capacity(rows * cols);
    for y in 0..rows {
        for x in 0..cols {
            arc.push(arc_value(
                pose.pixel_to_table(x as f64),
                pose.pixel_to_table(y as f64),
            ));
        }
    }
    fs::write(
        dir.join(arc_file_name(CONFIG, pose)),
        json!({ "chips": { DET_ID.to_string(): { "rows": rows, "cols": cols, "data": arc } } })
            .to_string(),
    )
    .expect("arc exposure should be written");

    let flat = vec![FLAT_LEVEL; rows * cols];
    fs::write(
        dir.join(flat_file_name(CONFIG, pose)),
        json!({ "chips": { DET_ID.to_string(): { "rows": rows, "cols": cols, "data": flat } } })
            .to_string(),
    )
    .expect("flat exposure should be written");
}

/// Write the complete synthetic data directory for one pose.
pub fn write_data_dir(dir: &Path, pose: Pose) {
    write_calibration_tables(dir);
    write_line_catalog(dir, &line_wavelengths());
    write_exposures(dir, pose);
}
