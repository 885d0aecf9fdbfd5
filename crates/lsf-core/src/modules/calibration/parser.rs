use super::model::{PolySurface, SlitletBounds, SlitletTable, WavecalTable};
use crate::domain::{LsfError, LsfResult};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct WavecalFile {
    detectors: BTreeMap<String, WavecalDetector>,
}

#[derive(Debug, Deserialize)]
struct WavecalDetector {
    slices: Vec<PolySurface>,
}

#[derive(Debug, Deserialize)]
struct SlitletFile {
    detectors: BTreeMap<String, SlitletDetector>,
}

#[derive(Debug, Deserialize)]
struct SlitletDetector {
    slices: Vec<SlitletBounds>,
}

pub fn wavecal_file_name(config: &str) -> String {
    format!("WAVECAL_TABLE_{config}.json")
}

pub fn slitlet_file_name(config: &str) -> String {
    format!("SLITLET_TABLE_{config}.json")
}

fn read_table_source(path: &Path, table_name: &str) -> LsfResult<String> {
    fs::read_to_string(path).map_err(|source| {
        LsfError::io_system(
            "IO.CALIB_TABLE_READ",
            format!(
                "failed to read {} table '{}': {}",
                table_name,
                path.display(),
                source
            ),
        )
    })
}

fn detector_entry<T>(
    detectors: BTreeMap<String, T>,
    det_id: u32,
    path: &Path,
    table_name: &str,
) -> LsfResult<T> {
    detectors.into_iter()
        .find(|(key, _)| *key == det_id.to_string())
        .map(|(_, entry)| entry)
        .ok_or_else(|| {
            LsfError::input_validation(
                "INPUT.CALIB_DETECTOR",
                format!(
                    "{} table '{}' has no entry for detector {}",
                    table_name,
                    path.display(),
                    det_id
                ),
            )
        })
}

/// Load the wavelength-calibration table for one (config, detector) pair
/// from `dir`.
pub fn load_wavecal_table(dir: &Path, config: &str, det_id: u32) -> LsfResult<WavecalTable> {
    let path = dir.join(wavecal_file_name(config));
    let source = read_table_source(&path, "wavelength-calibration")?;
    let file: WavecalFile = serde_json::from_str(&source).map_err(|source| {
        LsfError::input_validation(
            "INPUT.WAVECAL_FORMAT",
            format!(
                "wavelength-calibration table '{}' is malformed: {}",
                path.display(),
                source
            ),
        )
    })?;
    let detector = detector_entry(file.detectors, det_id, &path, "wavelength-calibration")?;
    if detector.slices.is_empty() {
        return Err(LsfError::input_validation(
            "INPUT.WAVECAL_EMPTY",
            format!(
                "wavelength-calibration table '{}' carries no slices for detector {}",
                path.display(),
                det_id
            ),
        ));
    }
    Ok(WavecalTable::new(detector.slices))
}

/// Load the slitlet-geometry table for one (config, detector) pair from
/// `dir`.
pub fn load_slitlet_table(dir: &Path, config: &str, det_id: u32) -> LsfResult<SlitletTable> {
    let path = dir.join(slitlet_file_name(config));
    let source = read_table_source(&path, "slitlet-geometry")?;
    let file: SlitletFile = serde_json::from_str(&source).map_err(|source| {
        LsfError::input_validation(
            "INPUT.SLITLET_FORMAT",
            format!(
                "slitlet-geometry table '{}' is malformed: {}",
                path.display(),
                source
            ),
        )
    })?;
    let detector = detector_entry(file.detectors, det_id, &path, "slitlet-geometry")?;
    if detector.slices.is_empty() {
        return Err(LsfError::input_validation(
            "INPUT.SLITLET_EMPTY",
            format!(
                "slitlet-geometry table '{}' carries no slices for detector {}",
                path.display(),
                det_id
            ),
        ));
    }
    Ok(SlitletTable::new(detector.slices))
}

#[cfg(test)]
mod tests {
    use super::{load_slitlet_table, load_wavecal_table};
    use crate::domain::LsfErrorCategory;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn wavecal_table_parses_per_detector_slices() {
        let temp = TempDir::new().expect("tempdir should be created");
        fs::write(
            temp.path().join("WAVECAL_TABLE_H.json"),
            r#"{"detectors": {"1": {"slices": [{"coefficients": [[1.6, 2e-4]]}]}}}"#,
        )
        .unwrap();

        let table = load_wavecal_table(temp.path(), "H", 1).unwrap();
        assert_eq!(table.slice_count(), 1);
        let wavelength = table.wavelength(0, 0.0, 10.0).unwrap();
        assert!((wavelength - 1.602).abs() < 1e-12);
    }

    #[test]
    fn missing_detector_entry_is_input_validation() {
        let temp = TempDir::new().expect("tempdir should be created");
        fs::write(
            temp.path().join("WAVECAL_TABLE_H.json"),
            r#"{"detectors": {"2": {"slices": [{"coefficients": [[1.6]]}]}}}"#,
        )
        .unwrap();

        let error = load_wavecal_table(temp.path(), "H", 1).unwrap_err();
        assert_eq!(error.category(), LsfErrorCategory::InputValidation);
    }

    #[test]
    fn missing_table_file_is_io_system() {
        let temp = TempDir::new().expect("tempdir should be created");
        let error = load_slitlet_table(temp.path(), "H", 1).unwrap_err();
        assert_eq!(error.category(), LsfErrorCategory::IoSystem);
    }

    #[test]
    fn slitlet_table_parses_boundary_polynomials() {
        let temp = TempDir::new().expect("tempdir should be created");
        fs::write(
            temp.path().join("SLITLET_TABLE_HK.json"),
            r#"{"detectors": {"3": {"slices": [{"left": [10.0], "center": [25.0, 0.01], "right": [40.0]}]}}}"#,
        )
        .unwrap();

        let table = load_slitlet_table(temp.path(), "HK", 3).unwrap();
        assert_eq!(table.left(0, 50.0).unwrap(), 10.0);
        assert!((table.center(0, 50.0).unwrap() - 25.5).abs() < 1e-12);
    }
}
