use super::DetectorImage;
use crate::domain::{LsfError, LsfResult, Pose};
use crate::modules::traits::ImageSource;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct ExposureFile {
    chips: BTreeMap<String, ChipPlane>,
}

#[derive(Debug, Deserialize)]
struct ChipPlane {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

pub fn arc_file_name(config: &str, pose: Pose) -> String {
    format!("ARC_{config}_{}.json", pose.as_str())
}

pub fn flat_file_name(config: &str, pose: Pose) -> String {
    format!("FLAT_{config}_{}.json", pose.as_str())
}

/// Data-directory-backed exposure provider for one (pose, config, detector)
/// binding. Each call opens, fully reads, and closes its file before
/// returning, so no handle outlives an extraction.
#[derive(Debug, Clone)]
pub struct ExposureArchive {
    dir: PathBuf,
    pose: Pose,
    config: String,
    det_id: u32,
}

impl ExposureArchive {
    pub fn new(dir: impl Into<PathBuf>, pose: Pose, config: impl Into<String>, det_id: u32) -> Self {
        Self {
            dir: dir.into(),
            pose,
            config: config.into(),
            det_id,
        }
    }

    fn load_plane(&self, file_name: &str) -> LsfResult<DetectorImage> {
        let path = self.dir.join(file_name);
        let source = fs::read_to_string(&path).map_err(|source| {
            LsfError::io_system(
                "IO.IMAGE_READ",
                format!("failed to read exposure '{}': {}", path.display(), source),
            )
        })?;
        let file: ExposureFile = serde_json::from_str(&source).map_err(|source| {
            LsfError::input_validation(
                "INPUT.IMAGE_FORMAT",
                format!("exposure '{}' is malformed: {}", path.display(), source),
            )
        })?;
        let plane = file.chips.get(&self.det_id.to_string()).ok_or_else(|| {
            LsfError::input_validation(
                "INPUT.IMAGE_DETECTOR",
                format!(
                    "exposure '{}' has no plane for detector {}",
                    path.display(),
                    self.det_id
                ),
            )
        })?;
        DetectorImage::new(plane.rows, plane.cols, plane.data.clone())
    }
}

impl ImageSource for ExposureArchive {
    fn arc_image(&self) -> LsfResult<DetectorImage> {
        self.load_plane(&arc_file_name(&self.config, self.pose))
    }

    fn flat_image(&self) -> LsfResult<DetectorImage> {
        self.load_plane(&flat_file_name(&self.config, self.pose))
    }
}
