//! Calibration-data accessor: wavelength-calibration and slitlet-geometry
//! tables behind the pose-aware pixel-space query contract.

mod model;
mod parser;

pub use model::{PolyLine, PolySurface, PoseCalibration, SlitletBounds, SlitletTable, WavecalTable};
pub use parser::{
    load_slitlet_table, load_wavecal_table, slitlet_file_name, wavecal_file_name,
};

use crate::domain::{LsfResult, Pose};
use std::path::Path;

/// Load both calibration tables for one (config, detector) pair and bind
/// them to a pose.
pub fn load_pose_calibration(
    dir: &Path,
    pose: Pose,
    config: &str,
    det_id: u32,
) -> LsfResult<PoseCalibration> {
    let wavecal = load_wavecal_table(dir, config, det_id)?;
    let slitlet = load_slitlet_table(dir, config, det_id)?;
    Ok(PoseCalibration::new(pose, wavecal, slitlet))
}
