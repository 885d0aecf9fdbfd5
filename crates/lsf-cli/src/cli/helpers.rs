use lsf_core::domain::{LsfResult, Pose};
use lsf_core::modules::calibration::{PoseCalibration, load_pose_calibration};
use lsf_core::modules::catalog::{
    LineCatalogTable, LineSelectionTable, load_line_catalog, load_line_selection,
};
use lsf_core::modules::image::ExposureArchive;
use lsf_core::modules::model::ProviderSet;
use std::path::Path;

/// Owned providers for one (pose, config, detector) binding, loaded from a
/// calibration data directory.
pub(super) struct ProviderBundle {
    calibration: PoseCalibration,
    catalog: LineCatalogTable,
    selection: LineSelectionTable,
    images: ExposureArchive,
}

impl ProviderBundle {
    pub(super) fn load(dir: &Path, pose: Pose, config: &str, det_id: u32) -> LsfResult<Self> {
        let calibration = load_pose_calibration(dir, pose, config, det_id)?;
        let catalog = load_line_catalog(dir, config)?;
        let selection = load_line_selection(dir, config, &catalog)?;
        let images = ExposureArchive::new(dir, pose, config, det_id);
        Ok(Self {
            calibration,
            catalog,
            selection,
            images,
        })
    }

    pub(super) fn provider_set(&self) -> ProviderSet<'_> {
        ProviderSet {
            calibration: &self.calibration,
            catalog: &self.catalog,
            selection: &self.selection,
            images: &self.images,
        }
    }
}
