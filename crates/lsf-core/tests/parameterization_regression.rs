mod fixtures;

use lsf_core::domain::{FitFailurePolicy, LsfErrorCategory, ModelConfig, Pose, ShapeKind};
use lsf_core::modules::calibration::{PoseCalibration, load_pose_calibration};
use lsf_core::modules::catalog::{
    LineCatalogTable, LineSelectionTable, load_line_catalog, load_line_selection,
};
use lsf_core::modules::image::ExposureArchive;
use lsf_core::modules::model::{LsfModel, ProviderSet};
use std::path::Path;
use tempfile::TempDir;

struct Providers {
    calibration: PoseCalibration,
    catalog: LineCatalogTable,
    selection: LineSelectionTable,
    images: ExposureArchive,
}

impl Providers {
    fn load(dir: &Path, pose: Pose) -> Self {
        let calibration = load_pose_calibration(dir, pose, fixtures::CONFIG, fixtures::DET_ID)
            .expect("calibration tables should load");
        let catalog = load_line_catalog(dir, fixtures::CONFIG).expect("catalog should load");
        let selection =
            load_line_selection(dir, fixtures::CONFIG, &catalog).expect("selection should load");
        let images = ExposureArchive::new(dir, pose, fixtures::CONFIG, fixtures::DET_ID);
        Self {
            calibration,
            catalog,
            selection,
            images,
        }
    }

    fn set(&self) -> ProviderSet<'_> {
        ProviderSet {
            calibration: &self.calibration,
            catalog: &self.catalog,
            selection: &self.selection,
            images: &self.images,
        }
    }
}

fn raw_gaussian_config() -> ModelConfig {
    let mut config = ModelConfig::new(ShapeKind::Gaussian, Pose::Sampled, fixtures::CONFIG);
    config.nb_line = 2;
    config.normal = false;
    config
}

#[test]
fn gaussian_parameterization_recovers_the_injected_trends() {
    let temp = TempDir::new().expect("tempdir should be created");
    fixtures::write_data_dir(temp.path(), Pose::Sampled);
    let providers = Providers::load(temp.path(), Pose::Sampled);

    let mut model = LsfModel::new(raw_gaussian_config());
    model
        .calculate_parameters(&providers.set(), FitFailurePolicy::Abort)
        .expect("parameterization should succeed");

    let params = model.params().expect("parameters should be populated");
    let [amp_slope, amp_intercept] = params.0["Amplitude"];
    let [mean_slope, mean_intercept] = params.0["Mean"];
    let [sigma_slope, sigma_intercept] = params.0["Sigma"];

    // The fixture injects Amplitude = 10 * lambda + (2 - 10 * 1.6) and
    // Sigma = 5e-3 * lambda + (3e-4 - 5e-3 * 1.6); Mean stays at 0.
    assert!((amp_slope - 10.0).abs() / 10.0 < 1e-5);
    assert!((amp_intercept - (2.0 - 10.0 * fixtures::BASE_WAVELENGTH)).abs() < 1e-3);
    assert!((sigma_slope - 5.0e-3).abs() / 5.0e-3 < 1e-5);
    assert!((sigma_intercept - (3.0e-4 - 5.0e-3 * fixtures::BASE_WAVELENGTH)).abs() < 1e-6);
    assert!(mean_slope.abs() < 1e-6);
    assert!(mean_intercept.abs() < 1e-6);
}

#[test]
fn repeated_runs_produce_identical_coefficients() {
    let temp = TempDir::new().expect("tempdir should be created");
    fixtures::write_data_dir(temp.path(), Pose::Sampled);
    let providers = Providers::load(temp.path(), Pose::Sampled);

    let mut first = LsfModel::new(raw_gaussian_config());
    first
        .calculate_parameters(&providers.set(), FitFailurePolicy::Abort)
        .expect("first run should succeed");
    let mut second = LsfModel::new(raw_gaussian_config());
    second
        .calculate_parameters(&providers.set(), FitFailurePolicy::Abort)
        .expect("second run should succeed");

    assert_eq!(first.params(), second.params());
}

#[test]
fn linearized_model_scores_every_usable_line() {
    let temp = TempDir::new().expect("tempdir should be created");
    fixtures::write_data_dir(temp.path(), Pose::Sampled);
    let providers = Providers::load(temp.path(), Pose::Sampled);

    let mut model = LsfModel::new(raw_gaussian_config());
    model
        .calculate_parameters(&providers.set(), FitFailurePolicy::Abort)
        .expect("parameterization should succeed");
    let report = model
        .diagnostic_report(&providers.set(), FitFailurePolicy::Abort)
        .expect("diagnostics should run");

    assert_eq!(report.len(), fixtures::LINE_ROWS.len());
    for diagnostic in &report {
        // Raw windows peak in the thousands, so the absolute rms floor is
        // scaled by the relative one.
        assert!(diagnostic.max_relative_error < 1e-4);
        assert!(diagnostic.rms_error < 1e-2);
    }
}

#[test]
fn reference_window_is_cached_after_first_load() {
    let temp = TempDir::new().expect("tempdir should be created");
    fixtures::write_data_dir(temp.path(), Pose::Sampled);
    let providers = Providers::load(temp.path(), Pose::Sampled);

    let mut model = LsfModel::new(raw_gaussian_config());
    assert!(model.reference_window().is_none());

    let wavelength = model
        .load_reference_window(&providers.set())
        .expect("reference line should extract")
        .reference_wavelength();
    assert!((wavelength - fixtures::line_wavelengths()[2]).abs() < 1e-12);
    assert!(model.reference_window().is_some());
}

#[test]
fn inverted_selection_range_leaves_too_few_lines() {
    let temp = TempDir::new().expect("tempdir should be created");
    fixtures::write_data_dir(temp.path(), Pose::Sampled);
    std::fs::write(
        temp.path().join("line_selection.json"),
        format!(
            r#"{{"configs": {{"{}": {{"default": [3, 1]}}}}}}"#,
            fixtures::CONFIG
        ),
    )
    .unwrap();
    let providers = Providers::load(temp.path(), Pose::Sampled);

    let mut model = LsfModel::new(raw_gaussian_config());
    let error = model
        .calculate_parameters(&providers.set(), FitFailurePolicy::Abort)
        .expect_err("an empty usable range cannot be parameterized");
    assert_eq!(error.category(), LsfErrorCategory::InsufficientData);
    assert!(model.params().is_none());
}

#[test]
fn failing_line_aborts_or_is_skipped_per_policy() {
    let temp = TempDir::new().expect("tempdir should be created");
    fixtures::write_data_dir(temp.path(), Pose::Sampled);
    // A catalog line far outside the slice's wavelength span extracts to
    // an empty window.
    let mut wavelengths = fixtures::line_wavelengths();
    wavelengths.push(2.5);
    fixtures::write_line_catalog(temp.path(), &wavelengths);
    let providers = Providers::load(temp.path(), Pose::Sampled);

    let mut aborted = LsfModel::new(raw_gaussian_config());
    let error = aborted
        .calculate_parameters(&providers.set(), FitFailurePolicy::Abort)
        .expect_err("abort policy should surface the per-line failure");
    assert_eq!(error.category(), LsfErrorCategory::EmptyWindow);

    let mut skipped = LsfModel::new(raw_gaussian_config());
    skipped
        .calculate_parameters(&providers.set(), FitFailurePolicy::SkipLine)
        .expect("skip policy should finish on the remaining lines");
    let params = skipped.params().expect("parameters should be populated");
    assert!((params.0["Amplitude"][0] - 10.0).abs() / 10.0 < 1e-5);
}

#[test]
fn diagnostics_honor_the_skip_policy() {
    let temp = TempDir::new().expect("tempdir should be created");
    fixtures::write_data_dir(temp.path(), Pose::Sampled);
    let mut wavelengths = fixtures::line_wavelengths();
    wavelengths.push(2.5);
    fixtures::write_line_catalog(temp.path(), &wavelengths);
    let providers = Providers::load(temp.path(), Pose::Sampled);

    let mut model = LsfModel::new(raw_gaussian_config());
    model
        .calculate_parameters(&providers.set(), FitFailurePolicy::SkipLine)
        .expect("skip policy should finish on the remaining lines");

    let error = model
        .diagnostic_report(&providers.set(), FitFailurePolicy::Abort)
        .expect_err("abort policy should surface the per-line failure");
    assert_eq!(error.category(), LsfErrorCategory::EmptyWindow);

    let report = model
        .diagnostic_report(&providers.set(), FitFailurePolicy::SkipLine)
        .expect("skip policy should score the remaining lines");
    assert_eq!(report.len(), fixtures::LINE_ROWS.len());
}
