mod fixtures;

use lsf_core::domain::{Pose, ShapeKind};
use lsf_core::modules::calibration::load_pose_calibration;
use lsf_core::modules::catalog::load_line_catalog;
use lsf_core::modules::extraction::WindowExtractor;
use lsf_core::modules::fitting::{fit_gaussian, fit_window, gaussian_profile};
use lsf_core::modules::image::ExposureArchive;
use tempfile::TempDir;

#[test]
fn perfect_gaussian_window_recovers_known_parameters() {
    // 50x50 meshgrid flattened into samples, exact Gaussian, no noise.
    let mut offsets = Vec::with_capacity(2500);
    let mut intensities = Vec::with_capacity(2500);
    for _row in 0..50 {
        for step in 0..50 {
            let x = -8.0 + 16.0 * step as f64 / 49.0;
            offsets.push(x);
            intensities.push(gaussian_profile(x, 100.0, 0.0, 2.0));
        }
    }

    let result = fit_gaussian(&offsets, &intensities).expect("fit should converge");
    assert!((result.parameter("Amplitude").unwrap() - 100.0).abs() / 100.0 < 1e-4);
    assert!(result.parameter("Mean").unwrap().abs() < 1e-4);
    assert!((result.parameter("Sigma").unwrap() - 2.0).abs() / 2.0 < 1e-4);
    assert!(result.rms_error < 1e-6);
    assert!(result.max_relative_error < 1e-6);
}

#[test]
fn extracted_window_fit_matches_the_synthetic_line() {
    let temp = TempDir::new().expect("tempdir should be created");
    fixtures::write_data_dir(temp.path(), Pose::Sampled);
    let calibration =
        load_pose_calibration(temp.path(), Pose::Sampled, fixtures::CONFIG, fixtures::DET_ID)
            .expect("calibration tables should load");
    let catalog = load_line_catalog(temp.path(), fixtures::CONFIG).expect("catalog should load");
    let images = ExposureArchive::new(temp.path(), Pose::Sampled, fixtures::CONFIG, fixtures::DET_ID);

    let extractor = WindowExtractor::new(
        &calibration,
        &catalog,
        &images,
        Pose::Sampled,
        0,
        false,
        false,
    );
    let window = extractor.extract(3).expect("window should extract");
    let result = fit_window(ShapeKind::Gaussian, &window).expect("fit should converge");

    let line_wavelength = window.reference_wavelength();
    let expected_amplitude = fixtures::amplitude_at(line_wavelength);
    let expected_sigma = fixtures::sigma_at(line_wavelength);
    assert!(
        (result.parameter("Amplitude").unwrap() - expected_amplitude).abs() / expected_amplitude
            < 1e-6
    );
    assert!(result.parameter("Mean").unwrap().abs() < 1e-8);
    assert!((result.parameter("Sigma").unwrap() - expected_sigma).abs() / expected_sigma < 1e-6);
    // Raw intensities peak in the thousands; the residual floor scales with
    // the data.
    assert!(result.rms_error / result.fitted.iter().cloned().fold(0.0, f64::max) < 1e-8);
}

#[test]
fn fit_domain_is_sorted_and_co_sized_with_the_window() {
    let temp = TempDir::new().expect("tempdir should be created");
    fixtures::write_data_dir(temp.path(), Pose::Sampled);
    let calibration =
        load_pose_calibration(temp.path(), Pose::Sampled, fixtures::CONFIG, fixtures::DET_ID)
            .expect("calibration tables should load");
    let catalog = load_line_catalog(temp.path(), fixtures::CONFIG).expect("catalog should load");
    let images = ExposureArchive::new(temp.path(), Pose::Sampled, fixtures::CONFIG, fixtures::DET_ID);

    let extractor = WindowExtractor::new(
        &calibration,
        &catalog,
        &images,
        Pose::Sampled,
        0,
        true,
        false,
    );
    let window = extractor.extract(1).expect("window should extract");
    let result = fit_window(ShapeKind::Gaussian, &window).expect("fit should converge");

    assert_eq!(result.offsets.len(), window.len());
    assert_eq!(result.fitted.len(), window.len());
    assert!(result.offsets.windows(2).all(|pair| pair[0] <= pair[1]));
}
