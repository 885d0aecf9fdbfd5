use super::CliError;
use super::helpers::ProviderBundle;
use lsf_core::domain::{FitFailurePolicy, ModelConfig, Pose, ShapeKind};
use lsf_core::modules::extraction::WindowExtractor;
use lsf_core::modules::model::LsfModel;
use lsf_core::modules::serialization::{read_model_record, write_model_record};
use lsf_core::numerics::{max_relative_error, rms_error};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub(super) enum ShapeArg {
    Gaussian,
    Moffat,
}

impl From<ShapeArg> for ShapeKind {
    fn from(value: ShapeArg) -> Self {
        match value {
            ShapeArg::Gaussian => Self::Gaussian,
            ShapeArg::Moffat => Self::Moffat,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub(super) enum PoseArg {
    Sampled,
    Oversampled,
}

impl From<PoseArg> for Pose {
    fn from(value: PoseArg) -> Self {
        match value {
            PoseArg::Sampled => Self::Sampled,
            PoseArg::Oversampled => Self::Oversampled,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub(super) enum FailureArg {
    /// Abort the run on the first per-line failure
    Abort,
    /// Log the failing line and continue
    Skip,
}

impl From<FailureArg> for FitFailurePolicy {
    fn from(value: FailureArg) -> Self {
        match value {
            FailureArg::Abort => Self::Abort,
            FailureArg::Skip => Self::SkipLine,
        }
    }
}

#[derive(clap::Args)]
pub(super) struct FitArgs {
    /// Calibration data directory
    #[arg(long, default_value = "exposures")]
    data_dir: PathBuf,

    /// LSF shape to fit
    #[arg(long, value_enum, default_value_t = ShapeArg::Gaussian)]
    shape: ShapeArg,

    /// Exposure sampling mode
    #[arg(long, value_enum, default_value_t = PoseArg::Sampled)]
    pose: PoseArg,

    /// Spectral configuration tag
    #[arg(long, default_value = "H")]
    config: String,

    /// Detector slice index
    #[arg(long, default_value_t = 0)]
    slice: usize,

    /// Detector id
    #[arg(long, default_value_t = 1)]
    det_id: u32,

    /// Reference catalog line for diagnostics
    #[arg(long = "line", default_value_t = 100)]
    nb_line: usize,

    /// Keep raw intensities instead of scaling the window peak to 1
    #[arg(long)]
    no_normalize: bool,

    /// Divide the arc exposure by the flat-field exposure
    #[arg(long)]
    flatfield: bool,

    /// Per-line failure policy for the parameterization loop
    #[arg(long, value_enum, default_value_t = FailureArg::Abort)]
    on_fit_failure: FailureArg,

    /// Output model record path
    #[arg(long, default_value = "lsf_model.json")]
    output: PathBuf,
}

pub(super) fn run_fit_command(args: FitArgs) -> Result<i32, CliError> {
    let pose: Pose = args.pose.into();
    let mut config = ModelConfig::new(args.shape.into(), pose, args.config.clone());
    config.slice = args.slice;
    config.det_id = args.det_id;
    config.nb_line = args.nb_line;
    config.normal = !args.no_normalize;
    config.flatfield = args.flatfield;

    let bundle = ProviderBundle::load(&args.data_dir, pose, &args.config, args.det_id)?;
    tracing::info!(
        data_dir = %args.data_dir.display(),
        config = %args.config,
        slice = args.slice,
        det_id = args.det_id,
        shape = ?config.shape,
        "starting parameterization"
    );
    let mut model = LsfModel::new(config);
    model.calculate_parameters(&bundle.provider_set(), args.on_fit_failure.into())?;

    let record = model.to_record()?;
    write_model_record(&args.output, &record)?;

    println!(
        "fitted {} for config {} slice {} detector {}",
        record.name, record.config, record.slice, record.det_id
    );
    for (name, [slope, intercept]) in &record.params_linear.0 {
        println!("  {name}: slope {slope:.6e}, intercept {intercept:.6e}");
    }
    println!("wrote {}", args.output.display());
    Ok(0)
}

#[derive(clap::Args)]
pub(super) struct EvaluateArgs {
    /// Persisted model record path
    #[arg(long)]
    model: PathBuf,

    /// Calibration data directory
    #[arg(long, default_value = "exposures")]
    data_dir: PathBuf,

    /// Catalog line to score against (defaults to the record's line)
    #[arg(long)]
    line: Option<usize>,
}

pub(super) fn run_evaluate_command(args: EvaluateArgs) -> Result<i32, CliError> {
    let record = read_model_record(&args.model)?;
    let shape = ShapeKind::from_record_tag(&record.name)?;
    let model = LsfModel::from_record(&record, shape)?;

    let bundle = ProviderBundle::load(&args.data_dir, record.pose, &record.config, record.det_id)?;
    let providers = bundle.provider_set();
    let extractor = WindowExtractor::new(
        providers.calibration,
        providers.catalog,
        providers.images,
        record.pose,
        record.slice,
        record.normal,
        record.flatfield,
    );
    let line = args.line.unwrap_or(record.nb_line);
    let window = extractor.extract(line)?;
    let predicted = model.evaluate_intensity(window.reference_wavelength(), &window.offsets())?;

    println!(
        "line {line} at {:.6} on slice {}: {} retained pixels",
        window.reference_wavelength(),
        record.slice,
        window.len()
    );
    println!(
        "rms error {:.6e}, max relative error {:.6e}",
        rms_error(window.intensities(), &predicted),
        max_relative_error(window.intensities(), &predicted)
    );
    Ok(0)
}

#[derive(clap::Args)]
pub(super) struct ShowArgs {
    /// Persisted model record path
    #[arg(long)]
    model: PathBuf,
}

pub(super) fn run_show_command(args: ShowArgs) -> Result<i32, CliError> {
    let record = read_model_record(&args.model)?;
    println!(
        "{} pose {} config {} slice {} detector {} line {} normal {} flatfield {}",
        record.name,
        record.pose,
        record.config,
        record.slice,
        record.det_id,
        record.nb_line,
        record.normal,
        record.flatfield
    );
    for (name, [slope, intercept]) in &record.params_linear.0 {
        println!("  {name}: slope {slope:.6e}, intercept {intercept:.6e}");
    }
    Ok(0)
}
