//! The per-slice, per-detector LSF model: runs the linear-parameterization
//! stage and owns the resulting coefficients.

use crate::domain::{
    FitFailurePolicy, LineWindow, LinearParams, LsfError, LsfResult, ModelConfig, ShapeKind,
};
use crate::modules::extraction::WindowExtractor;
use crate::modules::fitting::{fit_window, gaussian_profile, moffat_profile};
use crate::modules::serialization::ModelRecord;
use crate::modules::traits::{CalibrationAccessor, ImageSource, LineCatalog, LineSelection};
use crate::numerics::{linear_fit, max_relative_error, rms_error};

/// Borrowed set of collaborators one parameterization run reads from.
#[derive(Clone, Copy)]
pub struct ProviderSet<'a> {
    pub calibration: &'a dyn CalibrationAccessor,
    pub catalog: &'a dyn LineCatalog,
    pub selection: &'a dyn LineSelection,
    pub images: &'a dyn ImageSource,
}

/// Per-line score of the linearized model against the extracted data.
#[derive(Debug, Clone, PartialEq)]
pub struct LineDiagnostic {
    pub line: usize,
    pub reference_wavelength: f64,
    pub rms_error: f64,
    pub max_relative_error: f64,
}

/// Aggregate of configuration and fitted linear coefficients.
///
/// Constructed unparameterized, populated by `calculate_parameters`, or
/// restored directly from a persisted record.
#[derive(Debug, Clone, PartialEq)]
pub struct LsfModel {
    config: ModelConfig,
    params: Option<LinearParams>,
    reference_window: Option<LineWindow>,
}

impl LsfModel {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            params: None,
            reference_window: None,
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn params(&self) -> Option<&LinearParams> {
        self.params.as_ref()
    }

    fn extractor<'a>(&self, providers: &ProviderSet<'a>) -> WindowExtractor<'a> {
        WindowExtractor::new(
            providers.calibration,
            providers.catalog,
            providers.images,
            self.config.pose,
            self.config.slice,
            self.config.normal,
            self.config.flatfield,
        )
    }

    fn usable_range(&self, providers: &ProviderSet<'_>) -> (usize, usize) {
        (
            providers.selection.first_usable_line(self.config.slice),
            providers.selection.last_usable_line(self.config.slice),
        )
    }

    /// Run the linear-parameterization stage: extract and fit every usable
    /// catalog line, then fit each shape parameter's wavelength trend.
    ///
    /// Per-line failures follow `policy`; fewer than 2 successfully fitted
    /// lines is a fatal configuration error either way.
    pub fn calculate_parameters(
        &mut self,
        providers: &ProviderSet<'_>,
        policy: FitFailurePolicy,
    ) -> LsfResult<()> {
        let (first, last) = self.usable_range(providers);
        let extractor = self.extractor(providers);
        let names = self.config.shape.parameter_names();

        let mut line_wavelengths: Vec<f64> = Vec::new();
        let mut samples: Vec<Vec<f64>> = vec![Vec::new(); names.len()];

        for line in first..=last {
            let outcome = extractor
                .extract(line)
                .and_then(|window| fit_window(self.config.shape, &window).map(|fit| (window, fit)));
            let (window, fit) = match outcome {
                Ok(pair) => pair,
                Err(error) => match policy {
                    FitFailurePolicy::Abort => return Err(error),
                    FitFailurePolicy::SkipLine => {
                        tracing::warn!(
                            line,
                            slice = self.config.slice,
                            error = %error,
                            "skipping catalog line"
                        );
                        continue;
                    }
                },
            };
            line_wavelengths.push(window.reference_wavelength());
            for (values, name) in samples.iter_mut().zip(names) {
                values.push(fit.parameter(name)?);
            }
            tracing::info!(
                line,
                slice = self.config.slice,
                wavelength = window.reference_wavelength(),
                rms_error = fit.rms_error,
                "fitted catalog line"
            );
        }

        if line_wavelengths.len() < 2 {
            return Err(LsfError::insufficient_data(
                "PARAM.LINE_COUNT",
                format!(
                    "linear parameterization needs at least 2 fitted lines, got {} \
                     (usable range {first}..={last} on slice {})",
                    line_wavelengths.len(),
                    self.config.slice
                ),
            ));
        }

        let mut params = LinearParams::default();
        for (values, name) in samples.iter().zip(names) {
            let (slope, intercept) = linear_fit(&line_wavelengths, values).map_err(|source| {
                LsfError::insufficient_data(
                    "PARAM.LINEAR_FIT",
                    format!("linear fit of parameter '{name}' failed: {source}"),
                )
            })?;
            params.insert(*name, slope, intercept);
        }
        self.params = Some(params);
        Ok(())
    }

    /// Reconstruct the LSF profile from the linearized parameters: every
    /// shape parameter is evaluated at the line's reference wavelength, then
    /// the shape is sampled over the given offsets.
    pub fn evaluate_intensity(
        &self,
        reference_wavelength: f64,
        offsets: &[f64],
    ) -> LsfResult<Vec<f64>> {
        let params = self.params.as_ref().ok_or_else(|| {
            LsfError::input_validation(
                "MODEL.UNPARAMETERIZED",
                "model has no linear parameters; run calculate_parameters or load a record",
            )
        })?;
        match self.config.shape {
            ShapeKind::Gaussian => {
                let amplitude = params.evaluate("Amplitude", reference_wavelength)?;
                let mean = params.evaluate("Mean", reference_wavelength)?;
                let sigma = params.evaluate("Sigma", reference_wavelength)?;
                Ok(offsets
                    .iter()
                    .map(|x| gaussian_profile(*x, amplitude, mean, sigma))
                    .collect())
            }
            ShapeKind::Moffat => {
                let amplitude = params.evaluate("amplitude", reference_wavelength)?;
                let center = params.evaluate("center", reference_wavelength)?;
                let sigma = params.evaluate("sigma", reference_wavelength)?;
                let beta = params.evaluate("beta", reference_wavelength)?;
                Ok(offsets
                    .iter()
                    .map(|x| moffat_profile(*x, amplitude, center, sigma, beta))
                    .collect())
            }
        }
    }

    /// Extract and cache the window of the configured reference line for
    /// single-line diagnostics.
    pub fn load_reference_window(&mut self, providers: &ProviderSet<'_>) -> LsfResult<&LineWindow> {
        if self.reference_window.is_none() {
            let window = self.extractor(providers).extract(self.config.nb_line)?;
            self.reference_window = Some(window);
        }
        self.reference_window.as_ref().ok_or_else(|| {
            LsfError::internal(
                "MODEL.REFERENCE_WINDOW",
                "reference window missing after caching",
            )
        })
    }

    pub fn reference_window(&self) -> Option<&LineWindow> {
        self.reference_window.as_ref()
    }

    /// Score the linearized model against every usable catalog line.
    ///
    /// Per-line extraction failures follow `policy`, so lines skipped during
    /// parameterization stay skippable here.
    pub fn diagnostic_report(
        &self,
        providers: &ProviderSet<'_>,
        policy: FitFailurePolicy,
    ) -> LsfResult<Vec<LineDiagnostic>> {
        let (first, last) = self.usable_range(providers);
        let extractor = self.extractor(providers);
        let mut report = Vec::new();
        for line in first..=last {
            let window = match extractor.extract(line) {
                Ok(window) => window,
                Err(error) => match policy {
                    FitFailurePolicy::Abort => return Err(error),
                    FitFailurePolicy::SkipLine => {
                        tracing::warn!(
                            line,
                            slice = self.config.slice,
                            error = %error,
                            "skipping catalog line in diagnostics"
                        );
                        continue;
                    }
                },
            };
            let predicted =
                self.evaluate_intensity(window.reference_wavelength(), &window.offsets())?;
            report.push(LineDiagnostic {
                line,
                reference_wavelength: window.reference_wavelength(),
                rms_error: rms_error(window.intensities(), &predicted),
                max_relative_error: max_relative_error(window.intensities(), &predicted),
            });
        }
        Ok(report)
    }

    /// Persisted form. The model must be parameterized first.
    pub fn to_record(&self) -> LsfResult<ModelRecord> {
        let params = self.params.as_ref().ok_or_else(|| {
            LsfError::input_validation(
                "MODEL.UNPARAMETERIZED",
                "cannot persist a model without linear parameters",
            )
        })?;
        Ok(ModelRecord {
            name: self.config.shape.record_tag().to_string(),
            params_linear: params.clone(),
            pose: self.config.pose,
            slice: self.config.slice,
            config: self.config.config.clone(),
            det_id: self.config.det_id,
            nb_line: self.config.nb_line,
            normal: self.config.normal,
            flatfield: self.config.flatfield,
        })
    }

    /// Restore a model from its persisted record. The record's discriminator
    /// must match the expected shape kind exactly.
    pub fn from_record(record: &ModelRecord, expected: ShapeKind) -> LsfResult<Self> {
        if record.name != expected.record_tag() {
            return Err(LsfError::incompatible_model(
                "MODEL.RECORD_TAG",
                format!(
                    "record is tagged '{}' but '{}' was requested",
                    record.name,
                    expected.record_tag()
                ),
            ));
        }
        Ok(Self {
            config: ModelConfig {
                shape: expected,
                pose: record.pose,
                config: record.config.clone(),
                slice: record.slice,
                det_id: record.det_id,
                nb_line: record.nb_line,
                normal: record.normal,
                flatfield: record.flatfield,
            },
            params: Some(record.params_linear.clone()),
            reference_window: None,
        })
    }
}
