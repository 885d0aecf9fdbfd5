use std::fmt::{Display, Formatter};

/// Failure taxonomy shared across the pipeline.
///
/// Every stage raises synchronously and nothing is retried: calibration
/// inputs are static files, so a failure is deterministic and the remedy is
/// operator intervention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LsfErrorCategory {
    InputValidation,
    IoSystem,
    DataShape,
    EmptyWindow,
    FitConvergence,
    InsufficientData,
    IncompatibleModel,
    Internal,
}

impl LsfErrorCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputValidation => "INPUT_VALIDATION",
            Self::IoSystem => "IO_SYSTEM",
            Self::DataShape => "DATA_SHAPE",
            Self::EmptyWindow => "EMPTY_WINDOW",
            Self::FitConvergence => "FIT_CONVERGENCE",
            Self::InsufficientData => "INSUFFICIENT_DATA",
            Self::IncompatibleModel => "INCOMPATIBLE_MODEL",
            Self::Internal => "INTERNAL",
        }
    }

    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InputValidation => 1,
            Self::IoSystem => 2,
            Self::DataShape => 3,
            Self::EmptyWindow | Self::FitConvergence | Self::InsufficientData => 4,
            Self::IncompatibleModel => 5,
            Self::Internal => 70,
        }
    }
}

impl Display for LsfErrorCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Shared error type carried through every `LsfResult`.
///
/// The placeholder is a stable dotted code naming the failing site
/// (`IO.IMAGE_READ`, `FIT.CONVERGENCE`, ...); the message is free-form
/// diagnostic text for the operator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("[{placeholder}] {message}")]
pub struct LsfError {
    category: LsfErrorCategory,
    placeholder: String,
    message: String,
}

pub type LsfResult<T> = Result<T, LsfError>;

impl LsfError {
    fn new(
        category: LsfErrorCategory,
        placeholder: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder: placeholder.into(),
            message: message.into(),
        }
    }

    pub fn input_validation(placeholder: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(LsfErrorCategory::InputValidation, placeholder, message)
    }

    pub fn io_system(placeholder: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(LsfErrorCategory::IoSystem, placeholder, message)
    }

    pub fn data_shape(placeholder: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(LsfErrorCategory::DataShape, placeholder, message)
    }

    pub fn empty_window(placeholder: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(LsfErrorCategory::EmptyWindow, placeholder, message)
    }

    pub fn fit_convergence(placeholder: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(LsfErrorCategory::FitConvergence, placeholder, message)
    }

    pub fn insufficient_data(placeholder: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(LsfErrorCategory::InsufficientData, placeholder, message)
    }

    pub fn incompatible_model(placeholder: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(LsfErrorCategory::IncompatibleModel, placeholder, message)
    }

    pub fn internal(placeholder: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(LsfErrorCategory::Internal, placeholder, message)
    }

    pub fn category(&self) -> LsfErrorCategory {
        self.category
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("{}: [{}] {}", self.category, self.placeholder, self.message)
    }
}
