mod commands;
mod helpers;

use clap::Parser;
use lsf_core::domain::LsfError;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().collect();
    match parse_and_dispatch(args) {
        Ok(code) => code,
        Err(error) => {
            let compute_error = error.as_lsf_error();
            eprintln!("{}", compute_error.diagnostic_line());
            compute_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("lsffit".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(name = "lsffit", about = "Per-slice LSF model fitting and evaluation")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Fit an LSF model over the usable catalog-line range and persist it
    Fit(commands::FitArgs),
    /// Score a persisted model against extracted calibration data
    Evaluate(commands::EvaluateArgs),
    /// Print a persisted model record
    Show(commands::ShowArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Fit(args) => commands::run_fit_command(args),
        CliCommand::Evaluate(args) => commands::run_evaluate_command(args),
        CliCommand::Show(args) => commands::run_show_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(LsfError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<LsfError> for CliError {
    fn from(error: LsfError) -> Self {
        Self::Compute(error)
    }
}

impl CliError {
    fn as_lsf_error(&self) -> LsfError {
        match self {
            Self::Usage(message) => LsfError::input_validation("INPUT.CLI_USAGE", message.clone()),
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => LsfError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
