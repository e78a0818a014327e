//! The command line interface for the simulation.
use crate::input::load_model;
use crate::log;
use crate::settings::Settings;
use crate::simulation;
use crate::technology_database::GlobalTechnologyDatabase;
use crate::units::Money;
use ::log::info;
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the simulation.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options for the run command
#[derive(Args, Default)]
pub struct RunOpts {
    /// Directory for log files
    #[arg(short, long)]
    pub log_dir: Option<PathBuf>,
    /// Stop the run if observed outputs cannot be reproduced
    #[arg(long)]
    pub require_calibration: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run a simulation model.
    Run {
        /// Path to the model directory.
        model_dir: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Validate a model.
    Validate {
        /// The path to the model directory.
        model_dir: PathBuf,
    },
    /// Manage program settings.
    Settings {
        /// The available subcommands for managing settings.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { model_dir, opts } => handle_run_command(&model_dir, &opts, None),
            Self::Validate { model_dir } => handle_validate_command(&model_dir, None),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and run the requested command
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Use the given settings, or read them from the settings file
fn settings_or_load(settings: Option<Settings>) -> Result<Settings> {
    match settings {
        Some(settings) => Ok(settings),
        None => Settings::load().context("Failed to load settings."),
    }
}

/// Handle the `run` command.
///
/// Log files are written to `opts.log_dir` if it is given, creating it if needed.
pub fn handle_run_command(
    model_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let mut settings = settings_or_load(settings)?;
    settings.require_calibration |= opts.require_calibration;

    if let Some(log_dir) = &opts.log_dir {
        fs::create_dir_all(log_dir).with_context(|| {
            format!("Failed to create log directory: {}", log_dir.display())
        })?;
    }

    log::init(Some(&settings.log_level), opts.log_dir.as_deref())
        .context("Failed to initialise logging.")?;

    let (mut model, database) = load_model(model_path).context("Failed to load model.")?;
    info!("Loaded model from {}", model_path.display());
    let database = GlobalTechnologyDatabase::install(database)?;
    info!("Using {} technology templates", database.len());

    let outcomes = simulation::run(&mut model, &settings)?;
    let shortfall: Money = outcomes.iter().map(|outcome| outcome.shortfall).sum();
    info!("Simulation complete! Unplaced investment over the run: {shortfall}");

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(model_path: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = settings_or_load(settings)?;

    // No log files are written when validating
    log::init(Some(&settings.log_level), None).context("Failed to initialise logging.")?;

    let (model, database) = load_model(model_path).context("Failed to validate model.")?;
    info!(
        "Model is valid: sector {} has {} subsectors over {} periods, using {} technology \
        templates",
        model.sector.id(),
        model.sector.subsectors().len(),
        model.horizon.len(),
        database.len()
    );

    Ok(())
}
