//! Command line interface: run or validate a building stock model, or work with the bundled demos.
use crate::log;
use crate::model::Model;
use crate::output::{create_output_directory, get_output_dir};
use crate::settings::Settings;
use crate::simulation;
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod example;
use example::ExampleSubcommands;

/// Building stock turnover model
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    /// Print the CLI documentation as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate each vintage of a model and write the results.
    Run {
        /// Folder containing `model.toml` and `rates.csv`.
        model_dir: PathBuf,
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Check that a model loads, without simulating it.
    Validate {
        /// Folder containing `model.toml` and `rates.csv`.
        model_dir: PathBuf,
    },
    /// List, describe, extract or run the bundled demo models.
    Example {
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
}

/// Options for a simulation run
#[derive(Args, Default)]
pub struct RunOpts {
    /// Folder for results. Defaults to `bstock_results/<model name>`.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Replace the results folder if it already has files in it
    #[arg(long)]
    pub overwrite: bool,
    /// Also write the retrofit-eligible floor space for every year
    #[arg(long)]
    pub debug_model: bool,
}

impl RunOpts {
    /// Where results for `model_path` go
    fn output_dir(&self, model_path: &Path) -> Result<PathBuf> {
        match &self.output_dir {
            Some(dir) => Ok(dir.clone()),
            None => get_output_dir(model_path),
        }
    }
}

/// Parse CLI arguments and start the program
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    match cli.command {
        Some(Commands::Run { model_dir, opts }) => handle_run_command(&model_dir, &opts, None),
        Some(Commands::Validate { model_dir }) => handle_validate_command(&model_dir, None),
        Some(Commands::Example { subcommand }) => subcommand.execute(),
        None => {
            println!("{}", Cli::command().render_long_help());
            Ok(())
        }
    }
}

/// Use the given settings, or read them from the settings file
fn settings_or_load(settings: Option<Settings>) -> Result<Settings> {
    settings.map_or_else(|| Settings::load().context("Failed to load settings."), Ok)
}

/// Handle the `run` command.
///
/// Command-line flags can switch on `overwrite` and `debug_model` but not switch them off.
pub fn handle_run_command(
    model_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = settings_or_load(settings)?;
    let output_path = opts.output_dir(model_path)?;
    let replaced = create_output_directory(&output_path, opts.overwrite || settings.overwrite)
        .with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;

    log::init(Some(settings.log_level.as_str()), Some(&output_path))
        .context("Failed to initialise logging.")?;

    // Logged late, as there was no logger when the folder was cleared
    if replaced {
        warn!("Replaced existing output folder {}", output_path.display());
    }

    let model = Model::from_path(model_path).context("Failed to load model.")?;
    info!(
        "Loaded model from {}: {} vintage(s) from {} to {}",
        model_path.display(),
        model.parameters.vintage_end_years.len(),
        model.parameters.start_year,
        model.parameters.end_year()
    );
    info!("Writing results to {}", output_path.display());

    let ledger = simulation::run(
        &model,
        &output_path,
        opts.debug_model || settings.debug_model,
    )?;
    info!("Simulation complete: {} vintage(s) closed", ledger.len());

    Ok(())
}

/// Handle the `validate` command. No log file is written.
pub fn handle_validate_command(model_path: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = settings_or_load(settings)?;
    log::init(Some(settings.log_level.as_str()), None).context("Failed to initialise logging.")?;

    let model = Model::from_path(model_path).context("Failed to validate model.")?;
    info!(
        "Model is valid: {} vintage(s) from {} to {}",
        model.parameters.vintage_end_years.len(),
        model.parameters.start_year,
        model.parameters.end_year()
    );

    Ok(())
}
