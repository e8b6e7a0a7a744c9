//! Main CLI application structure

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{cloud, consolidate, convert_from, dump, fragments, versions};
use crate::config::Config;
use crate::engine::{self, Backend, EngineError, EngineRequest, EngineResponse};

#[derive(Parser)]
#[command(name = "tiledb")]
#[command(author, version, about = "Command-line front-end to the TileDB array storage engine")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the configured format)
    ///
    /// Top-level flags go before the subcommand, so `convert-from csv`
    /// can pass `--format`/`--debug` through to the engine.
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// Print diagnostic output on stderr
    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Output information about arrays
    #[command(subcommand)]
    Dump(dump::DumpCommands),

    /// Convert other formats into arrays
    #[command(subcommand)]
    ConvertFrom(convert_from::ConvertFromCommands),

    /// Consolidate array fragments or metadata
    #[command(subcommand)]
    Consolidate(consolidate::ConsolidateCommands),

    /// Vacuum already consolidated fragments or metadata
    #[command(subcommand)]
    Vacuum(consolidate::VacuumCommands),

    /// Copy or delete ranges of array fragments
    #[command(subcommand)]
    Fragments(fragments::FragmentsCommands),

    /// Work with TileDB Cloud
    #[command(subcommand)]
    Cloud(cloud::CloudCommands),

    /// Show version information
    #[command(subcommand)]
    Versions(versions::VersionsCommands),
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    let output = Output::new(cli.format.unwrap_or(config.default_format), cli.debug);

    if let Some(path) = Config::config_path() {
        output.verbose_ctx("config", &format!("Config file: {}", path.display()));
    }

    let inner = engine::connect(&config.engine);
    output.verbose_ctx("engine", &format!("Using {}", inner.describe()));
    let backend = Traced {
        inner: inner.as_ref(),
        output: &output,
    };

    match cli.command {
        Commands::Dump(cmd) => dump::run(cmd, &backend, &output)?,
        Commands::ConvertFrom(cmd) => convert_from::run(cmd, &backend, &output)?,
        Commands::Consolidate(cmd) => consolidate::run_consolidate(cmd, &backend, &output)?,
        Commands::Vacuum(cmd) => consolidate::run_vacuum(cmd, &backend, &output)?,
        Commands::Fragments(cmd) => fragments::run(cmd, &backend, &output)?,
        Commands::Cloud(cmd) => cloud::run(cmd, &backend, &config.cloud, &output)?,
        Commands::Versions(cmd) => versions::run(cmd, &backend, &output)?,
    }

    output.verbose("Command completed successfully");
    Ok(())
}

/// Logs every engine request before passing it on
struct Traced<'a> {
    inner: &'a dyn Backend,
    output: &'a Output,
}

impl Backend for Traced<'_> {
    fn execute(&self, request: &EngineRequest) -> Result<EngineResponse, EngineError> {
        // Params may carry credentials
        self.output
            .verbose_ctx("engine", &format!("-> {}", request.operation));
        let response = self.inner.execute(request)?;
        self.output.verbose_ctx(
            "engine",
            &format!("<- {}", if response.success { "ok" } else { "error" }),
        );
        Ok(response)
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }
}
