//! Version CLI commands

use anyhow::Result;
use clap::Subcommand;

use super::output::Output;
use crate::engine::{ArrayEngine, Backend};

#[derive(Subcommand)]
pub enum VersionsCommands {
    /// Show the version of this tool
    Cli,

    /// Show the version of the bridge's array library bindings
    Bridge,

    /// Show the version of the embedded native library
    Embedded,
}

pub fn run(cmd: VersionsCommands, engine: &dyn Backend, output: &Output) -> Result<()> {
    match cmd {
        VersionsCommands::Cli => output.value(&serde_json::json!(env!("CARGO_PKG_VERSION"))),
        VersionsCommands::Bridge => output.value(&engine.version()?),
        VersionsCommands::Embedded => output.value(&engine.embedded_version()?),
    }
    Ok(())
}
