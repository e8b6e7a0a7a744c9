//! Consolidate and vacuum CLI commands

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use super::output::Output;
use crate::engine::{ArrayEngine, Backend, ConsolidationMode, FragmentConsolidation};

/// Fragment consolidation tuning
#[derive(Args, Debug)]
pub struct TuningArgs {
    /// Factor by which the consolidated fragment may exceed the union of its inputs
    #[arg(long, short = 'a', default_value_t = 1.0)]
    amplification: f64,

    /// Attribute buffer size in bytes
    #[arg(long, short = 'b', default_value_t = 50_000_000)]
    buffer_size: u64,

    /// Maximum number of fragments consolidated in one step
    #[arg(long, visible_alias = "max", default_value_t = u32::MAX)]
    step_max_frags: u32,

    /// Minimum number of fragments consolidated in one step
    #[arg(long, visible_alias = "min", default_value_t = u32::MAX)]
    step_min_frags: u32,

    /// Maximum size ratio between adjacent fragments in one step
    #[arg(long, short = 'r', default_value_t = 0.0)]
    step_size_ratio: f64,

    /// Number of consolidation steps
    #[arg(long, short = 's', default_value_t = u32::MAX)]
    steps: u32,
}

impl From<TuningArgs> for FragmentConsolidation {
    fn from(args: TuningArgs) -> Self {
        Self {
            amplification: args.amplification,
            buffer_size: args.buffer_size,
            step_max_frags: args.step_max_frags,
            step_min_frags: args.step_min_frags,
            step_size_ratio: args.step_size_ratio,
            steps: args.steps,
        }
    }
}

#[derive(Subcommand)]
pub enum ConsolidateCommands {
    /// Consolidate the fragments of an array
    Fragments {
        /// Array URI
        uri: String,

        #[command(flatten)]
        tuning: TuningArgs,

        /// Vacuum the consolidated fragments afterwards
        #[arg(long, short = 'v')]
        vacuum: bool,
    },

    /// Consolidate fragment metadata into a single file
    FragmentMetadata {
        /// Array URI
        uri: String,

        /// Vacuum the consolidated fragment metadata afterwards
        #[arg(long, short = 'v')]
        vacuum: bool,
    },

    /// Consolidate array metadata into a single file
    ArrayMetadata {
        /// Array URI
        uri: String,

        /// Vacuum the consolidated array metadata afterwards
        #[arg(long, short = 'v')]
        vacuum: bool,
    },
}

#[derive(Subcommand)]
pub enum VacuumCommands {
    /// Remove fragments that have been consolidated
    Fragments {
        /// Array URI
        uri: String,
    },

    /// Remove fragment metadata that has been consolidated
    FragmentMetadata {
        /// Array URI
        uri: String,
    },

    /// Remove array metadata that has been consolidated
    ArrayMetadata {
        /// Array URI
        uri: String,
    },
}

pub fn run_consolidate(cmd: ConsolidateCommands, engine: &dyn Backend, output: &Output) -> Result<()> {
    let (uri, mode, tuning, vacuum) = match cmd {
        ConsolidateCommands::Fragments {
            uri,
            tuning,
            vacuum,
        } => (uri, ConsolidationMode::Fragments, Some(FragmentConsolidation::from(tuning)), vacuum),
        ConsolidateCommands::FragmentMetadata { uri, vacuum } => {
            (uri, ConsolidationMode::FragmentMeta, None, vacuum)
        }
        ConsolidateCommands::ArrayMetadata { uri, vacuum } => {
            (uri, ConsolidationMode::ArrayMeta, None, vacuum)
        }
    };

    consolidate(engine, output, &uri, mode, tuning.as_ref())?;
    if vacuum {
        run_vacuum_mode(engine, output, &uri, mode)?;
    }
    Ok(())
}

pub fn run_vacuum(cmd: VacuumCommands, engine: &dyn Backend, output: &Output) -> Result<()> {
    let (uri, mode) = match cmd {
        VacuumCommands::Fragments { uri } => (uri, ConsolidationMode::Fragments),
        VacuumCommands::FragmentMetadata { uri } => (uri, ConsolidationMode::FragmentMeta),
        VacuumCommands::ArrayMetadata { uri } => (uri, ConsolidationMode::ArrayMeta),
    };

    run_vacuum_mode(engine, output, &uri, mode)
}

fn consolidate(
    engine: &dyn Backend,
    output: &Output,
    uri: &str,
    mode: ConsolidationMode,
    tuning: Option<&FragmentConsolidation>,
) -> Result<()> {
    let config = mode.consolidation_config(tuning);
    output.verbose_ctx("consolidate", &format!("{} with {:?}", uri, config));

    let result = engine
        .consolidate(uri, &config)
        .with_context(|| format!("Failed to consolidate {} of {}", mode.as_str(), uri))?;

    output.outcome(&result, &format!("Consolidated {} of {}", mode.as_str(), uri));
    Ok(())
}

fn run_vacuum_mode(
    engine: &dyn Backend,
    output: &Output,
    uri: &str,
    mode: ConsolidationMode,
) -> Result<()> {
    let result = engine
        .vacuum(uri, &mode.vacuum_config())
        .with_context(|| format!("Failed to vacuum {} of {}", mode.as_str(), uri))?;

    output.outcome(&result, &format!("Vacuumed {} of {}", mode.as_str(), uri));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(subcommand)]
        cmd: ConsolidateCommands,
    }

    #[test]
    fn tuning_defaults_match_engine_defaults() {
        let harness = Harness::try_parse_from(["test", "fragments", "arr"]).unwrap();
        match harness.cmd {
            ConsolidateCommands::Fragments { tuning, vacuum, .. } => {
                assert!(!vacuum);
                assert_eq!(
                    FragmentConsolidation::from(tuning),
                    FragmentConsolidation::default()
                );
            }
            _ => panic!("expected fragments"),
        }
    }

    #[test]
    fn tuning_aliases() {
        let harness = Harness::try_parse_from([
            "test", "fragments", "arr", "--max", "4", "--min", "2", "-a", "1.5", "-v",
        ])
        .unwrap();
        match harness.cmd {
            ConsolidateCommands::Fragments { tuning, vacuum, .. } => {
                let tuning = FragmentConsolidation::from(tuning);
                assert!(vacuum);
                assert_eq!(tuning.step_max_frags, 4);
                assert_eq!(tuning.step_min_frags, 2);
                assert_eq!(tuning.amplification, 1.5);
            }
            _ => panic!("expected fragments"),
        }
    }
}
