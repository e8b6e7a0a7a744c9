//! Fragment copy/delete CLI commands

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use super::output::Output;
use super::prompt;
use crate::domain::to_unix_time;
use crate::engine::{ArrayEngine, Backend, FragmentRange};

const POWER_USER_STATEMENT: &str = "This is a power command intended for advanced users only. \
    Enter yes to acknowledge this statement and continue or no to abort. \
    Pass the --force/-f flag to bypass this prompt in the future.";

/// Time range and switches shared by copy and delete
#[derive(Args, Debug)]
pub struct RangeArgs {
    /// Start of the range (UNIX seconds or a date)
    time_start: String,

    /// End of the range, inclusive (UNIX seconds or a date)
    time_end: String,

    /// Print the fragments being processed
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Only print what would be done
    #[arg(long, short = 'n')]
    dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(long, short = 'f')]
    force: bool,
}

impl RangeArgs {
    fn to_range(&self) -> Result<FragmentRange> {
        let start = to_unix_time(&self.time_start).context("Invalid TIME_START")?;
        let end = to_unix_time(&self.time_end).context("Invalid TIME_END")?;

        Ok(FragmentRange {
            start,
            end,
            verbose: self.verbose,
            dry_run: self.dry_run,
        })
    }
}

#[derive(Subcommand)]
pub enum FragmentsCommands {
    /// Copy a range of fragments into a new or existing array
    Copy {
        /// Source array URI
        uri_src: String,

        /// Destination array URI
        uri_dst: String,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Delete a range of fragments from an array
    Delete {
        /// Array URI
        uri: String,

        #[command(flatten)]
        range: RangeArgs,
    },
}

pub fn run(cmd: FragmentsCommands, engine: &dyn Backend, output: &Output) -> Result<()> {
    match cmd {
        FragmentsCommands::Copy {
            uri_src,
            uri_dst,
            range,
        } => {
            let fragments = range.to_range()?;
            if !range.force && !prompt::confirm(POWER_USER_STATEMENT)? {
                output.verbose_ctx("fragments", "Aborted by user");
                return Ok(());
            }

            let result = engine
                .create_array_from_fragments(&uri_src, &uri_dst, &fragments)
                .with_context(|| format!("Failed to copy fragments from {}", uri_src))?;
            output.outcome(
                &result,
                &format!(
                    "Copied fragments {}..={} from {} to {}",
                    fragments.start, fragments.end, uri_src, uri_dst
                ),
            );
        }
        FragmentsCommands::Delete { uri, range } => {
            let fragments = range.to_range()?;
            if !range.force && !prompt::confirm(POWER_USER_STATEMENT)? {
                output.verbose_ctx("fragments", "Aborted by user");
                return Ok(());
            }

            let result = engine
                .delete_fragments(&uri, &fragments)
                .with_context(|| format!("Failed to delete fragments from {}", uri))?;
            output.outcome(
                &result,
                &format!(
                    "Deleted fragments {}..={} from {}",
                    fragments.start, fragments.end, uri
                ),
            );
        }
    }

    Ok(())
}
