//! # Command-Line Interface
//!
//! User-facing commands and output formatting. Every command parses its
//! arguments, makes one or two engine calls, and prints the result.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Dump | Inspect arrays | `dump schema`, `dump array`, `dump fragments` |
//! | Convert | Ingest files | `convert-from csv` |
//! | Maintenance | Fragment housekeeping | `consolidate fragments`, `vacuum fragments` |
//! | Fragments | Time-range surgery | `fragments copy`, `fragments delete` |
//! | Cloud | TileDB Cloud | `cloud login`, `cloud dump arrays`, `cloud share` |
//! | Versions | Version info | `versions cli`, `versions embedded` |
//!
//! ## Output Formats
//!
//! All commands support the `--format` flag, given before the subcommand:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Diagnostics
//!
//! Use `--debug` to trace configuration, engine requests and parsed
//! keyword arguments on stderr.
//!
//! ## Exit Codes
//!
//! `0` on success, `2` for usage errors (see [`exit_code`]), `1` for
//! everything else.

mod app;
mod cloud;
mod consolidate;
mod convert_from;
mod dump;
mod fragments;
mod output;
mod prompt;
mod versions;

use thiserror::Error;

use crate::domain::{FilterError, KwargsError, SelectionError, TimestampError};

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};

/// A command was invoked with arguments it cannot use
#[derive(Debug, Error)]
#[error("{0}")]
pub struct UsageError(pub String);

impl UsageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Maps an error to the process exit code
pub fn exit_code(err: &anyhow::Error) -> u8 {
    let is_usage = err.chain().any(|cause| {
        cause.is::<UsageError>()
            || cause.is::<KwargsError>()
            || cause.is::<FilterError>()
            || cause.is::<SelectionError>()
            || cause.is::<TimestampError>()
    });

    if is_usage {
        2
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn usage_errors_exit_with_two() {
        let err = anyhow::Error::new(UsageError::new("bad"));
        assert_eq!(exit_code(&err), 2);

        let err: anyhow::Error = Err::<(), _>(KwargsError::MalformedOption("x".to_string()))
            .context("Failed to parse keyword arguments")
            .unwrap_err();
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn other_errors_exit_with_one() {
        let err = anyhow::anyhow!("bridge crashed");
        assert_eq!(exit_code(&err), 1);
    }
}
