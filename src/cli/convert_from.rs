//! Convert-from CLI commands

use anyhow::{Context, Result};
use clap::Subcommand;

use super::output::Output;
use crate::domain::{combine_assignments, coords_filters, parse_kwargs, split_special};
use crate::engine::{ArrayEngine, Backend, CsvIngestion};

const ATTR_FILTERS: [&str; 2] = ["--attr-filters", "-A"];
const DIM_FILTERS: [&str; 2] = ["--dim-filters", "-D"];
const COORDS_FILTERS: [&str; 2] = ["--coords-filters", "-C"];

#[derive(Subcommand)]
pub enum ConvertFromCommands {
    /// Ingest a CSV file into a new or existing array
    ///
    /// Any further `--name value` pairs are passed to the engine as
    /// ingestion options, e.g. `--sparse True --tile __tiledb_rows:2`.
    /// Filter flags take `Filter[=level],...` lists, optionally prefixed
    /// with `column:` and separated by `;`.
    #[command(after_help = "Filter flags: --attr-filters/-A, --dim-filters/-D, --coords-filters/-C")]
    Csv {
        /// CSV file to read
        csv_file: String,

        /// Array URI to write
        uri: String,

        /// Ingestion options as `--name value` pairs
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "KWARGS")]
        kwargs: Vec<String>,
    },
}

pub fn run(cmd: ConvertFromCommands, engine: &dyn Backend, output: &Output) -> Result<()> {
    match cmd {
        ConvertFromCommands::Csv {
            csv_file,
            uri,
            kwargs,
        } => from_csv(engine, output, &csv_file, &uri, &kwargs),
    }
}

fn from_csv(
    engine: &dyn Backend,
    output: &Output,
    csv_file: &str,
    uri: &str,
    tokens: &[String],
) -> Result<()> {
    let ingestion = build_ingestion(tokens)?;
    output.verbose_ctx(
        "kwargs",
        &serde_json::Value::Object(ingestion.to_kwargs()).to_string(),
    );

    let result = engine
        .from_csv(csv_file, uri, &ingestion)
        .with_context(|| format!("Failed to ingest {} into {}", csv_file, uri))?;

    output.outcome(&result, &format!("Ingested {} into {}", csv_file, uri));
    Ok(())
}

fn build_ingestion(tokens: &[String]) -> Result<CsvIngestion> {
    let special_flags: Vec<&str> = ATTR_FILTERS
        .iter()
        .chain(&DIM_FILTERS)
        .chain(&COORDS_FILTERS)
        .copied()
        .collect();

    let (rest, special) =
        split_special(tokens, &special_flags).context("Failed to parse keyword arguments")?;

    let values_for = |names: &[&str]| -> Vec<String> {
        special
            .iter()
            .filter(|(flag, _)| names.contains(&flag.as_str()))
            .map(|(_, value)| value.clone())
            .collect()
    };

    Ok(CsvIngestion {
        kwargs: parse_kwargs(&rest).context("Failed to parse keyword arguments")?,
        attr_filters: combine_assignments(ATTR_FILTERS[0], &values_for(&ATTR_FILTERS))?,
        dim_filters: combine_assignments(DIM_FILTERS[0], &values_for(&DIM_FILTERS))?,
        coords_filters: coords_filters(COORDS_FILTERS[0], &values_for(&COORDS_FILTERS))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FilterAssignment, FilterError, FilterKind, KwargsError, Value};

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn plain_kwargs_and_filters() {
        let ingestion = build_ingestion(&tokens(&[
            "--sparse",
            "True",
            "-A",
            "GzipFilter=9",
            "--coords-filters",
            "ZstdFilter",
        ]))
        .unwrap();

        assert_eq!(ingestion.kwargs["sparse"], Value::Bool(true));
        assert!(matches!(ingestion.attr_filters, Some(FilterAssignment::All(_))));
        assert!(ingestion.dim_filters.is_none());
        assert_eq!(
            ingestion.coords_filters.unwrap()[0].kind,
            FilterKind::Zstd
        );
    }

    #[test]
    fn repeated_named_filters_merge() {
        let ingestion = build_ingestion(&tokens(&[
            "--attr-filters",
            "a:LZ4Filter",
            "--attr-filters",
            "b:DoubleDeltaFilter",
        ]))
        .unwrap();

        match ingestion.attr_filters {
            Some(FilterAssignment::PerColumn(columns)) => {
                assert_eq!(columns.keys().collect::<Vec<_>>(), vec!["a", "b"]);
            }
            other => panic!("expected per-column filters, got {:?}", other),
        }
    }

    #[test]
    fn errors_keep_their_type() {
        let err = build_ingestion(&tokens(&["sparse", "True"])).unwrap_err();
        assert!(err.chain().any(|c| c.is::<KwargsError>()));

        let err = build_ingestion(&tokens(&["-D", "NoSuchFilter"])).unwrap_err();
        assert!(err.is::<FilterError>());
    }
}
