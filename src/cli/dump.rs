//! Dump CLI commands

use anyhow::{Context, Result};
use clap::Subcommand;
use serde_json::Value as Json;

use super::output::Output;
use super::UsageError;
use crate::domain::{parse_selection, to_unix_time, Selection};
use crate::engine::{ArrayEngine, Backend, QuerySpec};

#[derive(Subcommand)]
pub enum DumpCommands {
    /// Print the contents of an array
    Array {
        /// Array URI
        uri: String,

        /// One selection per dimension: a point (`5`) or a slice (`1:10`, `:`)
        selection: Vec<String>,

        /// Attribute to print (repeatable; default all)
        #[arg(long = "attribute", short = 'A')]
        attributes: Vec<String>,

        /// Dimension the selections apply to (repeatable; default all)
        #[arg(long = "dimension", short = 'd')]
        dimensions: Vec<String>,

        /// Open the array at this time (UNIX seconds or a date)
        #[arg(long, short = 't')]
        timestamp: Option<String>,
    },

    /// Print the default engine configuration
    Config,

    /// Print the minimum bounding rectangles of an array's fragments
    Mbrs {
        /// Array URI
        uri: String,

        /// Only the fragment at this index
        #[arg(long, short = 'i')]
        index: Option<usize>,
    },

    /// Print the array's metadata
    Metadata {
        /// Array URI
        uri: String,
    },

    /// Print the non-empty domain of an array
    NonemptyDomain {
        /// Array URI
        uri: String,
    },

    /// Print the array's schema
    Schema {
        /// Array URI
        uri: String,
    },

    /// Print fragment information
    Fragments {
        /// Array URI
        uri: String,

        /// Only the fragment at this index
        #[arg(long, short = 'i')]
        index: Option<usize>,

        /// Print the number of fragments instead
        #[arg(long = "number", short = 'n')]
        count: bool,
    },
}

pub fn run(cmd: DumpCommands, engine: &dyn Backend, output: &Output) -> Result<()> {
    match cmd {
        DumpCommands::Array {
            uri,
            selection,
            attributes,
            dimensions,
            timestamp,
        } => dump_array(
            engine,
            output,
            &uri,
            &selection,
            attributes,
            dimensions,
            timestamp.as_deref(),
        ),
        DumpCommands::Config => {
            output.value(&engine.config()?);
            Ok(())
        }
        DumpCommands::Mbrs { uri, index } => dump_mbrs(engine, output, &uri, index),
        DumpCommands::Metadata { uri } => {
            output.value(&engine.metadata(&uri)?);
            Ok(())
        }
        DumpCommands::NonemptyDomain { uri } => {
            output.value(&engine.nonempty_domain(&uri)?);
            Ok(())
        }
        DumpCommands::Schema { uri } => {
            output.value(&engine.schema(&uri)?);
            Ok(())
        }
        DumpCommands::Fragments { uri, index, count } => {
            dump_fragments(engine, output, &uri, index, count)
        }
    }
}

fn dump_array(
    engine: &dyn Backend,
    output: &Output,
    uri: &str,
    selection: &[String],
    attributes: Vec<String>,
    dimensions: Vec<String>,
    timestamp: Option<&str>,
) -> Result<()> {
    let selection = selection
        .iter()
        .map(|s| parse_selection(s).with_context(|| format!("Invalid selection '{}'", s)))
        .collect::<Result<Vec<Selection>>>()?;

    let dims = if dimensions.is_empty() {
        engine.dimension_names(uri)?
    } else {
        dimensions
    };

    if selection.len() != dims.len() {
        return Err(UsageError::new(format!(
            "The number of selections ({}) needs to match the number of dimensions ({})",
            selection.len(),
            dims.len()
        ))
        .into());
    }

    let timestamp = timestamp
        .map(|t| to_unix_time(t).context("Invalid --timestamp"))
        .transpose()?;

    let spec = QuerySpec {
        attrs: (!attributes.is_empty()).then_some(attributes),
        dims,
        selection,
        timestamp,
    };
    output.verbose_ctx("query", &format!("{} with {} selection(s)", uri, spec.selection.len()));

    output.value(&engine.query(uri, &spec)?);
    Ok(())
}

fn dump_fragments(
    engine: &dyn Backend,
    output: &Output,
    uri: &str,
    index: Option<usize>,
    count: bool,
) -> Result<()> {
    let info = engine.array_fragments(uri, false)?;
    let fragments = fragment_entries(&info);

    if count {
        let n = fragments.map_or(0, |f| f.len());
        output.data(&n);
        return Ok(());
    }

    match index {
        Some(i) => output.value(pick(fragments.unwrap_or_default(), i, "fragment")?),
        None => output.value(&info),
    }
    Ok(())
}

fn dump_mbrs(engine: &dyn Backend, output: &Output, uri: &str, index: Option<usize>) -> Result<()> {
    let info = engine.array_fragments(uri, true)?;

    let mbrs = info
        .get("mbrs")
        .and_then(Json::as_array)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| anyhow::anyhow!("no MBRs found in the given array"))?;

    match index {
        Some(i) => output.value(pick(mbrs, i, "fragment")?),
        None => output.data(mbrs),
    }
    Ok(())
}

/// Fragment entries from an engine reply: a bare list or `{"fragments": [...]}`
fn fragment_entries(info: &Json) -> Option<&[Json]> {
    match info {
        Json::Array(items) => Some(items.as_slice()),
        Json::Object(map) => map
            .get("fragments")
            .and_then(Json::as_array)
            .map(Vec::as_slice),
        _ => None,
    }
}

fn pick<'a>(items: &'a [Json], index: usize, what: &str) -> Result<&'a Json> {
    items.get(index).ok_or_else(|| {
        UsageError::new(format!(
            "{} index {} is out of range (array has {})",
            what,
            index,
            items.len()
        ))
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fragment_entries_accepts_both_shapes() {
        let bare = json!([{"uri": "a"}, {"uri": "b"}]);
        assert_eq!(fragment_entries(&bare).map(<[Json]>::len), Some(2));

        let wrapped = json!({"fragments": [{"uri": "a"}], "mbrs": []});
        assert_eq!(fragment_entries(&wrapped).map(<[Json]>::len), Some(1));

        assert!(fragment_entries(&json!("nope")).is_none());
    }

    #[test]
    fn pick_out_of_range_is_a_usage_error() {
        let items = vec![json!(1)];
        assert_eq!(pick(&items, 0, "fragment").unwrap(), &json!(1));

        let err = pick(&items, 3, "fragment").unwrap_err();
        assert!(err.is::<UsageError>());
        assert!(err.to_string().contains("index 3"));
    }
}
