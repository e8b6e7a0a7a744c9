//! Filter-list arguments for `convert-from csv`
//!
//! The filter flags do not go through the generic keyword grammar. Their
//! values are either a list applied to every column,
//!
//! ```text
//! GzipFilter=9,BitShuffleFilter
//! ```
//!
//! or per-column lists separated by `;`:
//!
//! ```text
//! a:LZ4Filter=10,BitShuffleFilter;b:DoubleDeltaFilter,PositiveDeltaFilter=3
//! ```
//!
//! A flag carrying an unnamed list may only appear once; repeated flags
//! must name their columns and are merged (later columns win).

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("Saw the following bad <filter names>: {}", .0.join(", "))]
    UnknownFilters(Vec<String>),

    #[error("Invalid filter level in '{0}': expected <filter name>=<int>")]
    InvalidLevel(String),

    #[error("Too many arguments provided in '{0}'")]
    TooManyParts(String),

    #[error("Cannot mix named and unnamed filter lists in '{0}'")]
    MixedEntries(String),

    #[error(
        "The {0} flag can only be used once if using only a <filter list> argument. \
         Multiple uses of the flag require <name>:<filter list> arguments."
    )]
    AmbiguousRepeat(String),

    #[error("The {0} flag only accepts a <filter list> argument")]
    NamedNotAllowed(String),
}

/// A compression or transform filter known to the array engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Gzip,
    Zstd,
    Lz4,
    Bzip2,
    Rle,
    DoubleDelta,
    BitShuffle,
    ByteShuffle,
    BitWidthReduction,
    PositiveDelta,
}

impl FilterKind {
    pub const ALL: [FilterKind; 10] = [
        FilterKind::Gzip,
        FilterKind::Zstd,
        FilterKind::Lz4,
        FilterKind::Bzip2,
        FilterKind::Rle,
        FilterKind::DoubleDelta,
        FilterKind::BitShuffle,
        FilterKind::ByteShuffle,
        FilterKind::BitWidthReduction,
        FilterKind::PositiveDelta,
    ];

    /// Name as accepted on the command line and by the engine
    pub fn name(&self) -> &'static str {
        match self {
            FilterKind::Gzip => "GzipFilter",
            FilterKind::Zstd => "ZstdFilter",
            FilterKind::Lz4 => "LZ4Filter",
            FilterKind::Bzip2 => "Bzip2Filter",
            FilterKind::Rle => "RleFilter",
            FilterKind::DoubleDelta => "DoubleDeltaFilter",
            FilterKind::BitShuffle => "BitShuffleFilter",
            FilterKind::ByteShuffle => "ByteShuffleFilter",
            FilterKind::BitWidthReduction => "BitWidthReductionFilter",
            FilterKind::PositiveDelta => "PositiveDeltaFilter",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterKind {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| FilterError::UnknownFilters(vec![s.to_string()]))
    }
}

impl Serialize for FilterKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// One filter with an optional level (`GzipFilter=9`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Filter {
    #[serde(rename = "name")]
    pub kind: FilterKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<i32>,
}

pub type FilterList = Vec<Filter>;

/// Filters for every column, or per named column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FilterAssignment {
    All(FilterList),
    PerColumn(BTreeMap<String, FilterList>),
}

/// Parses `Name[=level],Name[=level],...`
pub fn parse_filter_list(text: &str) -> Result<FilterList, FilterError> {
    let mut filters = Vec::new();
    let mut unknown = Vec::new();

    for item in text.split(',') {
        let item = item.trim();
        let (name, level) = match item.split_once('=') {
            Some((name, level)) => {
                let level = level
                    .trim()
                    .parse::<i32>()
                    .map_err(|_| FilterError::InvalidLevel(item.to_string()))?;
                (name.trim(), Some(level))
            }
            None => (item, None),
        };

        match name.parse::<FilterKind>() {
            Ok(kind) => filters.push(Filter { kind, level }),
            Err(_) => unknown.push(name.to_string()),
        }
    }

    if !unknown.is_empty() {
        unknown.sort();
        unknown.dedup();
        return Err(FilterError::UnknownFilters(unknown));
    }

    Ok(filters)
}

/// Parses one filter flag value, named or unnamed
pub fn parse_filter_assignment(text: &str) -> Result<FilterAssignment, FilterError> {
    let entries: Vec<&str> = text.split(';').filter(|e| !e.trim().is_empty()).collect();

    match entries.as_slice() {
        [] => return Err(FilterError::UnknownFilters(vec![text.to_string()])),
        [single] if !single.contains(':') => {
            return parse_filter_list(single).map(FilterAssignment::All);
        }
        _ => {}
    }

    let mut columns = BTreeMap::new();
    for entry in entries {
        let parts: Vec<&str> = entry.split(':').collect();
        match parts.as_slice() {
            [name, list] => {
                columns.insert(name.trim().to_string(), parse_filter_list(list)?);
            }
            [_] => return Err(FilterError::MixedEntries(text.to_string())),
            _ => return Err(FilterError::TooManyParts(entry.to_string())),
        }
    }

    Ok(FilterAssignment::PerColumn(columns))
}

/// Combines every occurrence of a per-column filter flag
pub fn combine_assignments(
    flag: &str,
    values: &[String],
) -> Result<Option<FilterAssignment>, FilterError> {
    let parsed = values
        .iter()
        .map(|v| parse_filter_assignment(v))
        .collect::<Result<Vec<_>, _>>()?;

    if parsed.len() <= 1 {
        return Ok(parsed.into_iter().next());
    }

    let mut columns = BTreeMap::new();
    for assignment in parsed {
        match assignment {
            FilterAssignment::PerColumn(named) => columns.extend(named),
            FilterAssignment::All(_) => return Err(FilterError::AmbiguousRepeat(flag.to_string())),
        }
    }

    Ok(Some(FilterAssignment::PerColumn(columns)))
}

/// Parses the coordinate filter flag, which takes a single unnamed list
pub fn coords_filters(flag: &str, values: &[String]) -> Result<Option<FilterList>, FilterError> {
    match values {
        [] => Ok(None),
        [value] => match parse_filter_assignment(value)? {
            FilterAssignment::All(list) => Ok(Some(list)),
            FilterAssignment::PerColumn(_) => Err(FilterError::NamedNotAllowed(flag.to_string())),
        },
        _ => Err(FilterError::AmbiguousRepeat(flag.to_string())),
    }
}
