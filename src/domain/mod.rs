//! Argument parsing for tiledb-cli
//!
//! Pure functions that turn command-line text into typed values. Nothing
//! here touches the array engine.

mod filters;
mod kwargs;
mod selection;
mod timestamp;
mod value;

pub use filters::{
    coords_filters, combine_assignments, parse_filter_assignment, parse_filter_list, Filter,
    FilterAssignment, FilterError, FilterKind, FilterList,
};
pub use kwargs::{option_name, parse_kwargs, split_special, KwargsError, FLAG_PREFIX};
pub use selection::{parse_selection, Selection, SelectionError};
pub use timestamp::{to_unix_time, TimestampError};
pub use value::{Dict, Key, OptionMap, Value};
