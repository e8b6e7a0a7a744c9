//! tiledb-cli - command-line front-end to the TileDB array storage engine
//!
//! The crate parses command lines, most notably the keyword-argument
//! mini-language accepted by `convert-from csv`, and forwards each command
//! to an external engine that owns the actual array I/O.

pub mod domain;
pub mod engine;
pub mod config;
pub mod cli;

pub use domain::{parse_kwargs, OptionMap, Value};
pub use engine::{ArrayEngine, Backend, CloudClient, EngineError};
