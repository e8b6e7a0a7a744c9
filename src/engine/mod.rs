//! # Engine Boundary
//!
//! Everything that actually touches arrays or TileDB Cloud lives outside
//! this crate. Commands talk to it through two extension traits:
//!
//! - [`ArrayEngine`] - array I/O, consolidation, vacuuming, fragments
//! - [`CloudClient`] - login, listings, sharing
//!
//! Both are implemented for every [`Backend`], which only knows how to
//! execute one [`EngineRequest`]. Results come back as opaque JSON and are
//! only sliced for display.
//!
//! ## Backends
//!
//! | Backend | Purpose |
//! |---------|---------|
//! | [`BridgeEngine`] | Spawns the `tiledb-bridge` executable, JSON over stdin/stdout |
//! | [`EchoEngine`] | Answers every request with the request itself (previews, tests) |
//!
//! ## Protocol
//!
//! ```text
//! CLI                          tiledb-bridge
//!  │                               │
//!  ├── Stdin: {"operation": "consolidate", "params": {...}}
//!  │                               │
//!  └── Stdout: {"success": true, "data": {...}}
//! ```

mod array;
mod bridge;
mod cloud;
mod protocol;

use thiserror::Error;

use crate::config::{BackendKind, EngineConfig};

pub use array::{
    ArrayEngine, ConsolidationMode, ContextConfig, CsvIngestion, FragmentConsolidation,
    FragmentRange, QuerySpec,
};
pub use bridge::{BridgeEngine, EchoEngine};
pub use cloud::{ArrayListing, CloudClient, Credential, LoginParams, Permission};
pub use protocol::{EngineRequest, EngineResponse};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to start bridge '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Bridge communication failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bridge '{command}' returned no response{stderr}")]
    NoResponse { command: String, stderr: String },

    #[error("Malformed bridge response: {0}")]
    Protocol(String),

    /// Failure reported by the engine or cloud service itself
    #[error("{0}")]
    Collaborator(String),

    #[error("Unexpected response to '{operation}': {reason}")]
    UnexpectedResponse { operation: String, reason: String },
}

/// Executes engine requests
pub trait Backend {
    /// Sends one request and waits for its response
    fn execute(&self, request: &EngineRequest) -> Result<EngineResponse, EngineError>;

    /// Short description for diagnostics
    fn describe(&self) -> String;

    /// Executes `operation` and unwraps the response data
    fn call(
        &self,
        operation: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, EngineError> {
        self.execute(&EngineRequest::new(operation, params))?
            .into_result()
    }
}

/// Builds the backend selected by configuration
pub fn connect(config: &EngineConfig) -> Box<dyn Backend> {
    match config.backend {
        BackendKind::Bridge => Box::new(BridgeEngine::new(&config.command, config.args.clone())),
        BackendKind::Echo => Box::new(EchoEngine),
    }
}
