//! Backends that execute engine requests

use std::io::{BufRead, ErrorKind, Write};
use std::process::{Command, Stdio};

use serde_json::json;

use super::protocol::{EngineRequest, EngineResponse};
use super::{Backend, EngineError};

/// Runs each request through an external bridge executable
///
/// One process per request: the request is written as a single JSON line
/// on stdin and the first line of stdout is the response.
#[derive(Debug, Clone)]
pub struct BridgeEngine {
    command: String,
    args: Vec<String>,
}

impl BridgeEngine {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

impl Backend for BridgeEngine {
    fn execute(&self, request: &EngineRequest) -> Result<EngineResponse, EngineError> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| EngineError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        // Send request; dropping stdin closes the pipe so the bridge sees EOF
        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| EngineError::Protocol("bridge stdin unavailable".to_string()))?;
            let request_json =
                serde_json::to_string(request).map_err(|e| EngineError::Protocol(e.to_string()))?;
            match writeln!(stdin, "{}", request_json) {
                // A bridge may answer without reading its input
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
                other => other?,
            }
        }

        // Read response
        let output = child.wait_with_output()?;
        let response_line = output.stdout.as_slice().lines().next().transpose()?;

        let line = match response_line {
            Some(line) if !line.trim().is_empty() => line,
            _ => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let stderr = stderr.trim();
                return Err(EngineError::NoResponse {
                    command: self.command.clone(),
                    stderr: if stderr.is_empty() {
                        String::new()
                    } else {
                        format!(": {}", stderr)
                    },
                });
            }
        };

        serde_json::from_str(&line).map_err(|e| EngineError::Protocol(e.to_string()))
    }

    fn describe(&self) -> String {
        if self.args.is_empty() {
            format!("bridge '{}'", self.command)
        } else {
            format!("bridge '{} {}'", self.command, self.args.join(" "))
        }
    }
}

/// Answers every request with the request itself
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoEngine;

impl Backend for EchoEngine {
    fn execute(&self, request: &EngineRequest) -> Result<EngineResponse, EngineError> {
        Ok(EngineResponse::success(json!({
            "operation": request.operation,
            "params": request.params,
        })))
    }

    fn describe(&self) -> String {
        "echo".to_string()
    }
}
