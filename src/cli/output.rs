//! Output formatting for CLI commands

use serde::{Deserialize, Serialize};

/// Output format
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Output helper for consistent formatting
pub struct Output {
    format: OutputFormat,
    verbose: bool,
}

impl Output {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    /// Prints a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Text => println!("{}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "success": true,
                        "message": message
                    })
                );
            }
        }
    }

    /// Prints structured data
    pub fn data<T: Serialize>(&self, data: &T) {
        match self.format {
            OutputFormat::Text => {
                if let Ok(json) = serde_json::to_string_pretty(data) {
                    println!("{}", json);
                }
            }
            OutputFormat::Json => {
                if let Ok(json) = serde_json::to_string(data) {
                    println!("{}", json);
                }
            }
        }
    }

    /// Prints an engine result
    ///
    /// Text mode prints strings as-is (schemas and configs arrive
    /// pre-rendered) and pretty-prints everything else.
    pub fn value(&self, value: &serde_json::Value) {
        match (self.format, value) {
            (OutputFormat::Text, serde_json::Value::String(text)) => println!("{}", text),
            _ => self.data(value),
        }
    }

    /// Prints an engine result, or `message` when the engine returned nothing
    pub fn outcome(&self, value: &serde_json::Value, message: &str) {
        if value.is_null() {
            self.success(message);
        } else {
            self.value(value);
        }
    }

    /// Prints a verbose debug message (only when --debug is set)
    pub fn verbose(&self, message: &str) {
        if self.verbose {
            eprintln!("[verbose] {}", message);
        }
    }

    /// Prints a verbose debug message with context (only when --debug is set)
    pub fn verbose_ctx(&self, context: &str, message: &str) {
        if self.verbose {
            eprintln!("[verbose:{}] {}", context, message);
        }
    }
}
