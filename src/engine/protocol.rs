//! Bridge protocol types
//!
//! The bridge receives one JSON request line on stdin and answers with
//! one JSON response line on stdout.

use serde::{Deserialize, Serialize};

use super::EngineError;

/// A request for one engine or cloud operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineRequest {
    /// The operation to perform (e.g., "from_csv", "cloud.login")
    pub operation: String,

    /// Operation-specific parameters
    pub params: serde_json::Value,
}

impl EngineRequest {
    pub fn new(operation: impl Into<String>, params: impl Into<serde_json::Value>) -> Self {
        Self {
            operation: operation.into(),
            params: params.into(),
        }
    }
}

/// A response from the bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineResponse {
    /// Whether the operation succeeded
    pub success: bool,

    /// Result data (if success)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    /// Error message (if failure)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EngineResponse {
    pub fn success(data: impl Into<serde_json::Value>) -> Self {
        Self {
            success: true,
            data: Some(data.into()),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Returns the data of a successful response; a missing payload is `null`
    pub fn into_result(self) -> Result<serde_json::Value, EngineError> {
        if self.success {
            Ok(self.data.unwrap_or(serde_json::Value::Null))
        } else {
            Err(EngineError::Collaborator(
                self.error
                    .unwrap_or_else(|| "operation failed without a message".to_string()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serialization() {
        let request = EngineRequest::new("schema", serde_json::json!({"uri": "s3://a/b"}));
        let json = serde_json::to_string(&request).unwrap();

        assert_eq!(json, r#"{"operation":"schema","params":{"uri":"s3://a/b"}}"#);
    }

    #[test]
    fn response_success() {
        let response = EngineResponse::success(serde_json::json!({"result": "ok"}));

        assert!(response.success);
        assert_eq!(
            response.into_result().unwrap(),
            serde_json::json!({"result": "ok"})
        );
    }

    #[test]
    fn response_error() {
        let response = EngineResponse::error("[TileDB::Array] Error: array does not exist");

        match response.into_result() {
            Err(EngineError::Collaborator(message)) => {
                assert!(message.contains("array does not exist"))
            }
            other => panic!("expected collaborator error, got {:?}", other),
        }
    }

    #[test]
    fn minimal_response_parses() {
        let response: EngineResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert_eq!(response.into_result().unwrap(), serde_json::Value::Null);
    }
}
