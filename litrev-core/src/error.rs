//! Error types for litrev

use std::time::Duration;

use thiserror::Error;

/// Result type alias for litrev operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for litrev operations
#[derive(Error, Debug)]
pub enum Error {
    /// Request body or query failed validation
    #[error("{0}")]
    InvalidInput(String),

    /// Resolved credential does not carry the provider prefix
    #[error("Invalid API key format. API keys should start with '{prefix}'")]
    InvalidCredentialFormat { prefix: String },

    /// No override key and no default credential configured
    #[error("API key not configured. Please add your API key in Settings.")]
    MissingCredential,

    /// The generator executable could not be started
    #[error("Failed to spawn generator process '{program}': {source}")]
    ProcessSpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The generator exited with a non-zero status
    #[error("Generator process failed: {}", stderr_or_unknown(.stderr))]
    GenerationProcessFailed { code: Option<i32>, stderr: String },

    /// The generator exited cleanly but printed no payload
    #[error("No JSON output from generator process")]
    NoOutputProduced { stdout: String },

    /// A payload span was found but is not valid JSON
    #[error("Failed to parse generator output: {source}")]
    MalformedOutput {
        #[source]
        source: serde_json::Error,
        raw: String,
    },

    /// The generator outlived the configured timeout and was killed
    #[error("Generator process timed out after {}s", .0.as_secs())]
    GenerationTimedOut(Duration),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error from the review client
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The review server answered with an error body
    #[error("{message}")]
    Server { status: u16, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

fn stderr_or_unknown(stderr: &str) -> &str {
    match stderr.trim() {
        "" => "Unknown error",
        trimmed => trimmed,
    }
}

impl Error {
    /// Whether the failure was caused by the caller rather than the relay
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_) | Error::InvalidCredentialFormat { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_failure_message_carries_stderr() {
        let err = Error::GenerationProcessFailed {
            code: Some(7),
            stderr: "Traceback: boom\n".to_string(),
        };
        assert_eq!(err.to_string(), "Generator process failed: Traceback: boom");
    }

    #[test]
    fn test_generation_failure_without_stderr() {
        let err = Error::GenerationProcessFailed {
            code: Some(1),
            stderr: "  ".to_string(),
        };
        assert_eq!(err.to_string(), "Generator process failed: Unknown error");
    }

    #[test]
    fn test_client_error_classification() {
        assert!(Error::InvalidInput("x".into()).is_client_error());
        assert!(Error::InvalidCredentialFormat {
            prefix: "sk-".into()
        }
        .is_client_error());
        assert!(!Error::MissingCredential.is_client_error());
        assert!(!Error::NoOutputProduced {
            stdout: String::new()
        }
        .is_client_error());
    }
}
