// Error types shared by the client, the config store and the workflow.

use std::path::PathBuf;

/// A failure of one call against the platform API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connect, TLS, read failure).
    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    /// The platform answered with anything other than 200.
    #[error("HTTP status {status} from {endpoint}, body: {body}")]
    HttpStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The response body is not a JSON object.
    #[error("cannot parse JSON response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A required key is absent from the response.
    #[error("key `{0}` not found in response")]
    FieldMissing(String),

    /// A key is present but holds the wrong kind of value.
    #[error("malformed `{field}`: expected {expected}")]
    Shape {
        field: String,
        expected: &'static str,
    },
}

impl ApiError {
    pub fn transport(endpoint: impl Into<String>, message: impl ToString) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    pub fn shape(field: impl Into<String>, expected: &'static str) -> Self {
        Self::Shape {
            field: field.into(),
            expected,
        }
    }

    /// Status code of an `HttpStatus` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Reading or writing the local settings file failed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot access config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that abort an interactive run.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("{context}: {source}")]
    Api {
        context: String,
        #[source]
        source: ApiError,
    },

    #[error("invalid input {input:?}: expected an integer")]
    InvalidSelection { input: String },

    #[error("console error: {0}")]
    Console(#[from] std::io::Error),
}

impl WorkflowError {
    pub fn api(context: impl Into<String>, source: ApiError) -> Self {
        Self::Api {
            context: context.into(),
            source,
        }
    }
}
