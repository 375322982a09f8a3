//! Error types for request handling and process execution

use thiserror::Error;
use warp::http::StatusCode;

/// Failure while running an external tool.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The executable could not be located.
    #[error("executable not found: {path}")]
    NotFound { path: String },

    /// Spawning or waiting on the child failed for another reason.
    #[error("{0}")]
    Other(String),
}

/// Errors surfaced to the HTTP client.
///
/// Every variant maps to one status code; the `Display` text is what ends up in
/// the `error` field of the response envelope.
#[derive(Debug, Error)]
pub enum HelperError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Not found")]
    RouteNotFound,

    #[error("{tool} not found: {path}")]
    ToolNotFound { tool: String, path: String },

    #[error("{0}")]
    ToolFailed(String),

    #[error("{0}")]
    AllStrategiesFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

impl HelperError {
    pub fn status(&self) -> StatusCode {
        match self {
            HelperError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            HelperError::RouteNotFound => StatusCode::NOT_FOUND,
            HelperError::ToolNotFound { .. }
            | HelperError::ToolFailed(_)
            | HelperError::AllStrategiesFailed(_)
            | HelperError::Io(_)
            | HelperError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Attach the tool label to an executor failure.
    pub fn from_exec(tool: &str, err: ExecError) -> Self {
        match err {
            ExecError::NotFound { path } => HelperError::ToolNotFound {
                tool: tool.to_string(),
                path,
            },
            ExecError::Other(msg) => HelperError::Internal(msg),
        }
    }
}
