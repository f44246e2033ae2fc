//! Error handling in [`kas_server`][crate]
use std::{fmt, path::PathBuf};

use axum::response::{IntoResponse, Response};
use http::{header, StatusCode};
use thiserror::Error;

/// Possible errors when indexing or serving a dump
#[derive(Error, Debug)]
pub enum Error {
    /// A named object (or log file) does not exist in the dump
    #[error("{0} not found")]
    NotFound(String),

    /// The request carried an unusable parameter
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A label selector query value did not parse
    #[error("{0}")]
    LabelSelector(#[source] kas_core::Error),

    /// The route only accepts another method
    #[error("method {0} not allowed")]
    MethodNotAllowed(http::Method),

    /// Reading from the dump failed
    #[error("failed to read {}: {source}", path.display())]
    ReadFile {
        /// The file or directory
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A manifest in the dump is not valid YAML of the expected shape
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        /// The offending manifest
        path: PathBuf,
        /// Underlying decode error
        #[source]
        source: serde_yaml::Error,
    },

    /// A decoded document did not fit the expected structure
    #[error("unexpected document shape in {}: {reason}", path.display())]
    Malformed {
        /// The offending manifest
        path: PathBuf,
        /// What was wrong
        reason: String,
    },

    /// Encoding or re-shaping JSON failed
    #[error("SerdeError: {0}")]
    SerdeError(#[source] serde_json::Error),

    /// Walking the dump at startup produced errors
    #[error("failed to index the dump: {0}")]
    Discovery(Errors),

    /// No namespace could be read for an all-namespaces list
    #[error("failed to read from any namespace: {0}")]
    Aggregate(Errors),

    /// Rendering a table failed
    #[error("failed to render table for {kind}: {reason}")]
    Table {
        /// Kind being rendered
        kind: String,
        /// What went wrong
        reason: String,
    },

    /// A worker task panicked or was cancelled
    #[error("worker task failed: {0}")]
    Join(#[source] tokio::task::JoinError),
}

impl Error {
    /// The status code the error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::BadRequest(_) | Error::LabelSelector(_) => StatusCode::BAD_REQUEST,
            Error::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this is a missing file, which readers treat as "no documents"
    pub fn is_missing_file(&self) -> bool {
        matches!(self, Error::ReadFile { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], self.to_string()).into_response()
    }
}

/// A collection of errors from concurrent workers, displayed one per line
#[derive(Debug, Default)]
pub struct Errors(pub Vec<Error>);

impl Errors {
    /// Whether nothing failed
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Record a failure
    pub fn push(&mut self, err: Error) {
        self.0.push(err);
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}
