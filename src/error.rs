use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use std::io;
use thiserror::Error;

/// Failures surfaced while resolving, inspecting or listing a path.
///
/// Paths carried by the variants are client-relative, never host paths.
#[derive(Debug, Error)]
pub enum BrowseError {
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("path does not exist: {0}")]
    NotFound(String),

    #[error("path is not a directory: {0}")]
    NotADirectory(String),

    #[error("path is not a file: {0}")]
    NotAFile(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl BrowseError {
    /// Classifies a host error raised while touching `path`.
    pub fn from_io(path: impl Into<String>, err: io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => BrowseError::NotFound(path),
            io::ErrorKind::PermissionDenied => BrowseError::AccessDenied(path),
            io::ErrorKind::InvalidInput => BrowseError::InvalidPath(path),
            _ => BrowseError::Io { path, source: err },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BrowseError::NotFound(_))
    }
}

impl ResponseError for BrowseError {
    fn status_code(&self) -> StatusCode {
        match self {
            BrowseError::InvalidPath(_)
            | BrowseError::InvalidQuery(_)
            | BrowseError::NotADirectory(_)
            | BrowseError::NotAFile(_) => StatusCode::BAD_REQUEST,
            BrowseError::NotFound(_) => StatusCode::NOT_FOUND,
            BrowseError::AccessDenied(_) | BrowseError::Io { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(json!({ "success": false, "error": self.to_string() }))
    }
}
