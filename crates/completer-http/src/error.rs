//! HTTP client error types

use std::path::PathBuf;

use thiserror::Error;

/// Result type for HTTP operations
pub type Result<T> = std::result::Result<T, HttpError>;

/// HTTP client errors
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network request failed (connect, TLS, redirect or body transfer)
    #[error("Network request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Invalid or unsupported URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid proxy configuration
    #[error("Invalid proxy configuration: {0}")]
    InvalidProxy(String),

    /// Server answered with something other than 200 OK
    #[error("Download failed: {url} returned HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    /// Destination path was not absolute
    #[error("Expected an absolute destination path, got {0}")]
    InvalidDestination(PathBuf),

    /// Local file I/O failed while writing the body
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Client build error
    #[error("Failed to build HTTP client: {0}")]
    BuildError(String),
}

impl HttpError {
    /// HTTP status code carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::DownloadFailed { status, .. } => Some(*status),
            HttpError::RequestFailed(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
