//! Error types for engine installation

use std::fmt;
use std::path::PathBuf;

use completer_http::HttpError;
use thiserror::Error;

/// Result type alias for install operations
pub type Result<T> = std::result::Result<T, InstallError>;

/// Installation and binary-resolution errors
#[derive(Debug, Error)]
pub enum InstallError {
    /// The version root has no version subdirectories
    #[error("Engine not installed: no versions under {}", root.display())]
    NotInstalled { root: PathBuf },

    /// Versions exist but none carries a binary for this platform
    #[error("Couldn't find an engine binary (versions={versions:?}, tried: {})", TriedPaths(tried))]
    BinaryNotFound {
        versions: Vec<String>,
        tried: Vec<PathBuf>,
    },

    /// CPU architecture without a published build
    #[error("Unsupported architecture: '{0}'")]
    UnsupportedArchitecture(String),

    /// Operating system without a published build
    #[error("Unsupported platform: '{0}'")]
    UnsupportedPlatform(String),

    /// Download or version-endpoint failure, including `DownloadFailed(status)`
    #[error(transparent)]
    Http(#[from] HttpError),

    /// Version endpoint answered with something that cannot name a directory
    #[error("Invalid version string from version endpoint: {0:?}")]
    InvalidVersion(String),

    /// Bundle could not be unpacked
    #[error("Failed to extract {}: {message}", path.display())]
    Extraction { path: PathBuf, message: String },

    /// I/O errors during file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl InstallError {
    /// Create a new extraction error
    pub fn extraction<S: Into<String>>(path: impl Into<PathBuf>, message: S) -> Self {
        Self::Extraction {
            path: path.into(),
            message: message.into(),
        }
    }

    /// True when the engine simply is not there yet and provisioning can fix it
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            InstallError::NotInstalled { .. } | InstallError::BinaryNotFound { .. }
        )
    }

    /// HTTP status for `DownloadFailed`
    pub fn download_status(&self) -> Option<u16> {
        match self {
            InstallError::Http(e) => e.status(),
            _ => None,
        }
    }
}

struct TriedPaths<'a>(&'a [PathBuf]);

impl fmt::Display for TriedPaths<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, path) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", path.display())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_missing() {
        assert!(InstallError::NotInstalled { root: "/x".into() }.is_missing());
        assert!(InstallError::BinaryNotFound {
            versions: vec![],
            tried: vec![]
        }
        .is_missing());
        assert!(!InstallError::UnsupportedPlatform("haiku".into()).is_missing());
    }

    #[test]
    fn test_binary_not_found_lists_tried_paths() {
        let err = InstallError::BinaryNotFound {
            versions: vec!["1.0.0".into(), "0.9.0".into()],
            tried: vec!["/r/1.0.0/t/TabNine".into(), "/r/0.9.0/t/TabNine".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("/r/1.0.0/t/TabNine, /r/0.9.0/t/TabNine"));
        assert!(msg.contains("1.0.0"));
    }

    #[test]
    fn test_download_status() {
        let err = InstallError::from(HttpError::DownloadFailed {
            url: "u".into(),
            status: 503,
        });
        assert_eq!(err.download_status(), Some(503));
    }
}
