//! Installed-binary records

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::platform::TargetTriple;

/// An engine executable found (or just placed) in a version directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledBinary {
    /// Version directory name
    pub version: String,
    /// Build the binary belongs to
    pub target: TargetTriple,
    /// Absolute path of the executable
    pub path: PathBuf,
}

impl InstalledBinary {
    pub fn new(version: impl Into<String>, target: TargetTriple, path: impl Into<PathBuf>) -> Self {
        Self {
            version: version.into(),
            target,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Platform tag, e.g. `x86_64-unknown-linux-musl`
    pub fn platform_tag(&self) -> String {
        self.target.to_string()
    }

    /// Whether the file exists and may be launched
    pub fn is_executable(&self) -> bool {
        is_executable(&self.path)
    }
}

/// Result of an explicit update request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// A fresh download was installed
    Installed(InstalledBinary),
    /// The latest version was already present and no force was requested
    AlreadyLatest(InstalledBinary),
}

impl UpdateOutcome {
    pub fn binary(&self) -> &InstalledBinary {
        match self {
            UpdateOutcome::Installed(b) | UpdateOutcome::AlreadyLatest(b) => b,
        }
    }
}

/// Exists and, on unix, has an execute bit set
pub fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }

    #[cfg(not(unix))]
    {
        true
    }
}
