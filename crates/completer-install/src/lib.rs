//! Version-addressed engine installs
//!
//! Installed engines live under a root folder as
//! `root/<version>/<arch>-<platformSuffix>/<executable>`.
//! [`VersionDirectory`] resolves the newest usable binary and
//! [`Provisioner`] downloads new versions into place.

pub mod error;
pub mod models;
pub mod platform;
pub mod provisioner;
pub mod version_dir;

pub use error::{InstallError, Result};
pub use models::{is_executable, InstalledBinary, UpdateOutcome};
pub use platform::{Arch, Platform, TargetTriple};
pub use provisioner::{extract_zip, mark_executable, Provisioner, ProvisionerConfig};
pub use version_dir::{compare_versions, parse_version, sort_versions, VersionDirectory, DEFAULT_EXECUTABLE};
