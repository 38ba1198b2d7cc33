//! Version-addressed install root
//!
//! Layout: `root/<version>/<arch>-<platformSuffix>/<executable>`. Every
//! immediate subdirectory of `root` is a candidate version; candidates are
//! tried newest first and the first one carrying an executable binary for
//! this platform wins. Dot-prefixed entries are staging areas for installs
//! in progress and are never candidates.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use semver::Version;
use tracing::debug;

use crate::{
    error::{InstallError, Result},
    models::{is_executable, InstalledBinary},
    platform::TargetTriple,
};

/// Executable base name shipped in every bundle
pub const DEFAULT_EXECUTABLE: &str = "TabNine";

/// Parse a directory name as a semantic version. A leading `v` or `=` is tolerated.
pub fn parse_version(name: &str) -> Option<Version> {
    let trimmed = name.trim();
    let trimmed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('='))
        .unwrap_or(trimmed);
    Version::parse(trimmed).ok()
}

/// Candidate ordering: valid versions newest first, then invalid names
/// lexicographically. Ties in precedence fall back to the raw name so the
/// order stays total.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (parse_version(a), parse_version(b)) {
        (Some(va), Some(vb)) => vb.cmp_precedence(&va).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Sort version names in resolution order
pub fn sort_versions(versions: &mut [String]) {
    versions.sort_by(|a, b| compare_versions(a, b));
}

/// A root folder holding one subdirectory per installed version
#[derive(Debug, Clone)]
pub struct VersionDirectory {
    root: PathBuf,
    target: TargetTriple,
    executable: String,
}

impl VersionDirectory {
    pub fn new(root: impl Into<PathBuf>, target: TargetTriple, executable: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            target,
            executable: executable.into(),
        }
    }

    /// Directory for the running platform with the default executable name
    pub fn detect(root: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::new(root, TargetTriple::detect()?, DEFAULT_EXECUTABLE))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn target(&self) -> TargetTriple {
        self.target
    }

    /// `root/<version>`
    pub fn version_dir(&self, version: &str) -> PathBuf {
        self.root.join(version)
    }

    /// `root/<version>/<triple>`
    pub fn target_dir(&self, version: &str) -> PathBuf {
        self.version_dir(version).join(self.target.to_string())
    }

    /// `root/<version>/<triple>/<executable>`
    pub fn binary_path(&self, version: &str) -> PathBuf {
        self.target_dir(version)
            .join(self.target.executable(&self.executable))
    }

    /// Private staging area for an install of `version` in progress.
    ///
    /// Lives under `root` so the finished triple directory can be renamed
    /// into place, but is hidden from [`versions`](Self::versions).
    pub fn staging_dir(&self, version: &str) -> PathBuf {
        self.root
            .join(format!(".{version}-{}.partial", std::process::id()))
    }

    /// Version directory names in resolution order. A missing root yields none.
    pub fn versions(&self) -> Result<Vec<String>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type()?.is_dir() && !name.starts_with('.') {
                versions.push(name);
            }
        }
        sort_versions(&mut versions);
        Ok(versions)
    }

    /// Find the newest installed binary for this platform
    pub fn resolve(&self) -> Result<InstalledBinary> {
        let versions = self.versions()?;
        if versions.is_empty() {
            return Err(InstallError::NotInstalled {
                root: self.root.clone(),
            });
        }

        let mut tried = Vec::with_capacity(versions.len());
        for version in &versions {
            let path = self.binary_path(version);
            if is_executable(&path) {
                debug!(version = %version, path = %path.display(), "Resolved engine binary");
                return Ok(InstalledBinary::new(version.clone(), self.target, path));
            }
            tried.push(path);
        }

        Err(InstallError::BinaryNotFound { versions, tried })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Arch, Platform};

    fn linux() -> TargetTriple {
        TargetTriple::new(Arch::X86_64, Platform::LinuxMusl)
    }

    fn install(root: &Path, version: &str, target: TargetTriple) -> PathBuf {
        let dir = root.join(version).join(target.to_string());
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(target.executable(DEFAULT_EXECUTABLE));
        std::fs::write(&path, b"engine").unwrap();
        crate::provisioner::mark_executable(&path).unwrap();
        path
    }

    #[test]
    fn test_semver_beats_lexicographic() {
        let mut versions = vec!["1.2.0".to_string(), "1.10.0".to_string(), "abc".to_string()];
        sort_versions(&mut versions);
        assert_eq!(versions, vec!["1.10.0", "1.2.0", "abc"]);
    }

    #[test]
    fn test_invalid_names_sort_ascending_after_valid() {
        let mut versions = vec![
            "zeta".to_string(),
            "0.1.0".to_string(),
            "alpha".to_string(),
            "2.0.0-beta.1".to_string(),
            "2.0.0".to_string(),
        ];
        sort_versions(&mut versions);
        assert_eq!(versions, vec!["2.0.0", "2.0.0-beta.1", "0.1.0", "alpha", "zeta"]);
    }

    #[test]
    fn test_leading_v_is_valid() {
        assert_eq!(parse_version("v3.1.2"), Some(Version::new(3, 1, 2)));
        assert_eq!(parse_version("3.1"), None);
        assert_eq!(compare_versions("v2.0.0", "1.0.0"), Ordering::Less);
    }

    #[test]
    fn test_resolve_missing_root_is_not_installed() {
        let dir = tempfile::tempdir().unwrap();
        let versions = VersionDirectory::new(dir.path().join("absent"), linux(), DEFAULT_EXECUTABLE);
        assert!(matches!(
            versions.resolve(),
            Err(InstallError::NotInstalled { .. })
        ));
    }

    #[test]
    fn test_resolve_empty_root_is_not_installed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("stray-file"), b"").unwrap();
        let versions = VersionDirectory::new(dir.path(), linux(), DEFAULT_EXECUTABLE);
        assert!(matches!(
            versions.resolve(),
            Err(InstallError::NotInstalled { .. })
        ));
    }

    #[test]
    fn test_resolve_prefers_highest_semver() {
        let dir = tempfile::tempdir().unwrap();
        install(dir.path(), "1.2.0", linux());
        let expected = install(dir.path(), "1.10.0", linux());
        install(dir.path(), "abc", linux());

        let resolved = VersionDirectory::new(dir.path(), linux(), DEFAULT_EXECUTABLE)
            .resolve()
            .unwrap();
        assert_eq!(resolved.version, "1.10.0");
        assert_eq!(resolved.path, expected);
    }

    #[test]
    fn test_resolve_skips_versions_without_platform_build() {
        let dir = tempfile::tempdir().unwrap();
        let mac = TargetTriple::new(Arch::Aarch64, Platform::AppleDarwin);
        install(dir.path(), "2.0.0", mac);
        let expected = install(dir.path(), "1.0.0", linux());

        let resolved = VersionDirectory::new(dir.path(), linux(), DEFAULT_EXECUTABLE)
            .resolve()
            .unwrap();
        assert_eq!(resolved.version, "1.0.0");
        assert_eq!(resolved.path, expected);
    }

    #[test]
    fn test_resolve_reports_tried_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("1.0.0")).unwrap();
        std::fs::create_dir_all(dir.path().join("0.9.0")).unwrap();

        let versions = VersionDirectory::new(dir.path(), linux(), DEFAULT_EXECUTABLE);
        match versions.resolve() {
            Err(InstallError::BinaryNotFound { versions: v, tried }) => {
                assert_eq!(v, vec!["1.0.0", "0.9.0"]);
                assert_eq!(tried[0], versions.binary_path("1.0.0"));
                assert_eq!(tried.len(), 2);
            }
            other => panic!("expected BinaryNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_staging_dirs_are_not_versions() {
        let dir = tempfile::tempdir().unwrap();
        let versions = VersionDirectory::new(dir.path(), linux(), DEFAULT_EXECUTABLE);
        let staging = versions.staging_dir("9.0.0");
        let staged = staging.join(linux().to_string());
        std::fs::create_dir_all(&staged).unwrap();
        std::fs::write(staged.join(DEFAULT_EXECUTABLE), b"engine").unwrap();

        assert!(staging.file_name().unwrap().to_string_lossy().starts_with('.'));
        assert!(versions.versions().unwrap().is_empty());
        assert!(matches!(
            versions.resolve(),
            Err(InstallError::NotInstalled { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_skips_non_executable_binary() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let expected = install(dir.path(), "1.0.0", linux());
        let unfinished = install(dir.path(), "2.0.0", linux());
        std::fs::set_permissions(&unfinished, std::fs::Permissions::from_mode(0o644)).unwrap();

        let resolved = VersionDirectory::new(dir.path(), linux(), DEFAULT_EXECUTABLE)
            .resolve()
            .unwrap();
        assert_eq!(resolved.version, "1.0.0");
        assert_eq!(resolved.path, expected);
    }

    #[test]
    fn test_binary_path_layout() {
        let windows = TargetTriple::new(Arch::X86_64, Platform::WindowsGnu);
        let versions = VersionDirectory::new("/data/binaries", windows, DEFAULT_EXECUTABLE);
        assert_eq!(
            versions.binary_path("3.3.34"),
            PathBuf::from("/data/binaries/3.3.34/x86_64-pc-windows-gnu/TabNine.exe")
        );
    }
}
