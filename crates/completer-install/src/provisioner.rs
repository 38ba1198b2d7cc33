//! Engine provisioning: fetch the latest version and install it
//!
//! Installs land in `root/<version>/<triple>/`. The bundle is downloaded
//! into a hidden staging directory under `root`, unpacked there and the
//! shipped executables get their execute bit. Only then is the triple
//! directory renamed into place. A failure removes the staging directory, so
//! a half-finished install is never resolvable.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use completer_http::{DownloadJob, Downloader, HttpClientTrait, ProgressFn};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    error::{InstallError, Result},
    models::{is_executable, InstalledBinary, UpdateOutcome},
    platform::TargetTriple,
    version_dir::{VersionDirectory, DEFAULT_EXECUTABLE},
};

/// Where and what to download
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionerConfig {
    /// Plain-text endpoint answering with the latest version
    #[serde(default = "default_version_url")]
    pub version_url: String,

    /// Bundles live at `<base>/<version>/<triple>/<bundle_name>`
    #[serde(default = "default_download_base_url")]
    pub download_base_url: String,

    /// Bundle file name; `.zip` bundles are unpacked, anything else is the executable itself
    #[serde(default = "default_bundle_name")]
    pub bundle_name: String,

    /// Executable launched by the client
    #[serde(default = "default_executable_name")]
    pub executable_name: String,

    /// Every executable shipped in the bundle (made runnable after unpacking)
    #[serde(default = "default_executables")]
    pub executables: Vec<String>,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            version_url: default_version_url(),
            download_base_url: default_download_base_url(),
            bundle_name: default_bundle_name(),
            executable_name: default_executable_name(),
            executables: default_executables(),
        }
    }
}

fn default_version_url() -> String {
    "https://update.tabnine.com/bundles/version".to_string()
}

fn default_download_base_url() -> String {
    "https://update.tabnine.com/bundles".to_string()
}

fn default_bundle_name() -> String {
    "TabNine.zip".to_string()
}

fn default_executable_name() -> String {
    DEFAULT_EXECUTABLE.to_string()
}

fn default_executables() -> Vec<String> {
    ["TabNine", "TabNine-deep-cloud", "TabNine-deep-local", "WD-TabNine"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Installs and updates engine builds under a version root
#[derive(Clone)]
pub struct Provisioner {
    client: Arc<dyn HttpClientTrait>,
    downloader: Downloader,
    config: ProvisionerConfig,
    target: TargetTriple,
}

impl Provisioner {
    /// Provisioner for the running platform
    pub fn new(client: Arc<dyn HttpClientTrait>, config: ProvisionerConfig) -> Result<Self> {
        Ok(Self::with_target(client, config, TargetTriple::detect()?))
    }

    pub fn with_target(
        client: Arc<dyn HttpClientTrait>,
        config: ProvisionerConfig,
        target: TargetTriple,
    ) -> Self {
        Self {
            downloader: Downloader::new(client.clone()),
            client,
            config,
            target,
        }
    }

    pub fn config(&self) -> &ProvisionerConfig {
        &self.config
    }

    pub fn target(&self) -> TargetTriple {
        self.target
    }

    /// Version directory view over `root` for this provisioner's platform
    pub fn version_directory(&self, root: impl Into<PathBuf>) -> VersionDirectory {
        VersionDirectory::new(root, self.target, self.config.executable_name.clone())
    }

    /// Ask the version endpoint for the latest version
    pub async fn latest_version(&self) -> Result<String> {
        let body = self.client.get_text(&self.config.version_url).await?;
        let version = body.trim();
        if version.is_empty()
            || version == "."
            || version == ".."
            || version.contains(['/', '\\'])
        {
            return Err(InstallError::InvalidVersion(version.to_string()));
        }
        debug!(version = %version, "Latest engine version");
        Ok(version.to_string())
    }

    /// Bundle URL for a version on this platform
    pub fn download_url(&self, version: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.config.download_base_url.trim_end_matches('/'),
            version,
            self.target,
            self.config.bundle_name
        )
    }

    /// Install the latest version unless some version is already usable
    pub async fn ensure_installed(
        &self,
        root: &Path,
        progress: Option<ProgressFn>,
    ) -> Result<InstalledBinary> {
        match self.version_directory(root).resolve() {
            Ok(binary) => {
                debug!(path = %binary.path.display(), "Engine already installed");
                Ok(binary)
            }
            Err(e) if e.is_missing() => {
                info!(root = %root.display(), reason = %e, "Engine missing, installing latest");
                let version = self.latest_version().await?;
                self.install_version(root, &version, progress).await
            }
            Err(e) => Err(e),
        }
    }

    /// Re-download the latest version, discarding any existing copy of it
    pub async fn force_update(
        &self,
        root: &Path,
        progress: Option<ProgressFn>,
    ) -> Result<InstalledBinary> {
        let version = self.latest_version().await?;
        self.reinstall(root, &version, progress).await
    }

    /// Install the latest version; skip the download when it is already
    /// present and `force` is not set
    pub async fn update(
        &self,
        root: &Path,
        force: bool,
        progress: Option<ProgressFn>,
    ) -> Result<UpdateOutcome> {
        let version = self.latest_version().await?;
        let versions = self.version_directory(root);
        let existing = versions.binary_path(&version);

        if is_executable(&existing) && !force {
            info!(version = %version, "Latest engine version already installed");
            return Ok(UpdateOutcome::AlreadyLatest(InstalledBinary::new(
                version,
                self.target,
                existing,
            )));
        }

        let binary = self.reinstall(root, &version, progress).await?;
        Ok(UpdateOutcome::Installed(binary))
    }

    async fn reinstall(
        &self,
        root: &Path,
        version: &str,
        progress: Option<ProgressFn>,
    ) -> Result<InstalledBinary> {
        let version_dir = self.version_directory(root).version_dir(version);
        if version_dir.exists() {
            info!(path = %version_dir.display(), "Clearing existing install");
            tokio::fs::remove_dir_all(&version_dir).await?;
        }
        self.install_version(root, version, progress).await
    }

    /// Download, unpack and mark runnable one specific version.
    ///
    /// Everything happens in the staging directory first. Only a complete,
    /// executable triple directory is renamed into `root/<version>/`.
    pub async fn install_version(
        &self,
        root: &Path,
        version: &str,
        progress: Option<ProgressFn>,
    ) -> Result<InstalledBinary> {
        let versions = self.version_directory(root);
        let staging = versions.staging_dir(version);
        let staged_target = staging.join(self.target.to_string());
        let url = self.download_url(version);

        let is_archive = self.config.bundle_name.ends_with(".zip");
        let destination = if is_archive {
            staged_target.join(&self.config.bundle_name)
        } else {
            staged_target.join(self.target.executable(&self.config.executable_name))
        };

        if staging.exists() {
            debug!(path = %staging.display(), "Removing stale staging directory");
            tokio::fs::remove_dir_all(&staging).await?;
        }

        info!(version = %version, url = %url, "Downloading engine");
        let mut job = DownloadJob::new(url, &destination).with_cleanup_dir(&staging);
        if let Some(progress) = progress {
            job = job.on_progress(progress);
        }
        self.downloader.download(job).await?;

        let finished = match self
            .finish_install(&versions, version, &staged_target, &destination, is_archive)
            .await
        {
            Ok(()) => self.commit(&versions, version, &staged_target).await,
            Err(e) => Err(e),
        };
        remove_staging(&staging).await;

        match finished {
            Ok(binary) => {
                info!(version = %version, path = %binary.path.display(), "Engine installed");
                Ok(binary)
            }
            Err(e) => {
                warn!(version = %version, error = %e, "Install failed");
                // removes the version folder only while it is still empty
                let _ = tokio::fs::remove_dir(versions.version_dir(version)).await;
                Err(e)
            }
        }
    }

    async fn finish_install(
        &self,
        versions: &VersionDirectory,
        version: &str,
        staged_target: &Path,
        download: &Path,
        is_archive: bool,
    ) -> Result<()> {
        if is_archive {
            let archive = download.to_path_buf();
            let dest = staged_target.to_path_buf();
            tokio::task::spawn_blocking(move || extract_zip(&archive, &dest))
                .await
                .map_err(|e| InstallError::extraction(download, e.to_string()))??;
            tokio::fs::remove_file(download).await?;
        }

        let mut names = self.config.executables.clone();
        if !names.contains(&self.config.executable_name) {
            names.push(self.config.executable_name.clone());
        }
        for name in &names {
            let path = staged_target.join(self.target.executable(name));
            if path.is_file() {
                mark_executable(&path)?;
            }
        }

        let staged_binary = staged_target.join(self.target.executable(&self.config.executable_name));
        if !is_executable(&staged_binary) {
            return Err(InstallError::BinaryNotFound {
                versions: vec![version.to_string()],
                tried: vec![versions.binary_path(version)],
            });
        }
        Ok(())
    }

    /// Move a finished triple directory into `root/<version>/`
    async fn commit(
        &self,
        versions: &VersionDirectory,
        version: &str,
        staged_target: &Path,
    ) -> Result<InstalledBinary> {
        let target_dir = versions.target_dir(version);
        tokio::fs::create_dir_all(versions.version_dir(version)).await?;
        if target_dir.exists() {
            tokio::fs::remove_dir_all(&target_dir).await?;
        }
        tokio::fs::rename(staged_target, &target_dir).await?;
        Ok(InstalledBinary::new(version, self.target, versions.binary_path(version)))
    }
}

async fn remove_staging(staging: &Path) {
    match tokio::fs::remove_dir_all(staging).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %staging.display(), error = %e, "Failed to remove staging directory"),
    }
}

/// Unpack a zip bundle into `dest`
pub fn extract_zip(archive: &Path, dest: &Path) -> Result<()> {
    let file = std::fs::File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file)
        .map_err(|e| InstallError::extraction(archive, e.to_string()))?;
    zip.extract(dest)
        .map_err(|e| InstallError::extraction(archive, e.to_string()))?;
    debug!(archive = %archive.display(), entries = zip.len(), "Bundle extracted");
    Ok(())
}

/// Set `0o755`; a no-op where execute permission does not exist
pub fn mark_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}
