//! Streaming downloader with all-or-nothing cleanup
//!
//! A download either leaves a complete file behind or removes the whole
//! cleanup directory (by default the version folder two levels above the
//! destination file). A half-written bundle is never left where the version
//! resolver could pick it up.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::header::{HeaderMap, CONTENT_LENGTH};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::{
    client::HttpClientTrait,
    error::{HttpError, Result},
};

/// Progress callback, invoked with the received fraction in `0.0..=1.0`
pub type ProgressFn = Box<dyn FnMut(f64) + Send>;

/// A single download request
pub struct DownloadJob {
    url: String,
    destination: PathBuf,
    cleanup_dir: Option<PathBuf>,
    on_progress: Option<ProgressFn>,
}

impl DownloadJob {
    /// Download `url` into the file at `destination`
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
            cleanup_dir: None,
            on_progress: None,
        }
    }

    /// Directory removed when the download fails
    pub fn with_cleanup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cleanup_dir = Some(dir.into());
        self
    }

    /// Report progress while bytes arrive
    pub fn on_progress(mut self, f: impl FnMut(f64) + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Effective cleanup directory: explicit, else the destination's grandparent,
    /// else its parent.
    pub fn cleanup_dir(&self) -> PathBuf {
        if let Some(dir) = &self.cleanup_dir {
            return dir.clone();
        }
        let parent = self.destination.parent();
        parent
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty() && p.parent().is_some())
            .or(parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.destination.clone())
    }
}

/// Tracks received bytes against an optional content length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressTracker {
    total: Option<u64>,
    received: u64,
}

impl ProgressTracker {
    pub fn new(total: Option<u64>) -> Self {
        Self {
            total: total.filter(|t| *t > 0),
            received: 0,
        }
    }

    /// Read `content-length`; a missing or non-numeric header disables progress
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let total = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        Self::new(total)
    }

    /// Record `len` more bytes; returns the fraction when progress is enabled
    pub fn advance(&mut self, len: usize) -> Option<f64> {
        self.received += len as u64;
        self.total
            .map(|total| (self.received as f64 / total as f64).min(1.0))
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }
}

/// Downloads files through the shared HTTP client
#[derive(Clone)]
pub struct Downloader {
    client: Arc<dyn HttpClientTrait>,
}

impl Downloader {
    pub fn new(client: Arc<dyn HttpClientTrait>) -> Self {
        Self { client }
    }

    /// Run a download job; returns the number of bytes written.
    ///
    /// On any failure the cleanup directory is removed before the error is
    /// returned.
    pub async fn download(&self, mut job: DownloadJob) -> Result<u64> {
        if !job.destination.is_absolute() {
            return Err(HttpError::InvalidDestination(job.destination.clone()));
        }

        let cleanup = job.cleanup_dir();
        match self.fetch_into(&mut job).await {
            Ok(written) => {
                info!(
                    url = %job.url,
                    destination = %job.destination.display(),
                    bytes = written,
                    "Download complete"
                );
                Ok(written)
            }
            Err(e) => {
                warn!(url = %job.url, error = %e, "Download failed, cleaning up");
                remove_tree(&cleanup).await;
                Err(e)
            }
        }
    }

    async fn fetch_into(&self, job: &mut DownloadJob) -> Result<u64> {
        if let Some(parent) = job.destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let response = self.client.get(&job.url).await?;
        let tracker = ProgressTracker::from_headers(response.headers());
        debug!(url = %job.url, content_length = ?tracker.total(), "Streaming response body");

        let mut file = File::create(&job.destination).await?;
        let stream = response.bytes_stream();
        stream_to_file(stream, &mut file, tracker, &mut job.on_progress).await
    }
}

/// Copy a byte stream into `file`, reporting progress after every chunk
pub async fn stream_to_file<S, E>(
    stream: S,
    file: &mut File,
    mut tracker: ProgressTracker,
    on_progress: &mut Option<ProgressFn>,
) -> Result<u64>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    HttpError: From<E>,
{
    futures::pin_mut!(stream);
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        if let (Some(fraction), Some(cb)) = (tracker.advance(chunk.len()), on_progress.as_mut()) {
            cb(fraction);
        }
    }
    file.flush().await?;
    Ok(tracker.received())
}

async fn remove_tree(dir: &Path) {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => debug!(path = %dir.display(), "Removed partial download"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %dir.display(), error = %e, "Failed to remove partial download"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<f64>>>, ProgressFn) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, Box::new(move |p| sink.lock().unwrap().push(p)))
    }

    #[test]
    fn test_tracker_fractions() {
        let mut tracker = ProgressTracker::new(Some(1000));
        assert_eq!(tracker.advance(400), Some(0.4));
        assert_eq!(tracker.advance(600), Some(1.0));
        assert_eq!(tracker.received(), 1000);
    }

    #[test]
    fn test_tracker_without_length() {
        let mut tracker = ProgressTracker::new(None);
        assert_eq!(tracker.advance(10), None);
        assert_eq!(tracker.received(), 10);

        let mut zero = ProgressTracker::new(Some(0));
        assert_eq!(zero.advance(10), None);
    }

    #[test]
    fn test_tracker_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, "1000".parse().unwrap());
        assert_eq!(ProgressTracker::from_headers(&headers).total(), Some(1000));

        headers.insert(CONTENT_LENGTH, "NaN".parse().unwrap());
        assert_eq!(ProgressTracker::from_headers(&headers).total(), None);

        assert_eq!(ProgressTracker::from_headers(&HeaderMap::new()).total(), None);
    }

    #[test]
    fn test_cleanup_dir_defaults_to_version_folder() {
        let job = DownloadJob::new("http://x", "/root/bin/1.0.0/x86_64-unknown-linux-musl/a.zip");
        assert_eq!(job.cleanup_dir(), PathBuf::from("/root/bin/1.0.0"));

        let job = DownloadJob::new("http://x", "/a.zip").with_cleanup_dir("/tmp/explicit");
        assert_eq!(job.cleanup_dir(), PathBuf::from("/tmp/explicit"));
    }

    #[test]
    fn test_cleanup_dir_never_climbs_to_filesystem_root() {
        let job = DownloadJob::new("http://x", "/top/a.zip");
        assert_eq!(job.cleanup_dir(), PathBuf::from("/top"));
    }

    #[tokio::test]
    async fn test_stream_reports_progress_per_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let mut file = File::create(&path).await.unwrap();

        let chunks = vec![
            Ok::<_, HttpError>(Bytes::from(vec![1u8; 400])),
            Ok(Bytes::from(vec![2u8; 600])),
        ];
        let (seen, cb) = recorder();
        let written = stream_to_file(
            futures::stream::iter(chunks),
            &mut file,
            ProgressTracker::new(Some(1000)),
            &mut Some(cb),
        )
        .await
        .unwrap();

        assert_eq!(written, 1000);
        assert_eq!(*seen.lock().unwrap(), vec![0.4, 1.0]);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 1000);
    }

    #[tokio::test]
    async fn test_stream_error_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = File::create(dir.path().join("out.bin")).await.unwrap();

        let chunks = vec![
            Ok(Bytes::from(vec![0u8; 400])),
            Err(HttpError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection dropped",
            ))),
        ];
        let result = stream_to_file(
            futures::stream::iter(chunks),
            &mut file,
            ProgressTracker::new(Some(1000)),
            &mut None,
        )
        .await;
        assert!(matches!(result, Err(HttpError::Io(_))));
    }

    #[tokio::test]
    async fn test_relative_destination_rejected() {
        let client = crate::client::shared_client(crate::HttpConfig::default()).unwrap();
        let downloader = Downloader::new(client);
        let result = downloader
            .download(DownloadJob::new("http://127.0.0.1:1/x", "relative/file.zip"))
            .await;
        assert!(matches!(result, Err(HttpError::InvalidDestination(_))));
    }
}
