//! Proxy-aware HTTP access for engine provisioning
//!
//! ## Features
//!
//! - **Trait-based design**: Mockable via `HttpClientTrait`
//! - **Proxy resolution**: explicit `[user:pass@]host:port` or `HTTP(S)_PROXY`, recomputed per request
//! - **Streaming downloads**: bodies go straight to disk with best-effort progress
//! - **All-or-nothing**: failed downloads remove their version folder

pub mod client;
pub mod config;
pub mod download;
pub mod error;
pub mod proxy;

pub use client::{shared_client, HttpClient, HttpClientTrait};
pub use config::{HttpConfig, BROWSER_USER_AGENT};
pub use download::{DownloadJob, Downloader, ProgressFn, ProgressTracker};
pub use error::{HttpError, Result};
pub use proxy::{ProxyAuth, ProxyConfig};

/// Re-export commonly used types
pub use reqwest::StatusCode;
