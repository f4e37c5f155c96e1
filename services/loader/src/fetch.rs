//! CSV fetchers - retrieve raw dataset text from the data root
//!
//! Two transports share the `CsvFetcher` seam:
//! - `HttpFetcher`: static assets served under a base URL
//! - `DirFetcher`: a local directory (the `public/data` folder of the site)
//!
//! A single failed fetch is reported immediately as `SourceUnavailable`.
//! There are no retries; callers decide whether to fall back.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::error::LoadError;

pub const USER_AGENT: &str = "PainelOperacional/1.0 (painel estatistico 2024-2025)";

/// Default request timeout for the HTTP transport.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Retrieves the raw text of a dataset by its path under the data root.
#[allow(async_fn_in_trait)]
pub trait CsvFetcher {
    async fn fetch(&self, path: &str) -> Result<String, LoadError>;
}

/// Fetches datasets over HTTP from a static asset base URL.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFetcher {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LoadError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Full URL of a dataset path under the base URL.
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl CsvFetcher for HttpFetcher {
    async fn fetch(&self, path: &str) -> Result<String, LoadError> {
        let url = self.url_for(path);
        debug!(%url, "fetching dataset");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LoadError::unavailable(path, e))?
            .error_for_status()
            .map_err(|e| LoadError::unavailable(path, e))?;

        let text = resp
            .text()
            .await
            .map_err(|e| LoadError::unavailable(path, e))?;

        Ok(strip_bom(text))
    }
}

/// Reads datasets from a local directory.
#[derive(Debug, Clone)]
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl CsvFetcher for DirFetcher {
    async fn fetch(&self, path: &str) -> Result<String, LoadError> {
        let file = self.root.join(path.trim_start_matches('/'));
        debug!(path = %file.display(), "reading dataset");

        let text = tokio::fs::read_to_string(&file)
            .await
            .map_err(|e| LoadError::unavailable(path, e))?;

        Ok(strip_bom(text))
    }
}

/// Data root selected from a location string: URLs go over HTTP,
/// anything else is treated as a directory.
#[derive(Debug, Clone)]
pub enum DataRoot {
    Http(HttpFetcher),
    Dir(DirFetcher),
}

impl DataRoot {
    pub fn from_location(location: &str, timeout: Duration) -> Result<Self, LoadError> {
        if is_url(location) {
            Ok(DataRoot::Http(HttpFetcher::new(location, timeout)?))
        } else {
            Ok(DataRoot::Dir(DirFetcher::new(location)))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            DataRoot::Http(http) => http.base_url.clone(),
            DataRoot::Dir(dir) => dir.root.display().to_string(),
        }
    }
}

impl CsvFetcher for DataRoot {
    async fn fetch(&self, path: &str) -> Result<String, LoadError> {
        match self {
            DataRoot::Http(http) => http.fetch(path).await,
            DataRoot::Dir(dir) => dir.fetch(path).await,
        }
    }
}

fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Remove UTF-8 BOM if present
fn strip_bom(text: String) -> String {
    if text.starts_with('\u{feff}') {
        text['\u{feff}'.len_utf8()..].to_string()
    } else {
        text
    }
}
