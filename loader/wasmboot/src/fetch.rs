//! Byte retrieval for guest binaries.
//!
//! A [`Fetcher`] turns a root-relative path (`/wasm/<id>.wasm`) into bytes.
//! One attempt per call, no retries, no fallback locations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use url::Url;

use crate::error::FetchError;

/// Retrieves the bytes at a root-relative path.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError>;
}

/// Fetches over HTTP(S), resolving paths against an origin.
///
/// Any status outside 2xx is a failure.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    origin: Url,
}

impl HttpFetcher {
    pub fn new(origin: Url) -> Self {
        HttpFetcher {
            client: reqwest::Client::new(),
            origin,
        }
    }

    /// Fetcher for the host that served `script_url`.
    pub fn for_script(script_url: &Url) -> Result<Self, FetchError> {
        let origin = script_url.join("/").map_err(|source| FetchError::InvalidUrl {
            base: script_url.to_string(),
            path: "/".to_string(),
            source,
        })?;
        Ok(Self::new(origin))
    }

    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Absolute URL for a root-relative path.
    pub fn resolve(&self, path: &str) -> Result<Url, FetchError> {
        self.origin.join(path).map_err(|source| FetchError::InvalidUrl {
            base: self.origin.to_string(),
            path: path.to_string(),
            source,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.resolve(path)?;
        tracing::debug!(%url, "GET");

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(source) => return Err(FetchError::Transport { url, source }),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        match response.bytes().await {
            Ok(bytes) => Ok(bytes.to_vec()),
            Err(source) => Err(FetchError::Transport { url, source }),
        }
    }
}

/// Serves paths from a directory standing in for the host root.
#[derive(Clone, Debug)]
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirFetcher { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Fetcher for DirFetcher {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let file = self.resolve(path);
        tracing::debug!(path = %file.display(), "read");
        tokio::fs::read(&file)
            .await
            .map_err(|source| FetchError::Io { path: file, source })
    }
}

/// Serves pre-registered binaries and records every path requested.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    files: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bytes at an exact path.
    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), bytes.into());
    }

    /// Register the binary for `identifier` at its resource path.
    #[must_use]
    pub fn with_module(mut self, identifier: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(wb_locate::resource_path(identifier), bytes);
        self
    }

    /// Paths requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Fetcher for MemoryFetcher {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        self.requests.lock().push(path.to_string());
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                path: path.to_string(),
            })
    }
}
