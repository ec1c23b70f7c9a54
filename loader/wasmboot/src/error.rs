//! Error types.
//!
//! Failures are surfaced as they happen: nothing is retried and runtime
//! errors from wasmtime pass through unmodified.

use std::path::PathBuf;

use url::Url;

/// Why a load failed.
#[derive(Debug, thiserror::Error)]
pub enum BootError {
    /// The binary could not be retrieved.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// The binary did not compile or did not link against `env`.
    #[error(transparent)]
    Instantiate(wasmtime::Error),
    /// The start routine trapped or a capability it called failed.
    #[error(transparent)]
    Start(wasmtime::Error),
}

/// Retrieval failure.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("cannot resolve `{path}` against {base}: {source}")]
    InvalidUrl {
        base: String,
        path: String,
        #[source]
        source: url::ParseError,
    },
    #[error("request for {url} failed: {source}")]
    Transport {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered {status}")]
    Status { url: Url, status: u16 },
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no module registered at {path}")]
    NotFound { path: String },
}

/// Guest memory access failure inside a capability.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    #[error("module `{module}` exports no memory")]
    NoMemory { module: String },
    #[error("range {pointer}+{length} is outside guest memory")]
    OutOfBounds { pointer: u32, length: u32 },
}
