//! Error types for the wisty-dl library.

use thiserror::Error;

use crate::resolution::Resolution;

/// Errors that can occur while resolving, downloading, or tracking videos.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport failure: unreachable host, non-2xx status, or timeout.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The embed page did not contain an asset list.
    #[error("no asset catalog found in embed page")]
    CatalogNotFound,

    /// The asset list was found but could not be decoded.
    #[error("malformed asset catalog: {0}")]
    MalformedCatalog(#[source] serde_json::Error),

    /// The catalog has no asset at the requested height.
    #[error("resolution {label} unavailable")]
    ResolutionUnavailable {
        /// Label of the requested resolution.
        label: String,
    },

    /// The label is not a known resolution.
    #[error("unknown resolution label: {0}")]
    UnknownResolution(String),

    /// Every candidate resolution failed for a video.
    #[error("no resolution could be downloaded for {id} (tried: {})", join_tried(.tried))]
    Exhausted {
        /// Remote video identifier.
        id: String,
        /// Candidates attempted, in order.
        tried: Vec<Resolution>,
    },

    /// The response body ended before the declared length.
    #[error("download truncated: received {received} of {expected} bytes")]
    Truncated {
        /// Declared content length.
        expected: u64,
        /// Bytes actually written.
        received: u64,
    },

    /// A manifest could not be decoded or encoded.
    #[error("manifest {path}: {source}")]
    Manifest {
        /// Path of the manifest file.
        path: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Command-line arguments parsed but select nothing to do.
    #[error("usage error: {0}")]
    Usage(String),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

fn join_tried(tried: &[Resolution]) -> String {
    if tried.is_empty() {
        return "none".to_string();
    }
    tried
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A specialized `Result` type for wisty-dl operations.
pub type Result<T> = std::result::Result<T, Error>;
