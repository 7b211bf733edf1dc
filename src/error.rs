use std::path::PathBuf;

use thiserror::Error;

/// Failure to retrieve a page. Fatal for the listing, skip-and-continue for details.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("could not build HTTP client: {0}")]
    Client(String),
}

/// Storage failure distinct from the duplicate-key no-op.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open database {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to create directory for {path:?}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("malformed listing URL {url:?}: {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid listing selector {0:?}")]
    Selector(String),
}
