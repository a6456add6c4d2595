use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetchError>;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} returned HTTP {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Extraction of {path} failed: {source}")]
    Decompression {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Interrupted")]
    Interrupted,

    #[error("Unknown city '{name}' (known cities: {})", .known.join(", "))]
    UnknownCity { name: String, known: Vec<String> },
}

impl FetchError {
    pub fn network<S: Into<String>>(url: S, source: reqwest::Error) -> Self {
        FetchError::Network {
            url: url.into(),
            source,
        }
    }

    pub fn decompression<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        FetchError::Decompression {
            path: path.into(),
            source,
        }
    }

    /// Errors that only fail the current task; everything else aborts the run.
    pub fn is_task_local(&self) -> bool {
        matches!(
            self,
            FetchError::Network { .. }
                | FetchError::HttpStatus { .. }
                | FetchError::Decompression { .. }
        )
    }
}
