use crate::catalog::error::CatalogError;
use crate::grid::error::GridError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("No files of '{variable}' cover the requested years {years:?}")]
    NoMatchingFiles { variable: String, years: Vec<i32> },

    #[error("Failed to open '{locator}': {message}")]
    Open { locator: String, message: String },

    #[error("Download failed for {url}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("I/O error in staging area {0:?}")]
    StagingIo(PathBuf, #[source] std::io::Error),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Grid(#[from] GridError),
}
