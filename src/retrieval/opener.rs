use crate::grid::dataset::Dataset;
use crate::retrieval::error::RetrievalError;
use crate::types::locator::Locator;
use async_trait::async_trait;
use std::path::Path;

/// Opens one remote file as a raw dataset, staging it under `staging_dir`
/// when the backend needs a local copy.
#[async_trait]
pub trait DatasetOpener: Send + Sync {
    async fn open(&self, locator: &Locator, staging_dir: &Path)
        -> Result<Dataset, RetrievalError>;
}
