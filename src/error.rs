use crate::catalog::error::CatalogError;
use crate::grid::error::GridError;
use crate::retrieval::error::RetrievalError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CmipError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("ESGF search parameters not provided")]
    MissingQueryParameters,

    #[error("'{0}' not valid time frequency in CMIP")]
    UnknownCadence(String),

    #[error("Feature '{0}' is not registered for CMIP retrieval")]
    UnknownFeature(String),

    #[error("Cutout time axis is empty")]
    EmptyCutoutTime,
}
