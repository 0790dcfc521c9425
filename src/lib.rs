mod catalog;
mod cmip;
mod coverage;
mod error;
mod features;
mod grid;
mod normalize;
mod retrieval;
mod types;

#[cfg(test)]
mod testing;

pub use cmip::Cmip;
pub use error::CmipError;

pub use types::cadence::Cadence;
pub use types::cutout::{Bounds, Cutout, CutoutSpec};
pub use types::feature::Feature;
pub use types::locator::Locator;
pub use types::query::{EsgfParams, FeatureQuery, QueryParameters};

pub use grid::calendar::{Calendar, CfDateTime, TimeAxis};
pub use grid::dataset::{Attributes, Coordinate, Dataset};
pub use grid::variable::Variable;
pub use grid::{LAT, LEVEL_DIM, LON, TIME_DIM, X_DIM, Y_DIM};

pub use catalog::resolver::CatalogResolver;
pub use catalog::search::{DatasetRecord, EsgfSearchClient, SearchService, DEFAULT_INDEX_NODE};
pub use coverage::{filter_locators, parse_year_span};
pub use normalize::{normalize, wrap_longitude, NormalizeOptions};

pub use retrieval::engine::{RetrievalEngine, RetrievalRequest};
pub use retrieval::lock::{LockGuard, RetrievalLock};
pub use retrieval::opener::DatasetOpener;
pub use retrieval::staging::{stage_locator, staged_path};
#[cfg(feature = "netcdf")]
pub use retrieval::netcdf_opener::NetcdfOpener;

pub use features::physics;
pub use features::{lookup, Registration, REGISTRY};

pub use catalog::error::CatalogError;
pub use grid::error::GridError;
pub use retrieval::error::RetrievalError;
