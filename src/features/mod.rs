//! Feature calculators and the static registry that dispatches to them.

pub mod influx;
pub mod physics;
pub mod surface;
pub mod wind;
pub mod wind10m;

use crate::catalog::search::SearchService;
use crate::error::CmipError;
use crate::grid::dataset::{Attributes, Dataset};
use crate::grid::error::GridError;
use crate::grid::{X_DIM, Y_DIM};
use crate::normalize::{normalize, NormalizeOptions};
use crate::retrieval::engine::{RetrievalEngine, RetrievalRequest};
use crate::retrieval::lock::RetrievalLock;
use crate::retrieval::opener::DatasetOpener;
use crate::types::cadence::Cadence;
use crate::types::cutout::Bounds;
use crate::types::feature::Feature;
use crate::types::query::QueryParameters;
use chrono::NaiveDateTime;
use std::collections::BTreeSet;
use std::path::Path;

/// Post-retrieval clean-up applied unless sanitation is disabled.
pub type Sanitizer = fn(Dataset) -> Result<Dataset, GridError>;

#[derive(Debug, Clone, Copy)]
pub struct Registration {
    pub name: &'static str,
    pub feature: Feature,
    pub sanitizer: Option<Sanitizer>,
}

pub const REGISTRY: &[Registration] = &[
    Registration {
        name: "wind",
        feature: Feature::Wind,
        sanitizer: None,
    },
    Registration {
        name: "wind10m",
        feature: Feature::Wind10m,
        sanitizer: None,
    },
    Registration {
        name: "surface",
        feature: Feature::Surface,
        sanitizer: None,
    },
    Registration {
        name: "influx",
        feature: Feature::Influx,
        sanitizer: Some(influx::sanitize_influx),
    },
];

/// Finds the registration for a feature name.
pub fn lookup(name: &str) -> Result<&'static Registration, CmipError> {
    REGISTRY
        .iter()
        .find(|registration| registration.name == name)
        .ok_or_else(|| CmipError::UnknownFeature(name.to_string()))
}

/// Runs the calculator of `feature`.
pub async fn calculate<S, O>(
    feature: Feature,
    ctx: &FeatureContext<'_, S, O>,
) -> Result<Dataset, CmipError>
where
    S: SearchService,
    O: DatasetOpener,
{
    match feature {
        Feature::Wind => wind::get_data_wind(ctx).await,
        Feature::Wind10m => wind10m::get_data_wind10m(ctx).await,
        Feature::Surface => surface::get_data_surface(ctx).await,
        Feature::Influx => influx::get_data_influx(ctx).await,
    }
}

/// Everything a calculator needs to fetch variables prepared for one cutout.
pub struct FeatureContext<'a, S, O> {
    pub engine: &'a RetrievalEngine<S, O>,
    pub query: QueryParameters,
    pub target_times: &'a [NaiveDateTime],
    pub window: (NaiveDateTime, NaiveDateTime),
    pub bounds: Bounds,
    pub years: BTreeSet<i32>,
    pub cadence: Option<Cadence>,
    pub staging_dir: &'a Path,
    pub lock: &'a RetrievalLock,
}

impl<S: SearchService, O: DatasetOpener> FeatureContext<'_, S, O> {
    /// Retrieves one variable, normalizes it and cuts it to the cutout's
    /// time window and bounding box.
    pub async fn fetch(&self, variable: &str) -> Result<Dataset, CmipError> {
        let request = RetrievalRequest {
            query: &self.query,
            years: &self.years,
            staging_dir: self.staging_dir,
            lock: self.lock,
        };
        let raw = self.engine.retrieve(request, &[variable]).await?;
        let ds = normalize(
            raw,
            self.target_times,
            self.cadence,
            NormalizeOptions::default(),
        )?;
        let (start, end) = self.window;
        let ds = ds
            .sel_time(start, end)?
            .sel_range(X_DIM, self.bounds.x_min, self.bounds.x_max)?
            .sel_range(Y_DIM, self.bounds.y_min, self.bounds.y_max)?;
        Ok(ds)
    }

    /// Prunes `ds` to the declared outputs of `feature` and records provenance.
    pub fn finish(&self, mut ds: Dataset, feature: Feature) -> Result<Dataset, CmipError> {
        let outputs = feature.variables();
        ds.retain_vars(outputs)?;
        ds.attrs = Attributes {
            query: self.query.provenance(),
            variables: outputs.iter().map(|v| v.to_string()).collect(),
        };
        Ok(ds)
    }
}
