//! Per-variable retrieval and merge.

use crate::catalog::resolver::CatalogResolver;
use crate::catalog::search::SearchService;
use crate::coverage::filter_locators;
use crate::grid::dataset::{Attributes, Dataset};
use crate::retrieval::error::RetrievalError;
use crate::retrieval::lock::RetrievalLock;
use crate::retrieval::opener::DatasetOpener;
use crate::types::query::QueryParameters;
use log::info;
use std::collections::BTreeSet;
use std::path::Path;

/// What to retrieve and under which constraints.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalRequest<'a> {
    pub query: &'a QueryParameters,
    pub years: &'a BTreeSet<i32>,
    pub staging_dir: &'a Path,
    pub lock: &'a RetrievalLock,
}

pub struct RetrievalEngine<S, O> {
    resolver: CatalogResolver<S>,
    opener: O,
}

impl<S: SearchService, O: DatasetOpener> RetrievalEngine<S, O> {
    pub fn new(search: S, opener: O) -> Self {
        Self {
            resolver: CatalogResolver::new(search),
            opener,
        }
    }

    pub fn resolver(&self) -> &CatalogResolver<S> {
        &self.resolver
    }

    pub fn opener(&self) -> &O {
        &self.opener
    }

    /// Retrieves every variable in `variables` and merges them into one
    /// dataset carrying the query provenance.
    ///
    /// The lock is held from the first catalog lookup until the last file of
    /// the last variable is joined, and released on every exit path.
    pub async fn retrieve(
        &self,
        request: RetrievalRequest<'_>,
        variables: &[&str],
    ) -> Result<Dataset, RetrievalError> {
        let series = {
            let _guard = request.lock.acquire().await;
            let mut series = Vec::with_capacity(variables.len());
            for variable in variables {
                series.push(self.open_series(request, variable).await?);
            }
            series
        };

        let mut merged = Dataset::default();
        for ds in series {
            merged.merge(ds)?;
        }
        merged.attrs = Attributes {
            query: request.query.provenance(),
            variables: variables.iter().map(|v| v.to_string()).collect(),
        };
        Ok(merged)
    }

    /// Resolves, filters and opens the files of one variable, joined in time
    /// order.
    async fn open_series(
        &self,
        request: RetrievalRequest<'_>,
        variable: &str,
    ) -> Result<Dataset, RetrievalError> {
        let query = request.query.with_variable(variable);
        let locators = self.resolver.resolve(&query).await?;
        let total = locators.len();
        let locators = filter_locators(locators, request.years);
        if locators.is_empty() {
            return Err(RetrievalError::NoMatchingFiles {
                variable: variable.to_string(),
                years: request.years.iter().copied().collect(),
            });
        }
        info!(
            "Opening {} of {} file(s) for '{}'",
            locators.len(),
            total,
            variable
        );

        let mut parts = Vec::with_capacity(locators.len());
        for locator in &locators {
            parts.push(self.opener.open(locator, request.staging_dir).await?);
        }
        Ok(Dataset::concat_time(parts)?)
    }
}
