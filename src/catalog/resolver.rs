use crate::catalog::error::CatalogError;
use crate::catalog::search::SearchService;
use crate::types::locator::Locator;
use crate::types::query::QueryParameters;
use log::info;

/// Resolves a complete query to the file list of its best catalog record.
pub struct CatalogResolver<S> {
    search: S,
}

impl<S: SearchService> CatalogResolver<S> {
    pub fn new(search: S) -> Self {
        Self { search }
    }

    pub fn search(&self) -> &S {
        &self.search
    }

    /// Looks `query` up, retrying once with point-sampled frequency when the
    /// primary search is empty, and lists the files of the first record.
    ///
    /// # Errors
    ///
    /// [`CatalogError::NoResults`] when neither search finds a record, or any
    /// transport error of the underlying service.
    pub async fn resolve(&self, query: &QueryParameters) -> Result<Vec<Locator>, CatalogError> {
        let mut records = self.search.search_datasets(query).await?;
        if records.is_empty() {
            let fallback = query.point_sampled();
            info!(
                "No datasets for frequency '{}', retrying with '{}'",
                query.frequency(),
                fallback.frequency()
            );
            records = self.search.search_datasets(&fallback).await?;
        }

        let Some(first) = records.first() else {
            return Err(CatalogError::NoResults {
                query: query.to_string(),
            });
        };
        self.search.list_files(first).await
    }
}
