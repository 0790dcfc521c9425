//! The federated search service and its ESGF REST implementation.

use crate::catalog::error::CatalogError;
use crate::types::locator::Locator;
use crate::types::query::QueryParameters;
use async_trait::async_trait;
use bon::bon;
use log::{debug, info, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub const DEFAULT_INDEX_NODE: &str = "https://esgf-node.ipsl.upmc.fr/esg-search";

/// One dataset record of a search result.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatasetRecord {
    pub id: String,
    #[serde(default)]
    pub data_node: Option<String>,
    #[serde(default)]
    pub number_of_files: Option<u64>,
}

/// Catalog lookups the resolver needs. Records come back most authoritative
/// first, restricted to the latest revision.
#[async_trait]
pub trait SearchService: Send + Sync {
    async fn search_datasets(
        &self,
        query: &QueryParameters,
    ) -> Result<Vec<DatasetRecord>, CatalogError>;

    async fn list_files(&self, dataset: &DatasetRecord) -> Result<Vec<Locator>, CatalogError>;
}

#[derive(Debug, Deserialize)]
struct SolrEnvelope<T> {
    response: SolrResponse<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SolrResponse<T> {
    num_found: u64,
    docs: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct FileDoc {
    title: String,
    #[serde(default)]
    url: Vec<String>,
}

/// Client for the ESGF search REST API (`/esg-search/search`).
#[derive(Debug, Clone)]
pub struct EsgfSearchClient {
    client: Client,
    base_url: String,
    distrib: bool,
    page_size: usize,
}

#[bon]
impl EsgfSearchClient {
    /// Creates a client against an index node.
    ///
    /// * `base_url` - index node root, defaults to [`DEFAULT_INDEX_NODE`].
    /// * `distrib` - search across all federated nodes (default `true`).
    /// * `page_size` - files requested per page when listing a dataset (default 500).
    #[builder]
    pub fn new(
        #[builder(into)] base_url: Option<String>,
        #[builder(default = true)] distrib: bool,
        #[builder(default = 500)] page_size: usize,
    ) -> Self {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_INDEX_NODE.to_string());
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            distrib,
            page_size: page_size.max(1),
        }
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        params: &[(&str, String)],
    ) -> Result<SolrResponse<T>, CatalogError> {
        let url = self.search_url();
        debug!("Searching {} with {:?}", url, params);

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| CatalogError::NetworkRequest(url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    CatalogError::HttpStatus {
                        url,
                        status,
                        source: e,
                    }
                } else {
                    CatalogError::NetworkRequest(url, e)
                });
            }
        };

        let body = response
            .bytes()
            .await
            .map_err(|e| CatalogError::NetworkRequest(url.clone(), e))?;
        let envelope: SolrEnvelope<T> = serde_json::from_slice(&body)?;
        Ok(envelope.response)
    }

    fn common_params(&self, kind: &str) -> Vec<(&'static str, String)> {
        vec![
            ("type", kind.to_string()),
            ("latest", "true".to_string()),
            ("distrib", self.distrib.to_string()),
            ("format", "application/solr+json".to_string()),
        ]
    }
}

#[async_trait]
impl SearchService for EsgfSearchClient {
    async fn search_datasets(
        &self,
        query: &QueryParameters,
    ) -> Result<Vec<DatasetRecord>, CatalogError> {
        let mut params = self.common_params("Dataset");
        params.extend(
            query
                .facets()
                .into_iter()
                .map(|(key, value)| (key, value.to_string())),
        );
        params.push(("fields", "id,data_node,number_of_files".to_string()));

        let response = self.get_json::<DatasetRecord>(&params).await?;
        info!("{} dataset(s) match {}", response.num_found, query);
        Ok(response.docs)
    }

    async fn list_files(&self, dataset: &DatasetRecord) -> Result<Vec<Locator>, CatalogError> {
        let mut locators = Vec::new();
        let mut offset = 0usize;
        loop {
            let mut params = self.common_params("File");
            params.push(("dataset_id", dataset.id.clone()));
            params.push(("fields", "title,url".to_string()));
            params.push(("offset", offset.to_string()));
            params.push(("limit", self.page_size.to_string()));

            let page = self.get_json::<FileDoc>(&params).await?;
            let fetched = page.docs.len();
            locators.extend(parse_file_docs(page.docs));
            offset += fetched;
            if fetched == 0 || offset as u64 >= page.num_found {
                break;
            }
        }

        if locators.is_empty() {
            return Err(CatalogError::MalformedResponse {
                url: self.search_url(),
                message: format!("dataset '{}' lists no files", dataset.id),
            });
        }
        info!("Dataset {} lists {} file(s)", dataset.id, locators.len());
        Ok(locators)
    }
}

/// Turns file documents into locators. Each `url` entry reads
/// `<url>|<mime type>|<service>`.
fn parse_file_docs(docs: Vec<FileDoc>) -> Vec<Locator> {
    docs.into_iter()
        .map(|doc| {
            let mut locator = Locator::new(doc.title);
            for entry in &doc.url {
                let mut fields = entry.split('|');
                let (Some(url), Some(_mime), Some(service)) =
                    (fields.next(), fields.next(), fields.next())
                else {
                    continue;
                };
                match service {
                    "HTTPServer" => locator.download_url = Some(url.to_string()),
                    "OPENDAP" => {
                        let url = url.strip_suffix(".html").unwrap_or(url);
                        locator.opendap_url = Some(url.to_string());
                    }
                    _ => {}
                }
            }
            locator
        })
        .collect()
}
