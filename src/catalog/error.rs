use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("No results found in the ESGF database for {query}")]
    NoResults { query: String },

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse JSON data")]
    JsonParse(#[from] serde_json::Error),

    #[error("Unexpected search response from {url}: {message}")]
    MalformedResponse { url: String, message: String },
}
