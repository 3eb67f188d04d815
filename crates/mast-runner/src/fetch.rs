//! Fetch collaborator contract
//!
//! Retrieval and wire-format parsing live outside the runner. An
//! external collaborator (HTTP client, browser bridge, file reader)
//! implements [`ResourceFetcher`] and hands back an already-parsed
//! [`Document`] with the metadata a response needs for its
//! construction-time checks.

use async_trait::async_trait;
use mast_core::Result;
use mast_query::Document;

/// Everything a scenario has configured for one fetch
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Fully resolved target URL
    pub url: String,
    /// Lowercase HTTP method
    pub method: String,
    pub headers: Vec<(String, String)>,
    /// Form payload for non-GET submissions
    pub form: Option<Vec<(String, String)>>,
    pub verify_ssl: bool,
}

/// What the collaborator hands back after fetching and parsing
#[derive(Debug)]
pub struct FetchedResource {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub load_time_ms: u64,
    pub document: Document,
}

/// Fetch-and-parse capability implemented by the external collaborator
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, request: &HttpRequest) -> Result<FetchedResource>;
}
