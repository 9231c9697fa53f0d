//! Typed access to the audit service endpoints

use crate::api::{
    LogRequest, LogResponse, RootRequest, RootResponse, SearchRequest, SearchResponse,
    SearchResultsRequest,
};
use crate::error::Result;
use crate::transport::Transport;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Endpoint path for appending events
pub const LOG_PATH: &str = "v1/log";
/// Endpoint path for searching
pub const SEARCH_PATH: &str = "v1/search";
/// Endpoint path for paging through search results
pub const RESULTS_PATH: &str = "v1/results";
/// Endpoint path for fetching roots
pub const ROOT_PATH: &str = "v1/root";

/// A typed client for the audit service over an arbitrary transport
#[derive(Clone)]
pub struct AuditService {
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for AuditService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditService").finish_non_exhaustive()
    }
}

impl AuditService {
    /// Create a service client over `transport`
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    async fn call<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        path: &str,
        request: &Req,
    ) -> Result<Resp> {
        let payload = serde_json::to_value(request)?;
        let result = self.transport.execute(path, payload).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Append an event
    pub async fn log(&self, request: &LogRequest) -> Result<LogResponse> {
        self.call(LOG_PATH, request).await
    }

    /// Search the log
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        self.call(SEARCH_PATH, request).await
    }

    /// Fetch a page of a previous search
    pub async fn results(&self, request: &SearchResultsRequest) -> Result<SearchResponse> {
        self.call(RESULTS_PATH, request).await
    }

    /// Fetch a root
    pub async fn root(&self, request: &RootRequest) -> Result<RootResponse> {
        self.call(ROOT_PATH, request).await
    }
}
