//! Request and response types for the audit service endpoints
//!
//! Every request that can return a root accepts `consistency_from`: the
//! tree size of the root the client currently trusts. The service answers
//! with a consistency proof between that size and the root it returns, so
//! the client can check the log only ever grew.

use auditlog_types::{Base64, Event, Hex, PublishedRoot, RootInfo, SearchEvent, SignedEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `v1/log`: append an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRequest {
    /// The event to append
    pub event: Event,

    /// Signature over the canonical event bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Base64>,

    /// Public key of the signer (SPKI PEM)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,

    /// Ask the service to echo the stored envelope
    #[serde(default)]
    pub verbose: bool,

    /// Ask the service to return the event hash
    #[serde(default)]
    pub return_hash: bool,

    /// Tree size of the root the client trusts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistency_from: Option<u64>,
}

impl LogRequest {
    /// Build a request from a (possibly signed) envelope
    pub fn from_envelope(envelope: SignedEvent) -> Self {
        Self {
            event: envelope.event,
            signature: envelope.signature,
            public_key: envelope.public_key,
            verbose: false,
            return_hash: true,
            consistency_from: None,
        }
    }
}

/// Result of `v1/log`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogResponse {
    /// Leaf hash of the stored event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<Hex>,

    /// Position of the event in the log
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaf_index: Option<u64>,

    /// The stored envelope (only when `verbose` was requested)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub envelope: Option<SignedEvent>,

    /// Root of the log right after the append
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unpublished_root: Option<RootInfo>,

    /// Inclusion path of the event under `unpublished_root`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership_proof: Option<Vec<Hex>>,

    /// Consistency proof from `consistency_from` to `unpublished_root`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistency_proof: Option<Vec<Hex>>,
}

/// Sort direction for search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchOrder {
    /// Oldest first
    Asc,
    /// Newest first
    Desc,
}

/// `v1/search`: query the log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-form query, e.g. `actor:alice status:success`
    pub query: String,

    /// Sort direction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<SearchOrder>,

    /// Field to sort by
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,

    /// Earliest event time (RFC 3339 or relative, e.g. `1d`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,

    /// Latest event time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,

    /// Number of events returned in the first page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    /// Total number of events kept for pagination
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,

    /// Return full envelopes instead of summaries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,

    /// Only match events whose field is one of the listed values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_restriction: Option<BTreeMap<String, Vec<String>>>,

    /// Tree size of the root the client trusts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistency_from: Option<u64>,
}

impl SearchRequest {
    /// Create a search for `query`
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Set the sort direction
    pub fn with_order(mut self, order: SearchOrder) -> Self {
        self.order = Some(order);
        self
    }

    /// Set the sort field
    pub fn with_order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    /// Set the time window
    pub fn with_range(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start = Some(start.into());
        self.end = Some(end.into());
        self
    }

    /// Set the page size
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the total result cap
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Request full envelopes
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    /// Restrict `field` to the given values
    pub fn with_restriction(
        mut self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.search_restriction
            .get_or_insert_with(BTreeMap::new)
            .insert(field.into(), values.into_iter().map(Into::into).collect());
        self
    }
}

/// Result of `v1/search` and `v1/results`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Pagination token for `v1/results`
    pub id: String,

    /// When the pagination token expires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,

    /// Total number of matching events
    #[serde(default)]
    pub count: u64,

    /// The events in this page
    #[serde(default)]
    pub events: Vec<SearchEvent>,

    /// Latest published root (proofs of published events are against it)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PublishedRoot>,

    /// Current unpublished root (proofs of other events are against it)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unpublished_root: Option<RootInfo>,

    /// Consistency proof from `consistency_from` to `unpublished_root`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistency_proof: Option<Vec<Hex>>,
}

/// `v1/results`: fetch another page of a previous search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultsRequest {
    /// Pagination token from [`SearchResponse::id`]
    pub id: String,

    /// Page size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    /// Index of the first event in the page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,

    /// Tree size of the root the client trusts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistency_from: Option<u64>,
}

impl SearchResultsRequest {
    /// Create a request for the page starting at `offset`
    pub fn new(id: impl Into<String>, limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            id: id.into(),
            limit,
            offset,
            consistency_from: None,
        }
    }
}

/// `v1/root`: fetch a root of the log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RootRequest {
    /// Size of the tree to fetch the root for (latest when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree_size: Option<u64>,

    /// Tree size of the root the client trusts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistency_from: Option<u64>,
}

/// Result of `v1/root`
///
/// The consistency proof in `data` connects the returned root and the root
/// at `consistency_from`, from whichever is smaller to whichever is larger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootResponse {
    /// The root
    pub data: PublishedRoot,
}
