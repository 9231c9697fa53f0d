//! Transport layer for the audit log service
//!
//! The client core never talks HTTP directly. It hands a JSON payload and
//! an endpoint path to a [`Transport`] and gets back the `result` member of
//! the service's response envelope. [`HttpTransport`] is the production
//! implementation; tests substitute an in-process service.
//!
//! [`AuditService`] layers the typed request/response structs from
//! [`api`] over any transport.

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod service;
pub mod transport;

pub use api::{
    LogRequest, LogResponse, RootRequest, RootResponse, SearchOrder, SearchRequest,
    SearchResponse, SearchResultsRequest,
};
pub use config::TransportConfig;
pub use error::{Error, Result};
pub use http::{HttpTransport, ResponseEnvelope};
pub use service::AuditService;
pub use transport::{Transport, TransportFuture};
