//! Client-side integrity layer for a tamper-evident audit log
//!
//! This is the main entry point of the workspace. [`AuditClient`] signs
//! outgoing events, verifies the events, signatures and Merkle proofs the
//! service returns, and tracks the log's root across calls so that a log
//! which rewinds or forks is reported instead of silently trusted.
//!
//! # Example
//!
//! ```no_run
//! use auditlog::{AuditClient, AuditConfig, Event, SearchRequest};
//! use auditlog::transport::{HttpTransport, TransportConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> auditlog::Result<()> {
//! let transport = HttpTransport::new(
//!     TransportConfig::new("https://audit.example.com").with_token("token"),
//! )?;
//! let config = AuditConfig::default().with_signing_key("signing.pem");
//! let client = AuditClient::new(config, Arc::new(transport))?;
//!
//! let logged = client
//!     .log(Event::new("user logged in").with_actor("alice"), true)
//!     .await?;
//! println!("{:?}", logged.verdict);
//!
//! let found = client.search(SearchRequest::new("actor:alice")).await?;
//! for event in &found.events {
//!     println!("{} {:?}", event.event().message, event.verdict);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod tracker;
pub mod verify;

// Re-export core crates
pub use auditlog_crypto as crypto;
pub use auditlog_merkle as merkle;
pub use auditlog_roots as roots;
pub use auditlog_transport as transport;
pub use auditlog_types as types;

pub use auditlog_transport::{SearchOrder, SearchRequest};
pub use auditlog_types::{Event, SearchEvent, SignedEvent, TreeHead};
pub use client::{AuditClient, LogResult, RootResult, SearchResult, SearchResultPage};
pub use config::AuditConfig;
pub use error::{Error, Result};
pub use tracker::{ConsistencyResult, RootTracker, TrackerSession};
pub use verify::{CheckOutcome, EventChecks, EventVerifier, VerificationVerdict, VerifiedEvent};
