//! Core types for the audit log client
//!
//! This crate provides the data model shared by every other crate in the
//! workspace: audit events and their signed envelopes, log roots, encoding
//! newtypes, and the canonical byte encoding used for signing and hashing.

pub mod canonical;
pub mod encoding;
pub mod error;
pub mod event;
pub mod root;

pub use canonical::{canonicalize, canonicalize_with, CanonicalEncoding};
pub use encoding::{Base64, Hex, Sha256Hash};
pub use error::{Error, Result};
pub use event::{Event, SearchEvent, SignedEvent};
pub use root::{PublishedRoot, RootInfo, TreeHead, EMPTY_ROOT_HASH};
