//! Canonical byte encoding of events
//!
//! The canonical bytes are the exact input to both signing and leaf hashing,
//! so the encoding is versioned: changing it would invalidate every signature
//! produced under a previous version.
//!
//! # Version 1
//!
//! The event is serialized to a JSON object, top-level `null` members are
//! removed, and the result is serialized with the RFC 8785 JSON
//! Canonicalization Scheme (sorted member names, no insignificant
//! whitespace, normalized numbers and string escapes).

use crate::error::{Error, Result};
use crate::event::Event;

/// Versions of the canonical event encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CanonicalEncoding {
    /// RFC 8785 JSON with absent/null members omitted
    #[default]
    V1,
}

impl CanonicalEncoding {
    /// The encoding used for newly signed events
    pub const CURRENT: CanonicalEncoding = CanonicalEncoding::V1;

    /// Stable name of this encoding version
    pub fn name(&self) -> &'static str {
        match self {
            CanonicalEncoding::V1 => "jcs-v1",
        }
    }
}

/// Canonicalize an event with the current encoding
pub fn canonicalize(event: &Event) -> Result<Vec<u8>> {
    canonicalize_with(event, CanonicalEncoding::CURRENT)
}

/// Canonicalize an event with a specific encoding version
pub fn canonicalize_with(event: &Event, encoding: CanonicalEncoding) -> Result<Vec<u8>> {
    match encoding {
        CanonicalEncoding::V1 => {
            let mut value = serde_json::to_value(event)?;
            let object = value.as_object_mut().ok_or_else(|| {
                Error::Canonicalization("event did not serialize to a JSON object".to_string())
            })?;
            object.retain(|_, v| !v.is_null());

            serde_json_canonicalizer::to_vec(&value)
                .map_err(|e| Error::Canonicalization(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample() -> Event {
        Event::new("user logged in")
            .with_actor("alice")
            .with_action("login")
            .with_status("success")
            .with_field("zeta", 1)
            .with_field("alpha", "first")
    }

    #[test]
    fn test_canonical_bytes_sorted_and_compact() {
        let bytes = canonicalize(&sample()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            r#"{"action":"login","actor":"alice","alpha":"first","message":"user logged in","status":"success","zeta":1}"#
        );
    }

    #[rstest]
    #[case(r#"{"message":"m","actor":"a","status":"s","custom":{"y":2,"x":1}}"#)]
    #[case(r#"{"status":"s","custom":{"x":1,"y":2},"message":"m","actor":"a"}"#)]
    #[case(r#"{"custom":{"y":2,"x":1},"actor":"a","message":"m","status":"s"}"#)]
    fn test_permutation_invariant(#[case] json: &str) {
        let reference: Event = serde_json::from_str(
            r#"{"actor":"a","custom":{"x":1,"y":2},"message":"m","status":"s"}"#,
        )
        .unwrap();
        let event: Event = serde_json::from_str(json).unwrap();

        assert_eq!(
            canonicalize(&event).unwrap(),
            canonicalize(&reference).unwrap()
        );
    }

    #[test]
    fn test_null_and_absent_encode_identically() {
        let absent: Event = serde_json::from_str(r#"{"message":"m"}"#).unwrap();
        let null: Event =
            serde_json::from_str(r#"{"message":"m","target":null,"custom":null}"#).unwrap();
        assert_eq!(canonicalize(&absent).unwrap(), canonicalize(&null).unwrap());
    }

    #[test]
    fn test_empty_string_differs_from_absent() {
        let absent = Event::new("m");
        let empty = Event::new("m").with_target("");
        assert_ne!(canonicalize(&absent).unwrap(), canonicalize(&empty).unwrap());
    }

    #[test]
    fn test_encoding_name() {
        assert_eq!(CanonicalEncoding::CURRENT.name(), "jcs-v1");
        assert_eq!(CanonicalEncoding::default(), CanonicalEncoding::V1);
    }
}
