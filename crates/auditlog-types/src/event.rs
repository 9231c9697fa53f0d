//! Audit events and their signed envelopes

use crate::encoding::{Base64, Hex};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// An audit event
///
/// The well-known fields mirror the service's default schema. Any additional
/// schema fields go into `extra` and are flattened into the same JSON
/// object. Unset fields are omitted from the serialized form, so an absent
/// field and an explicit `null` are indistinguishable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Human readable description of what happened
    pub message: String,

    /// What action was performed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    /// Who performed the action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,

    /// Value after the change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<Value>,

    /// Value before the change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<Value>,

    /// Where the action originated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Outcome of the action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// What the action was performed on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Tenant the event belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    /// RFC 3339 timestamp, kept as text so that it round-trips byte for byte
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// Custom schema fields
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Event {
    /// Create an event with only a message set
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    /// Set the action
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Set the actor
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Set the new value
    pub fn with_new(mut self, new: impl Into<Value>) -> Self {
        self.new = Some(new.into());
        self
    }

    /// Set the old value
    pub fn with_old(mut self, old: impl Into<Value>) -> Self {
        self.old = Some(old.into());
        self
    }

    /// Set the source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the status
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Set the target
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set the tenant id
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Set the timestamp, formatted with microsecond precision
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp.to_rfc3339_opts(SecondsFormat::Micros, true));
        self
    }

    /// Set a schema field by name
    ///
    /// Well-known names set the matching field, so the serialized object
    /// never carries the same key twice. Non-string values given for a
    /// string field are stored as their JSON text; `null` unsets it.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        match name.as_str() {
            "message" => self.message = text(value).unwrap_or_default(),
            "action" => self.action = text(value),
            "actor" => self.actor = text(value),
            "new" => self.new = Some(value).filter(|v| !v.is_null()),
            "old" => self.old = Some(value).filter(|v| !v.is_null()),
            "source" => self.source = text(value),
            "status" => self.status = text(value),
            "target" => self.target = text(value),
            "tenant_id" => self.tenant_id = text(value),
            "timestamp" => self.timestamp = text(value),
            _ => {
                self.extra.insert(name, value);
            }
        }
        self
    }
}

fn text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// An event together with its signature material
///
/// This is the envelope that is submitted to and returned by the service.
/// The signature covers the canonical encoding of `event` only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedEvent {
    /// The event itself
    pub event: Event,

    /// Signature over the canonical event bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Base64>,

    /// Public key of the signer (PEM or base64 SPKI DER)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,

    /// Time the service received the event (service-assigned)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_at: Option<String>,
}

impl SignedEvent {
    /// Wrap an unsigned event
    pub fn unsigned(event: Event) -> Self {
        Self {
            event,
            signature: None,
            public_key: None,
            received_at: None,
        }
    }

    /// Whether the envelope carries a signature
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }
}

/// An event record as returned by search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchEvent {
    /// The stored envelope
    pub envelope: SignedEvent,

    /// Service-assigned leaf hash of the canonical event bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<Hex>,

    /// Position of the event in the log
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaf_index: Option<u64>,

    /// Inclusion path from the leaf up to the root it was proven against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership_proof: Option<Vec<Hex>>,

    /// Whether the proof is against the published root (otherwise unpublished)
    #[serde(default)]
    pub published: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_absent_fields_are_omitted() {
        let event = Event::new("hello").with_actor("alice");
        let json = serde_json::to_value(&event).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj.len(), 2);
        assert_eq!(obj["message"], "hello");
        assert_eq!(obj["actor"], "alice");
    }

    #[test]
    fn test_custom_fields_flatten() {
        let event = Event::new("hello").with_field("request_id", 42);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"request_id\":42"));

        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_known_names_set_named_fields() {
        let event = Event::new("hello")
            .with_field("actor", "bob")
            .with_field("new", serde_json::json!({"limit": 10}))
            .with_field("status", 200)
            .with_field("message", "replaced");
        assert_eq!(event.actor.as_deref(), Some("bob"));
        assert_eq!(event.new, Some(serde_json::json!({"limit": 10})));
        assert_eq!(event.status.as_deref(), Some("200"));
        assert_eq!(event.message, "replaced");
        assert!(event.extra.is_empty());

        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json.matches("\"actor\"").count(), 1);
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);

        let cleared = event.with_field("actor", Value::Null);
        assert_eq!(cleared.actor, None);
    }

    #[test]
    fn test_null_deserializes_as_absent() {
        let event: Event =
            serde_json::from_str(r#"{"message":"m","actor":null,"status":"ok"}"#).unwrap();
        assert_eq!(event.actor, None);
        assert_eq!(event.status.as_deref(), Some("ok"));
    }

    #[test]
    fn test_timestamp_format() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let event = Event::new("m").with_timestamp(ts);
        assert_eq!(
            event.timestamp.as_deref(),
            Some("2024-03-01T12:30:00.000000Z")
        );
    }

    #[test]
    fn test_search_event_defaults() {
        let record: SearchEvent =
            serde_json::from_str(r#"{"envelope":{"event":{"message":"m"}}}"#).unwrap();
        assert!(!record.published);
        assert!(record.hash.is_none());
        assert!(!record.envelope.is_signed());
    }
}
