//! Security audit events.
//!
//! The core's contract with its audit sink: one record per security-relevant
//! decision, never skipped, never duplicated. Emission is best-effort and
//! must never propagate a failure past the core boundary — a broken sink
//! cannot mask or alter the security decision that produced the record.

use std::sync::Mutex;

use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Auth,
    RateLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    Success,
    Failed,
    Denied,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub id: Uuid,
    /// Acting principal, or "unknown" when no identity was established
    pub user: String,
    pub event_type: EventType,
    pub action: String,
    pub status: AuditStatus,
    pub details: String,
}

impl AuditEvent {
    pub fn auth(user: &str, action: &str, status: AuditStatus, details: &str) -> Self {
        Self::new(user, EventType::Auth, action, status, details)
    }

    pub fn rate_limit(user: &str, action: &str, details: &str) -> Self {
        Self::new(user, EventType::RateLimit, action, AuditStatus::Denied, details)
    }

    fn new(user: &str, event_type: EventType, action: &str, status: AuditStatus, details: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            user: user.to_string(),
            event_type,
            action: action.to_string(),
            status,
            details: details.to_string(),
        }
    }
}

pub trait AuditSink: Send + Sync {
    /// Record one event. Implementations must not panic.
    fn record(&self, event: AuditEvent);
}

/// Default sink: structured `tracing` events, optionally signed.
///
/// When a signing key is configured, each record carries an HMAC-SHA256
/// signature over its JSON form so downstream storage can detect tampering.
pub struct TracingAuditSink {
    hmac_key: Option<String>,
}

impl TracingAuditSink {
    pub fn new(hmac_key: Option<String>) -> Self {
        Self { hmac_key }
    }

    fn sign(&self, payload: &str) -> Option<String> {
        let key = self.hmac_key.as_ref()?;
        let mut mac = HmacSha256::new_from_slice(key.as_bytes()).ok()?;
        mac.update(payload.as_bytes());
        Some(hex::encode(mac.finalize().into_bytes()))
    }
}

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        let Ok(payload) = serde_json::to_string(&event) else {
            tracing::error!(event_id = %event.id, "Failed to serialize audit event");
            return;
        };

        match self.sign(&payload) {
            Some(signature) => {
                tracing::info!(target: "security_audit", event = %payload, hmac = %signature);
            }
            None => {
                tracing::info!(target: "security_audit", event = %payload);
            }
        }
    }
}

/// Captures events in memory; the test fixture.
#[derive(Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_captures_in_order() {
        let sink = MemoryAuditSink::new();
        sink.record(AuditEvent::auth("alice", "LOGIN", AuditStatus::Success, ""));
        sink.record(AuditEvent::auth("bob", "LOGIN", AuditStatus::Failed, "Password mismatch"));

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].user, "alice");
        assert_eq!(events[1].status, AuditStatus::Failed);
    }

    #[test]
    fn signature_is_deterministic_per_payload() {
        let sink = TracingAuditSink::new(Some("hmac-key".to_string()));
        let a = sink.sign("payload").unwrap();
        let b = sink.sign("payload").unwrap();
        assert_eq!(a, b);
        assert_ne!(sink.sign("other payload").unwrap(), a);
    }

    #[test]
    fn unsigned_when_no_key() {
        let sink = TracingAuditSink::new(None);
        assert!(sink.sign("payload").is_none());
    }

    #[test]
    fn event_serializes_with_screaming_fields() {
        let event = AuditEvent::rate_limit("10.0.0.1", "API_REQUEST_BLOCKED", "over limit");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"RATE_LIMIT\""));
        assert!(json.contains("\"DENIED\""));
    }
}
