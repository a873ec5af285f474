//! Authentication and session lifecycle core for the medication reminder
//! backend.
//!
//! **Security features**:
//! - Argon2id credential verification
//! - HMAC-signed JWT access/refresh pairs with a single shared codec
//! - Refresh token rotation with replay detection (single-use tokens,
//!   at most one live refresh token per principal)
//! - In-memory token blacklists with lazy TTL eviction
//! - Sliding-window rate limiting, with a tighter policy for the refresh
//!   endpoint
//! - One signed audit record per security decision
//!
//! The document store, OCR pipeline, and HTTP wiring live in the
//! surrounding service; this crate owns only the auth state machine.

pub mod audit;
pub mod config;
pub mod error;
pub mod models;
pub mod security;
pub mod session;
pub mod store;
pub mod telemetry;

pub use audit::{AuditEvent, AuditSink, AuditStatus, MemoryAuditSink, TracingAuditSink};
pub use config::Config;
pub use error::{AuthError, Result};
pub use models::{Principal, Role, TokenPair};
pub use security::jwt::{Claims, TokenCodec};
pub use security::rate_limit::{request_identifier, RateLimitPolicy, SlidingWindowLimiter};
pub use security::revocation::{RevocationStore, TokenFlavor};
pub use session::SessionManager;
pub use store::{InMemoryPrincipalStore, PrincipalStore};
