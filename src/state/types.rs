//! Exception-state types for the admin diagnostic flow
//!
//! A failure captured before handing control to an identity provider is
//! persisted under an opaque reference so a later request can correlate
//! back to it and re-raise it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Reserved query parameter carrying the exception reference.
pub const PARAM_ERROR_STATE: &str = "error_state";

/// Reserved query parameter marking a logout request (presence-only).
pub const PARAM_LOGOUT: &str = "logout";

/// Failure code used for the placeholder stored before the login redirect.
pub const CODE_LOGIN_FAILED: &str = "LOGINFAILED";

/// Default TTL for exception-state entries (1 hour).
///
/// A successful login never presents its reference, so entries left behind
/// by completed flows are reclaimed by expiry.
pub const DEFAULT_STATE_TTL_SECONDS: i64 = 3600;

/// A captured failure, stored across the identity-provider round trip.
///
/// Re-raised verbatim when the flow resumes with a matching reference, so
/// the `Display` output is the failure's own message with no wrapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct StoredFailure {
    /// Machine-readable failure code
    pub code: String,
    /// Human-readable message, shown on the upstream error page
    pub message: String,
}

impl StoredFailure {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Placeholder captured at the login suspension point, before control
    /// leaves the process for the identity provider.
    pub fn login_interrupted(source_id: &str) -> Self {
        Self::new(
            CODE_LOGIN_FAILED,
            format!("Login with authentication source '{source_id}' did not complete"),
        )
    }
}

/// A stored exception-state record, addressed by an unguessable reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateEntry {
    /// Reference id handed back to the flow (never sequential, never reused)
    pub reference: Uuid,
    /// The captured failure
    pub failure: StoredFailure,
    /// When the entry was stored
    pub created_at: DateTime<Utc>,
    /// When the entry becomes reclaimable
    pub expires_at: DateTime<Utc>,
}

impl StateEntry {
    /// Create an entry with the default TTL
    pub fn new(failure: StoredFailure) -> Self {
        Self::with_ttl(failure, DEFAULT_STATE_TTL_SECONDS)
    }

    /// Create an entry with a custom TTL
    pub fn with_ttl(failure: StoredFailure, ttl_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            reference: Uuid::new_v4(),
            failure,
            created_at: now,
            expires_at: now + chrono::Duration::seconds(ttl_seconds),
        }
    }

    /// Whether this entry is past its TTL
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Exception-state store errors
#[derive(Debug, Error, Clone)]
pub enum StateStoreError {
    /// Underlying storage failure
    #[error("State storage error: {0}")]
    StorageError(String),
}
