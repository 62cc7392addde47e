//! Authentication-source capability interface
//!
//! An [`AuthSource`] is one configured identity-provider binding. The
//! controller consumes sources only through this trait, so test doubles and
//! alternate protocol bindings can be substituted without touching the
//! decision logic.

use crate::attributes::{AttributeSet, AttributeValue};
use crate::models::RedirectInstruction;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Authentication-result entry holding the persistent federated identifier.
pub const AUTH_DATA_NAME_ID: &str = "saml:sp:NameID";

/// Where the login flow should send the user agent afterwards.
///
/// `error_url` carries the exception reference so a provider-side failure
/// can be correlated back to its captured state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnTo {
    pub return_url: String,
    pub error_url: String,
}

/// Authentication-source errors
#[derive(Debug, Error, Clone)]
pub enum SourceError {
    /// Source configuration is unusable
    #[error("Authentication source misconfigured: {0}")]
    Misconfigured(String),

    /// Session binding could not be read
    #[error("Session error: {0}")]
    Session(String),
}

/// One configured identity-provider binding.
#[async_trait]
pub trait AuthSource: Send + Sync {
    /// Identifier this source is registered under
    fn id(&self) -> &str;

    /// Whether the current session is authenticated against this source
    async fn is_authenticated(&self) -> Result<bool, SourceError>;

    /// The redirect that hands control to this source's login flow.
    ///
    /// Control leaves the process at this boundary; the flow resumes only
    /// through one of the URLs in `return_to`.
    fn login_redirect(&self, return_to: &ReturnTo) -> RedirectInstruction;

    /// Terminate the session binding for this source
    async fn logout(&self) -> Result<(), SourceError>;

    /// Resolved attributes for the authenticated principal
    async fn attributes(&self) -> Result<AttributeSet, SourceError>;

    /// Single named authentication-result value
    async fn auth_data(&self, name: &str) -> Result<Option<AttributeValue>, SourceError>;

    /// All authentication-result values, when the source exposes them
    async fn auth_data_array(
        &self,
    ) -> Result<Option<Vec<(String, AttributeValue)>>, SourceError>;
}

/// The set of configured authentication sources, in registration order.
#[derive(Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn AuthSource>>,
}

impl SourceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, source: Arc<dyn AuthSource>) {
        self.sources.push(source);
    }

    /// Exact-id lookup
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<dyn AuthSource>> {
        self.sources.iter().find(|s| s.id() == id).cloned()
    }

    /// Registered source ids, in registration order
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.id().to_string()).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
