//! Admin diagnostic "whoami" page for federated authentication sources
//!
//! This crate provides the diagnostic controller an administrator uses to
//! exercise configured authentication sources:
//! - Source-selection list when no source is named
//! - Login-flow hand-off for unauthenticated sessions, with failure state
//!   captured across the identity-provider round trip
//! - Re-raising a captured failure when the flow returns with its reference
//! - Per-source logout and a logged-out confirmation view
//! - Rendering the resolved identity attributes, normalized for display
//!
//! The admin-access gate, template engine and assertion library are external
//! collaborators; sources and the exception-state store are injected.

pub mod attributes;
pub mod controller;
pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod source;
pub mod state;

pub use attributes::{Attribute, AttributeSet, AttributeValue, DisplayAttribute, NameId};
pub use controller::{DiagController, DiagRequest};
pub use error::{DiagError, DiagResult, NOSTATE};
pub use handlers::DiagState;
pub use models::{Outcome, RedirectInstruction, RenderInstruction};
pub use router::{admin_diag_router, create_diag_state};
pub use source::{AuthSource, ReturnTo, SourceError, SourceRegistry, AUTH_DATA_NAME_ID};
pub use state::{ExceptionStateStore, InMemoryStateStore, StateStoreError, StoredFailure};
