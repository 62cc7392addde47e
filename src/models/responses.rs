//! Terminal outputs of a controller call and the view bodies they carry

use crate::attributes::DisplayAttribute;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// View name for the source-selection list
pub const VIEW_SOURCE_LIST: &str = "authsource_list";
/// View name for the resolved-identity ("whoami") page
pub const VIEW_STATUS: &str = "status";
/// View name for the logged-out confirmation page
pub const VIEW_LOGGED_OUT: &str = "logged_out";

/// Instruction to render a named view with its data mapping.
///
/// The rendering engine itself is an external collaborator; this is the
/// whole contract with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RenderInstruction {
    pub view: String,
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
}

/// Instruction to redirect the caller to `location`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RedirectInstruction {
    pub location: String,
}

impl RedirectInstruction {
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }
}

/// The terminal output of a controller call: exactly one of render or
/// redirect. The exception-recovery path produces neither and returns an
/// error instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Render(RenderInstruction),
    Redirect(RedirectInstruction),
}

/// Body of the source-selection view
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SourceListView {
    pub sources: Vec<String>,
}

/// Body of the resolved-identity view
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WhoamiView {
    pub source_id: String,
    /// Normalized attributes, order-preserving
    pub attributes: Vec<DisplayAttribute>,
    /// Serialized persistent identifier, when the source produced one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_id: Option<String>,
    /// Other authentication-result values, serialized for display
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_data: Option<Vec<DisplayAttribute>>,
}

/// Body of the logged-out confirmation view
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoggedOutView {
    pub message: String,
}
