//! Resolved identity attributes and their display serialization
//!
//! Attribute values are opaque to the controller: plain text, raw bytes, or
//! a structured federated `NameID`. The single normalization point is
//! [`AttributeValue::display_form`] — text passes through unchanged,
//! bytes are base64-encoded, structured objects render their canonical form.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Supported `NameID` formats
pub const NAMEID_FORMAT_EMAIL: &str = "urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress";
pub const NAMEID_FORMAT_PERSISTENT: &str = "urn:oasis:names:tc:SAML:2.0:nameid-format:persistent";
pub const NAMEID_FORMAT_TRANSIENT: &str = "urn:oasis:names:tc:SAML:2.0:nameid-format:transient";

/// An opaque federated identifier as produced by the assertion library.
///
/// The controller never inspects these fields for decisions; the only
/// operation it needs is rendering the canonical displayable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameId {
    pub value: String,
    pub format: Option<String>,
    pub name_qualifier: Option<String>,
    pub sp_name_qualifier: Option<String>,
}

impl NameId {
    pub fn new(value: impl Into<String>, format: Option<String>) -> Self {
        Self {
            value: value.into(),
            format,
            name_qualifier: None,
            sp_name_qualifier: None,
        }
    }

    /// Canonical displayable form, with optional qualifiers in fixed order.
    #[must_use]
    pub fn canonical(&self) -> String {
        let mut parts = Vec::new();
        if let Some(ref format) = self.format {
            parts.push(format!("Format={format}"));
        }
        if let Some(ref nq) = self.name_qualifier {
            parts.push(format!("NameQualifier={nq}"));
        }
        if let Some(ref spnq) = self.sp_name_qualifier {
            parts.push(format!("SPNameQualifier={spnq}"));
        }
        parts.push(format!("Value={}", self.value));
        format!("NameID({})", parts.join(", "))
    }
}

/// One attribute value as produced by an authentication source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// Plain text scalar, passed through to display unchanged
    Text(String),
    /// Raw binary scalar, base64-encoded for display
    Bytes(Vec<u8>),
    /// Opaque structured identifier
    NameId(NameId),
}

impl AttributeValue {
    /// Serialize this value for display.
    #[must_use]
    pub fn display_form(&self) -> String {
        match self {
            AttributeValue::Text(s) => s.clone(),
            AttributeValue::Bytes(b) => STANDARD.encode(b),
            AttributeValue::NameId(name_id) => name_id.canonical(),
        }
    }
}

/// A named attribute with its values, in production order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub values: Vec<AttributeValue>,
}

/// The resolved attributes for an authenticated principal.
///
/// Order-preserving: attributes keep the order the source produced them,
/// and values within an attribute keep theirs. Values are never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSet(Vec<Attribute>);

impl AttributeSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, values: Vec<AttributeValue>) {
        self.0.push(Attribute {
            name: name.into(),
            values,
        });
    }

    /// Exact-name lookup; no prefix or case-folding semantics.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.0.iter().find(|a| a.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Normalize every value for display, preserving order and multiplicity.
    #[must_use]
    pub fn normalize_for_display(&self) -> Vec<DisplayAttribute> {
        self.0
            .iter()
            .map(|attr| DisplayAttribute {
                name: attr.name.clone(),
                values: attr.values.iter().map(AttributeValue::display_form).collect(),
            })
            .collect()
    }
}

impl FromIterator<(String, Vec<AttributeValue>)> for AttributeSet {
    fn from_iter<T: IntoIterator<Item = (String, Vec<AttributeValue>)>>(iter: T) -> Self {
        let mut set = Self::new();
        for (name, values) in iter {
            set.push(name, values);
        }
        set
    }
}

/// An attribute normalized for rendering.
///
/// Serialized as a sequence (never a map) so attribute order survives the
/// render boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DisplayAttribute {
    pub name: String,
    pub values: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_passes_through() {
        let value = AttributeValue::Text("a@x.com".to_string());
        assert_eq!(value.display_form(), "a@x.com");
    }

    #[test]
    fn test_bytes_are_base64_encoded() {
        let value = AttributeValue::Bytes(vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(value.display_form(), "3q2+7w==");
    }

    #[test]
    fn test_name_id_canonical_form() {
        let name_id = NameId {
            value: "user-123".to_string(),
            format: Some(NAMEID_FORMAT_PERSISTENT.to_string()),
            name_qualifier: Some("https://idp.example.com".to_string()),
            sp_name_qualifier: None,
        };
        assert_eq!(
            AttributeValue::NameId(name_id).display_form(),
            format!(
                "NameID(Format={NAMEID_FORMAT_PERSISTENT}, \
                 NameQualifier=https://idp.example.com, Value=user-123)"
            )
        );
    }

    #[test]
    fn test_name_id_without_qualifiers() {
        let name_id = NameId::new("abc", None);
        assert_eq!(name_id.canonical(), "NameID(Value=abc)");
    }

    #[test]
    fn test_normalize_preserves_order_and_multiplicity() {
        let mut attrs = AttributeSet::new();
        attrs.push(
            "mail",
            vec![
                AttributeValue::Text("a@x.com".to_string()),
                AttributeValue::Text("b@x.com".to_string()),
            ],
        );
        attrs.push("cn", vec![AttributeValue::Text("Name".to_string())]);

        let display = attrs.normalize_for_display();
        assert_eq!(display.len(), 2);
        assert_eq!(display[0].name, "mail");
        assert_eq!(display[0].values, vec!["a@x.com", "b@x.com"]);
        assert_eq!(display[1].name, "cn");
        assert_eq!(display[1].values, vec!["Name"]);
    }

    #[test]
    fn test_exact_name_lookup() {
        let mut attrs = AttributeSet::new();
        attrs.push("mail", vec![AttributeValue::Text("a@x.com".to_string())]);

        assert!(attrs.get("mail").is_some());
        assert!(attrs.get("mai").is_none());
        assert!(attrs.get("MAIL").is_none());
    }
}
