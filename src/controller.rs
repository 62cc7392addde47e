//! Admin-diagnostic authentication controller
//!
//! The decision core of the "whoami" admin page. Given an optional
//! authentication-source id it shows the configured sources, redirects into
//! a login flow, recovers a previously captured failure, logs the user out,
//! or renders the resolved identity attributes. Collaborators are injected,
//! never looked up.

use crate::error::{DiagError, DiagResult};
use crate::models::{
    LoggedOutView, Outcome, RedirectInstruction, RenderInstruction, SourceListView, WhoamiView,
    VIEW_LOGGED_OUT, VIEW_SOURCE_LIST, VIEW_STATUS,
};
use crate::source::{ReturnTo, SourceRegistry, AUTH_DATA_NAME_ID};
use crate::state::{ExceptionStateStore, StoredFailure, PARAM_ERROR_STATE, PARAM_LOGOUT};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// One inbound diagnostic request, already parsed from the transport.
#[derive(Debug, Clone, Default)]
pub struct DiagRequest {
    /// Which authentication source to exercise
    pub source_id: Option<String>,
    /// Exception reference, present when returning from a failed flow
    pub error_state: Option<String>,
    /// Presence-only logout marker
    pub logout: bool,
    /// Remaining query parameters, preserved when reconstructing the page URL
    pub extra: Vec<(String, String)>,
}

impl DiagRequest {
    #[must_use]
    pub fn for_source(source_id: impl Into<String>) -> Self {
        Self {
            source_id: Some(source_id.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_logout(mut self) -> Self {
        self.logout = true;
        self
    }

    #[must_use]
    pub fn with_error_state(mut self, reference: impl Into<String>) -> Self {
        self.error_state = Some(reference.into());
        self
    }

    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((name.into(), value.into()));
        self
    }
}

/// The admin-diagnostic controller.
///
/// Stateless between calls: all cross-call state lives in the injected
/// exception-state store and in each source's own session binding.
pub struct DiagController {
    sources: Arc<SourceRegistry>,
    state_store: Arc<dyn ExceptionStateStore>,
    base_url: String,
}

impl DiagController {
    pub fn new(
        sources: Arc<SourceRegistry>,
        state_store: Arc<dyn ExceptionStateStore>,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            sources,
            state_store,
            base_url,
        }
    }

    /// Main entry: resolve the request into exactly one render or redirect,
    /// or propagate a recovered failure.
    pub async fn main(&self, req: &DiagRequest) -> DiagResult<Outcome> {
        let Some(source_id) = req.source_id.as_deref() else {
            return Ok(Outcome::Render(render(
                VIEW_SOURCE_LIST,
                &SourceListView {
                    sources: self.sources.ids(),
                },
            )?));
        };

        // Exception recovery comes before anything that touches the source:
        // the captured failure is the whole answer for this request.
        if let Some(reference) = req.error_state.as_deref() {
            return Err(self.resume_or_fail(reference).await?);
        }

        let source = self
            .sources
            .get(source_id)
            .ok_or_else(|| DiagError::UnknownSource(source_id.to_string()))?;

        if req.logout {
            source.logout().await?;
            let location = self.page_url(source_id, &req.extra);
            tracing::info!(source_id = %source_id, "Diagnostic logout, redirecting back");
            return Ok(Outcome::Redirect(RedirectInstruction::to(location)));
        }

        if !source.is_authenticated().await? {
            return Ok(Outcome::Redirect(
                self.capture_and_suspend(source.as_ref(), source_id, &req.extra)
                    .await?,
            ));
        }

        let attributes = source.attributes().await?;
        let name_id = source
            .auth_data(AUTH_DATA_NAME_ID)
            .await?
            .map(|v| v.display_form());
        let auth_data = source.auth_data_array().await?.map(|pairs| {
            pairs
                .into_iter()
                .map(|(name, value)| crate::attributes::DisplayAttribute {
                    name,
                    values: vec![value.display_form()],
                })
                .collect()
        });

        tracing::info!(
            source_id = %source_id,
            attribute_count = attributes.len(),
            "Rendering resolved identity"
        );

        Ok(Outcome::Render(render(
            VIEW_STATUS,
            &WhoamiView {
                source_id: source_id.to_string(),
                attributes: attributes.normalize_for_display(),
                name_id,
                auth_data,
            },
        )?))
    }

    /// Logged-out confirmation page. Consults no source and no state.
    #[must_use]
    pub fn logout_page(&self) -> RenderInstruction {
        RenderInstruction {
            view: VIEW_LOGGED_OUT.to_string(),
            data: serde_json::json!(LoggedOutView {
                message: "You have been logged out.".to_string(),
            }),
        }
    }

    /// Load-then-propagate half of the exception round trip. A reference
    /// that does not resolve is a fatal inconsistency, never a no-op.
    async fn resume_or_fail(&self, reference: &str) -> DiagResult<DiagError> {
        let reference = Uuid::parse_str(reference).map_err(|_| DiagError::MissingState)?;
        let failure = self
            .state_store
            .load(reference)
            .await?
            .ok_or(DiagError::MissingState)?;

        tracing::warn!(
            state_ref = %reference,
            code = %failure.code,
            "Re-raising failure captured during login flow"
        );

        Ok(DiagError::Recovered(failure))
    }

    /// Store-then-redirect half of the exception round trip: register a
    /// placeholder failure, then hand control to the source's login flow
    /// with URLs that can resume this page.
    async fn capture_and_suspend(
        &self,
        source: &dyn crate::source::AuthSource,
        source_id: &str,
        extra: &[(String, String)],
    ) -> DiagResult<RedirectInstruction> {
        let reference = self
            .state_store
            .store(StoredFailure::login_interrupted(source_id))
            .await?;

        let return_to = ReturnTo {
            return_url: self.page_url(source_id, extra),
            error_url: self.error_url(source_id, reference),
        };

        tracing::info!(
            source_id = %source_id,
            state_ref = %reference,
            "Not authenticated, redirecting to login flow"
        );

        Ok(source.login_redirect(&return_to))
    }

    /// Page URL for a source, carrying `extra` minus the reserved markers.
    fn page_url(&self, source_id: &str, extra: &[(String, String)]) -> String {
        let mut url = format!(
            "{}/admin/test/{}",
            self.base_url,
            urlencoding::encode(source_id)
        );
        let query: Vec<String> = extra
            .iter()
            .filter(|(name, _)| name != PARAM_LOGOUT && name != PARAM_ERROR_STATE)
            .map(|(name, value)| {
                format!(
                    "{}={}",
                    urlencoding::encode(name),
                    urlencoding::encode(value)
                )
            })
            .collect();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }
        url
    }

    fn error_url(&self, source_id: &str, reference: Uuid) -> String {
        format!(
            "{}/admin/test/{}?{}={}",
            self.base_url,
            urlencoding::encode(source_id),
            PARAM_ERROR_STATE,
            reference
        )
    }
}

fn render<T: Serialize>(view: &str, body: &T) -> DiagResult<RenderInstruction> {
    Ok(RenderInstruction {
        view: view.to_string(),
        data: serde_json::to_value(body).map_err(|e| DiagError::Internal(e.to_string()))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{AttributeSet, AttributeValue, NameId, NAMEID_FORMAT_PERSISTENT};
    use crate::source::{AuthSource, SourceError};
    use crate::state::{InMemoryStateStore, CODE_LOGIN_FAILED};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MockSource {
        id: String,
        authenticated: bool,
        attrs: AttributeSet,
        name_id: Option<AttributeValue>,
        logout_calls: AtomicUsize,
        last_return_to: Mutex<Option<ReturnTo>>,
    }

    impl MockSource {
        fn new(id: &str, authenticated: bool) -> Self {
            Self {
                id: id.to_string(),
                authenticated,
                attrs: AttributeSet::new(),
                name_id: None,
                logout_calls: AtomicUsize::new(0),
                last_return_to: Mutex::new(None),
            }
        }

        fn with_attrs(mut self, attrs: AttributeSet) -> Self {
            self.attrs = attrs;
            self
        }

        fn with_name_id(mut self, name_id: AttributeValue) -> Self {
            self.name_id = Some(name_id);
            self
        }
    }

    #[async_trait]
    impl AuthSource for MockSource {
        fn id(&self) -> &str {
            &self.id
        }

        async fn is_authenticated(&self) -> Result<bool, SourceError> {
            Ok(self.authenticated)
        }

        fn login_redirect(&self, return_to: &ReturnTo) -> RedirectInstruction {
            *self.last_return_to.lock().unwrap() = Some(return_to.clone());
            RedirectInstruction::to(format!(
                "https://idp.example.com/login?return={}&error={}",
                urlencoding::encode(&return_to.return_url),
                urlencoding::encode(&return_to.error_url)
            ))
        }

        async fn logout(&self) -> Result<(), SourceError> {
            self.logout_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn attributes(&self) -> Result<AttributeSet, SourceError> {
            Ok(self.attrs.clone())
        }

        async fn auth_data(&self, name: &str) -> Result<Option<AttributeValue>, SourceError> {
            if name == AUTH_DATA_NAME_ID {
                Ok(self.name_id.clone())
            } else {
                Ok(None)
            }
        }

        async fn auth_data_array(
            &self,
        ) -> Result<Option<Vec<(String, AttributeValue)>>, SourceError> {
            Ok(self.name_id.clone().map(|v| vec![(AUTH_DATA_NAME_ID.to_string(), v)]))
        }
    }

    fn controller_with(
        sources: Vec<Arc<MockSource>>,
    ) -> (DiagController, Arc<InMemoryStateStore>) {
        let mut registry = SourceRegistry::new();
        for source in sources {
            registry.register(source);
        }
        let store = Arc::new(InMemoryStateStore::new());
        let controller = DiagController::new(
            Arc::new(registry),
            store.clone(),
            "https://sp.example.com/",
        );
        (controller, store)
    }

    #[tokio::test]
    async fn test_no_source_renders_source_list() {
        let (controller, _) = controller_with(vec![
            Arc::new(MockSource::new("saml-prod", false)),
            Arc::new(MockSource::new("saml-test", true)),
        ]);

        let outcome = controller.main(&DiagRequest::default()).await.unwrap();
        let Outcome::Render(render) = outcome else {
            panic!("expected render, got {outcome:?}");
        };
        assert_eq!(render.view, VIEW_SOURCE_LIST);
        assert_eq!(
            render.data["sources"],
            serde_json::json!(["saml-prod", "saml-test"])
        );
    }

    #[tokio::test]
    async fn test_source_list_independent_of_auth_state() {
        // Same request, one source authenticated, one not: still just a list
        let (controller, _) = controller_with(vec![Arc::new(MockSource::new("only", true))]);
        let outcome = controller.main(&DiagRequest::default()).await.unwrap();
        assert!(matches!(outcome, Outcome::Render(_)));
    }

    #[tokio::test]
    async fn test_logout_marker_redirects_with_marker_stripped() {
        let source = Arc::new(MockSource::new("saml-prod", true));
        let (controller, _) = controller_with(vec![source.clone()]);

        let req = DiagRequest::for_source("saml-prod")
            .with_logout()
            .with_param("tab", "attributes");
        let outcome = controller.main(&req).await.unwrap();

        let Outcome::Redirect(redirect) = outcome else {
            panic!("expected redirect, got {outcome:?}");
        };
        assert_eq!(
            redirect.location,
            "https://sp.example.com/admin/test/saml-prod?tab=attributes"
        );
        assert!(!redirect.location.contains("logout"));
        assert_eq!(source.logout_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let source = Arc::new(MockSource::new("saml-prod", false));
        let (controller, _) = controller_with(vec![source.clone()]);

        let req = DiagRequest::for_source("saml-prod").with_logout();
        assert!(matches!(
            controller.main(&req).await.unwrap(),
            Outcome::Redirect(_)
        ));
        assert!(matches!(
            controller.main(&req).await.unwrap(),
            Outcome::Redirect(_)
        ));
        assert_eq!(source.logout_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unresolvable_reference_is_nostate() {
        let (controller, _) = controller_with(vec![Arc::new(MockSource::new("saml-prod", true))]);

        let req = DiagRequest::for_source("saml-prod")
            .with_error_state(Uuid::new_v4().to_string());
        let err = controller.main(&req).await.unwrap_err();

        assert!(matches!(err, DiagError::MissingState));
        assert_eq!(err.to_string(), "NOSTATE");
    }

    #[tokio::test]
    async fn test_malformed_reference_is_nostate() {
        let (controller, _) = controller_with(vec![Arc::new(MockSource::new("saml-prod", true))]);

        let req = DiagRequest::for_source("saml-prod").with_error_state("not-a-reference");
        let err = controller.main(&req).await.unwrap_err();
        assert!(matches!(err, DiagError::MissingState));
    }

    #[tokio::test]
    async fn test_stored_failure_is_reraised_verbatim() {
        let (controller, store) =
            controller_with(vec![Arc::new(MockSource::new("saml-prod", true))]);

        let failure = StoredFailure::new("LOGINFAILED", "IdP rejected the assertion");
        let reference = store.store(failure.clone()).await.unwrap();

        let req = DiagRequest::for_source("saml-prod").with_error_state(reference.to_string());
        let err = controller.main(&req).await.unwrap_err();

        let DiagError::Recovered(recovered) = err else {
            panic!("expected recovered failure, got {err:?}");
        };
        assert_eq!(recovered, failure);
    }

    #[tokio::test]
    async fn test_recovery_takes_precedence_over_logout_marker() {
        let source = Arc::new(MockSource::new("saml-prod", true));
        let (controller, store) = controller_with(vec![source.clone()]);
        let reference = store
            .store(StoredFailure::new("X", "boom"))
            .await
            .unwrap();

        let req = DiagRequest::for_source("saml-prod")
            .with_error_state(reference.to_string())
            .with_logout();
        let err = controller.main(&req).await.unwrap_err();

        assert!(matches!(err, DiagError::Recovered(_)));
        assert_eq!(source.logout_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unauthenticated_suspends_into_login_flow() {
        let source = Arc::new(MockSource::new("saml-prod", false));
        let (controller, store) = controller_with(vec![source.clone()]);

        let req = DiagRequest::for_source("saml-prod");
        let outcome = controller.main(&req).await.unwrap();
        assert!(matches!(outcome, Outcome::Redirect(_)));

        let return_to = source.last_return_to.lock().unwrap().clone().unwrap();
        assert_eq!(
            return_to.return_url,
            "https://sp.example.com/admin/test/saml-prod"
        );

        // The error URL embeds a reference that resolves in the store
        let reference = return_to
            .error_url
            .split("error_state=")
            .nth(1)
            .and_then(|r| Uuid::parse_str(r).ok())
            .expect("error URL carries a parseable reference");
        let captured = store.load(reference).await.unwrap().unwrap();
        assert_eq!(captured.code, CODE_LOGIN_FAILED);
    }

    #[tokio::test]
    async fn test_concurrent_suspensions_get_distinct_references() {
        let source_a = Arc::new(MockSource::new("a", false));
        let source_b = Arc::new(MockSource::new("b", false));
        let (controller, _) = controller_with(vec![source_a.clone(), source_b.clone()]);

        controller.main(&DiagRequest::for_source("a")).await.unwrap();
        controller.main(&DiagRequest::for_source("b")).await.unwrap();

        let error_a = source_a.last_return_to.lock().unwrap().clone().unwrap().error_url;
        let error_b = source_b.last_return_to.lock().unwrap().clone().unwrap().error_url;
        assert_ne!(error_a, error_b);
    }

    #[tokio::test]
    async fn test_authenticated_renders_normalized_attributes() {
        let mut attrs = AttributeSet::new();
        attrs.push(
            "mail",
            vec![
                AttributeValue::Text("a@x.com".to_string()),
                AttributeValue::Text("b@x.com".to_string()),
            ],
        );
        attrs.push("cn", vec![AttributeValue::Text("Name".to_string())]);

        let source = Arc::new(
            MockSource::new("saml-prod", true)
                .with_attrs(attrs)
                .with_name_id(AttributeValue::NameId(NameId::new(
                    "user-123",
                    Some(NAMEID_FORMAT_PERSISTENT.to_string()),
                ))),
        );
        let (controller, _) = controller_with(vec![source]);

        let outcome = controller
            .main(&DiagRequest::for_source("saml-prod"))
            .await
            .unwrap();
        let Outcome::Render(render) = outcome else {
            panic!("expected render, got {outcome:?}");
        };
        assert_eq!(render.view, VIEW_STATUS);

        // Exactly those two attributes, values and order intact
        let attributes = render.data["attributes"].as_array().unwrap();
        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes[0]["name"], "mail");
        assert_eq!(
            attributes[0]["values"],
            serde_json::json!(["a@x.com", "b@x.com"])
        );
        assert_eq!(attributes[1]["name"], "cn");
        assert_eq!(attributes[1]["values"], serde_json::json!(["Name"]));

        // Opaque NameID serialized to a non-null displayable form
        let name_id = render.data["name_id"].as_str().unwrap();
        assert!(name_id.contains("user-123"));
        assert!(name_id.starts_with("NameID("));
    }

    #[tokio::test]
    async fn test_authenticated_render_without_auth_data() {
        let source = Arc::new(MockSource::new("saml-prod", true));
        let (controller, _) = controller_with(vec![source]);

        let outcome = controller
            .main(&DiagRequest::for_source("saml-prod"))
            .await
            .unwrap();
        let Outcome::Render(render) = outcome else {
            panic!("expected render, got {outcome:?}");
        };
        assert!(render.data.get("name_id").is_none());
        assert_eq!(render.data["attributes"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_unknown_source_fails() {
        let (controller, _) = controller_with(vec![Arc::new(MockSource::new("saml-prod", true))]);

        let err = controller
            .main(&DiagRequest::for_source("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, DiagError::UnknownSource(id) if id == "nope"));
    }

    #[tokio::test]
    async fn test_logout_page_always_renders() {
        let (controller, _) = controller_with(vec![]);
        let render = controller.logout_page();
        assert_eq!(render.view, VIEW_LOGGED_OUT);
        assert!(render.data["message"].as_str().unwrap().contains("logged out"));
    }
}
