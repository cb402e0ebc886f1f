//! The interactive half of the flow: handing out authorization requests and
//! presenting the login page.
//!
//! [`AuthSession`] is the seam to whatever drives the login on the platform
//! (a system browser, a secure web view, a test double). [`PkceAuthSession`]
//! is the stock implementation: it generates PKCE requests itself and leaves
//! only the presentation to a [`Presenter`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use url::Url;

use crate::config::{DiscoveryDocument, SignInConfig};
use crate::error::PromptError;
use crate::pkce::AuthRequest;

/// Outcome of an interactive prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResult {
    /// The provider redirected back with parameters (normally `code` and `state`).
    Success { params: BTreeMap<String, String> },
    /// The provider redirected back with an OAuth error.
    Error {
        params: BTreeMap<String, String>,
        error: Option<String>,
    },
    /// The user cancelled the prompt.
    Cancel,
    /// The prompt was dismissed without a result.
    Dismiss,
    /// Another prompt is already in progress.
    Locked,
    /// The login page was opened but nothing came back.
    Opened,
}

impl PromptResult {
    /// Success carrying a code and a state.
    pub fn success(code: impl Into<String>, state: impl Into<String>) -> Self {
        let mut params = BTreeMap::new();
        params.insert("code".to_string(), code.into());
        params.insert("state".to_string(), state.into());
        Self::Success { params }
    }

    /// Look up a returned parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        match self {
            Self::Success { params } | Self::Error { params, .. } => {
                params.get(key).map(String::as_str)
            }
            _ => None,
        }
    }

    /// Parse the URL the browser was redirected to.
    ///
    /// Query and fragment parameters are both collected (fragment wins on
    /// conflict). An `error` parameter turns the result into [`PromptResult::Error`].
    pub fn from_redirect_url(redirect: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(redirect.trim())?;

        let mut params: BTreeMap<String, String> = url.query_pairs().into_owned().collect();
        if let Some(fragment) = url.fragment() {
            params.extend(url::form_urlencoded::parse(fragment.as_bytes()).into_owned());
        }

        if params.contains_key("error") {
            let error = params
                .get("error_description")
                .or_else(|| params.get("error"))
                .cloned();
            return Ok(Self::Error { params, error });
        }

        Ok(Self::Success { params })
    }
}

/// Delegated capability that produces authorization requests and runs the
/// interactive prompt.
#[async_trait]
pub trait AuthSession: Send + Sync {
    /// Current authorization request, or `None` while it is still being prepared.
    fn auth_request(&self, config: &SignInConfig) -> Option<AuthRequest>;

    /// Present the login page for `request` and wait for its outcome.
    async fn prompt(
        &self,
        request: &AuthRequest,
        discovery: &DiscoveryDocument,
    ) -> Result<PromptResult, PromptError>;
}

/// Shows an authorization URL to the user and reports how it ended.
#[async_trait]
pub trait Presenter: Send + Sync {
    async fn present(
        &self,
        authorization_url: &str,
        redirect_uri: &str,
    ) -> Result<PromptResult, PromptError>;
}

/// [`AuthSession`] that generates S256 PKCE requests and delegates display.
#[derive(Debug, Clone)]
pub struct PkceAuthSession<P> {
    presenter: P,
}

impl<P: Presenter> PkceAuthSession<P> {
    pub fn new(presenter: P) -> Self {
        Self { presenter }
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }
}

#[async_trait]
impl<P: Presenter> AuthSession for PkceAuthSession<P> {
    fn auth_request(&self, config: &SignInConfig) -> Option<AuthRequest> {
        Some(AuthRequest::generate(config))
    }

    async fn prompt(
        &self,
        request: &AuthRequest,
        discovery: &DiscoveryDocument,
    ) -> Result<PromptResult, PromptError> {
        let url = request
            .authorization_url(discovery)
            .ok_or("No discovery authorization endpoint")?;
        tracing::debug!(redirect_uri = %request.redirect_uri, "Presenting authorization page");
        self.presenter.present(&url, &request.redirect_uri).await
    }
}
