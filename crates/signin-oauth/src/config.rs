//! Sign-in configuration and the provider's discovery document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Redirects must be universal/app links, which only exist on https.
const SECURE_REDIRECT_PREFIX: &str = "https://";

/// Endpoints published by the authorization server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,
}

impl DiscoveryDocument {
    pub fn new(
        authorization_endpoint: impl Into<String>,
        token_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            authorization_endpoint: Some(authorization_endpoint.into()),
            token_endpoint: Some(token_endpoint.into()),
        }
    }
}

/// Configuration for a single sign-in attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInConfig {
    pub client_id: String,
    pub redirect_uri: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub discovery: DiscoveryDocument,
    /// Additional query parameters for the authorization URL.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_params: BTreeMap<String, String>,
}

impl SignInConfig {
    pub fn new(client_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            scopes: Vec::new(),
            discovery: DiscoveryDocument::default(),
            extra_params: BTreeMap::new(),
        }
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_discovery(mut self, discovery: DiscoveryDocument) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn with_extra_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_params.insert(key.into(), value.into());
        self
    }

    /// Whether the redirect URI is an https universal/app link.
    pub fn has_secure_redirect(&self) -> bool {
        self.redirect_uri.starts_with(SECURE_REDIRECT_PREFIX)
    }

    /// Space-separated scope string as sent on the wire.
    pub fn scope(&self) -> String {
        self.scopes.join(" ")
    }
}
