//! Config file schema.
//!
//! ```toml
//! [oauth]
//! client_id = "my-client"
//! redirect_uri = "https://example.com/oauth/callback/my-app"
//! scopes = ["account.info:basic"]
//!
//! [oauth.discovery]
//! authorization_endpoint = "https://id.example.com/oauth/authorize"
//! token_endpoint = "https://api.example.com/oauth/token"
//!
//! [oauth.extra_params]
//! prompt = "login"
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use signin_oauth::{DiscoveryDocument, SignInConfig};

use crate::{ConfigError, Result};

/// Environment variable overriding `oauth.client_id`.
pub const CLIENT_ID_ENV: &str = "SIGNIN_CLIENT_ID";

/// Environment variable overriding `oauth.redirect_uri`.
pub const REDIRECT_URI_ENV: &str = "SIGNIN_REDIRECT_URI";

/// Root of a config file. Every field is optional so layers can be merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SigninConfig {
    /// OAuth client configuration.
    pub oauth: Option<OAuthSection>,
}

/// The `[oauth]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OAuthSection {
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub scopes: Option<Vec<String>>,
    pub discovery: Option<DiscoverySection>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_params: BTreeMap<String, String>,
}

/// The `[oauth.discovery]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoverySection {
    pub authorization_endpoint: Option<String>,
    pub token_endpoint: Option<String>,
}

impl SigninConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: SigninConfig) {
        let Some(layer) = other.oauth else {
            return;
        };
        if let Some(base) = self.oauth.as_mut() {
            base.merge(layer);
        } else {
            self.oauth = Some(layer);
        }
    }

    /// Apply overrides from a variable lookup (normally the process environment).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let client_id = non_empty(CLIENT_ID_ENV);
        let redirect_uri = non_empty(REDIRECT_URI_ENV);
        if client_id.is_none() && redirect_uri.is_none() {
            return;
        }

        let oauth = self.oauth.get_or_insert_with(OAuthSection::default);
        if client_id.is_some() {
            oauth.client_id = client_id;
        }
        if redirect_uri.is_some() {
            oauth.redirect_uri = redirect_uri;
        }
    }

    /// Apply `SIGNIN_*` environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Resolve into a sign-in configuration.
    ///
    /// `client_id` and `redirect_uri` are required. Discovery endpoints are
    /// left optional here; the sign-in flow reports their absence itself.
    pub fn sign_in_config(&self) -> Result<SignInConfig> {
        let oauth = self.oauth.as_ref().ok_or_else(|| missing("client_id"))?;
        let client_id = oauth.client_id.clone().ok_or_else(|| missing("client_id"))?;
        let redirect_uri = oauth
            .redirect_uri
            .clone()
            .ok_or_else(|| missing("redirect_uri"))?;

        let discovery = oauth
            .discovery
            .as_ref()
            .map(|d| DiscoveryDocument {
                authorization_endpoint: d.authorization_endpoint.clone(),
                token_endpoint: d.token_endpoint.clone(),
            })
            .unwrap_or_default();

        Ok(SignInConfig {
            client_id,
            redirect_uri,
            scopes: oauth.scopes.clone().unwrap_or_default(),
            discovery,
            extra_params: oauth.extra_params.clone(),
        })
    }
}

impl OAuthSection {
    fn merge(&mut self, other: OAuthSection) {
        if other.client_id.is_some() {
            self.client_id = other.client_id;
        }
        if other.redirect_uri.is_some() {
            self.redirect_uri = other.redirect_uri;
        }
        if other.scopes.is_some() {
            self.scopes = other.scopes;
        }
        if let Some(layer) = other.discovery {
            let base = self.discovery.get_or_insert_with(DiscoverySection::default);
            if layer.authorization_endpoint.is_some() {
                base.authorization_endpoint = layer.authorization_endpoint;
            }
            if layer.token_endpoint.is_some() {
                base.token_endpoint = layer.token_endpoint;
            }
        }
        self.extra_params.extend(other.extra_params);
    }
}

fn missing(field: &str) -> ConfigError {
    ConfigError::MissingField {
        field: field.to_string(),
        context: "[oauth]".to_string(),
    }
}
