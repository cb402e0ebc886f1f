//! PKCE authorization request: verifier/challenge pair, CSRF state, and the
//! authorization URL the user is sent to.

use std::collections::BTreeMap;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::config::{DiscoveryDocument, SignInConfig};

/// The only challenge method we send.
pub const CODE_CHALLENGE_METHOD: &str = "S256";

/// PKCE code verifier and challenge pair.
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub verifier: String,
    pub challenge: String,
}

impl PkceChallenge {
    /// Generate a new PKCE challenge pair.
    pub fn generate() -> Self {
        let mut verifier_bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut verifier_bytes);
        let verifier = URL_SAFE_NO_PAD.encode(verifier_bytes);
        let challenge = challenge_for(&verifier);

        Self {
            verifier,
            challenge,
        }
    }
}

/// S256 challenge for a verifier.
pub fn challenge_for(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Generate a random state string for CSRF protection.
pub fn generate_state() -> String {
    let mut state_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut state_bytes);
    URL_SAFE_NO_PAD.encode(state_bytes)
}

/// An authorization request as handed out by an auth session.
///
/// Verifier and state are optional because a session implementation may not
/// have produced them; the sign-in flow refuses to prompt without both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRequest {
    pub client_id: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub code_verifier: Option<String>,
    pub code_challenge: Option<String>,
    pub state: Option<String>,
    pub extra_params: BTreeMap<String, String>,
}

impl AuthRequest {
    /// Build a request with a fresh PKCE pair and CSRF state.
    pub fn generate(config: &SignInConfig) -> Self {
        let pkce = PkceChallenge::generate();
        Self {
            client_id: config.client_id.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scopes: config.scopes.clone(),
            code_verifier: Some(pkce.verifier),
            code_challenge: Some(pkce.challenge),
            state: Some(generate_state()),
            extra_params: config.extra_params.clone(),
        }
    }

    /// Authorization URL for this request, or `None` when the discovery
    /// document has no authorization endpoint.
    pub fn authorization_url(&self, discovery: &DiscoveryDocument) -> Option<String> {
        let endpoint = discovery.authorization_endpoint.as_deref()?;
        let scope = self.scopes.join(" ");

        let mut params: Vec<(&str, &str)> = vec![
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("response_type", "code"),
        ];
        if !scope.is_empty() {
            params.push(("scope", scope.as_str()));
        }
        if let Some(challenge) = &self.code_challenge {
            params.push(("code_challenge", challenge.as_str()));
            params.push(("code_challenge_method", CODE_CHALLENGE_METHOD));
        }
        if let Some(state) = &self.state {
            params.push(("state", state.as_str()));
        }
        for (k, v) in &self.extra_params {
            params.push((k.as_str(), v.as_str()));
        }

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let separator = if endpoint.contains('?') { '&' } else { '?' };
        Some(format!("{}{}{}", endpoint, separator, query))
    }
}
