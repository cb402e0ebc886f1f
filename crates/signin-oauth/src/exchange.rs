//! Authorization code exchange against the token endpoint.

use serde::{Deserialize, Serialize};

use crate::error::{SignInError, SignInErrorKind};
use crate::pending::{PendingSlot, SharedPendingSlot};

/// Successful sign-in payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInData {
    pub access_token: String,
}

/// Outcome of a sign-in attempt or a code exchange.
pub type ExchangeResult = Result<SignInData, SignInError>;

#[derive(Debug, Serialize)]
struct TokenExchangeRequest<'a> {
    code: &'a str,
    grant_type: &'a str,
    redirect_uri: &'a str,
    code_verifier: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Validates a returned code + CSRF state against the pending request and
/// trades the code for an access token.
#[derive(Debug, Clone)]
pub struct CodeExchanger {
    slot: SharedPendingSlot,
    http: reqwest::Client,
}

impl CodeExchanger {
    pub fn new(slot: SharedPendingSlot) -> Self {
        Self {
            slot,
            http: reqwest::Client::new(),
        }
    }

    /// Exchanger bound to the process-wide pending slot.
    pub fn global() -> Self {
        Self::new(PendingSlot::global())
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Exchange `code` for an access token.
    ///
    /// Checks run in order and the first failure is returned: a request must
    /// have been issued, its discovery document must name a token endpoint,
    /// a code must be present, and `csrf_state` must equal the issued state
    /// byte for byte.
    pub async fn exchange(&self, code: Option<&str>, csrf_state: Option<&str>) -> ExchangeResult {
        let pending = self.slot.get().ok_or(SignInErrorKind::NoPriorRequest)?;

        let token_endpoint = pending
            .discovery
            .token_endpoint
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or(SignInErrorKind::MissingTokenEndpoint)?;

        let code = code
            .filter(|c| !c.is_empty())
            .ok_or(SignInErrorKind::MissingAuthorizationCode)?;

        if csrf_state.is_none_or(|s| s.is_empty() || s != pending.csrf_state) {
            return Err(SignInErrorKind::CsrfMismatch.into());
        }

        let request_body = TokenExchangeRequest {
            code,
            grant_type: "authorization_code",
            redirect_uri: &pending.redirect_uri,
            code_verifier: &pending.code_verifier,
        };

        tracing::debug!(token_endpoint, "Exchanging authorization code");

        let response = self
            .http
            .post(token_endpoint)
            .basic_auth(&pending.client_id, Some(""))
            .form(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Token endpoint rejected code exchange");
            return Err(SignInError::token_request_failed(status.as_u16()));
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(SignInError::invalid_token_response)?;

        tracing::info!("Access token obtained");
        Ok(SignInData {
            access_token: tokens.access_token,
        })
    }
}

/// Exchange a code against the process-wide pending request.
pub async fn sign_in_with_authorization_code(
    code: Option<&str>,
    csrf_state: Option<&str>,
) -> ExchangeResult {
    CodeExchanger::global().exchange(code, csrf_state).await
}
