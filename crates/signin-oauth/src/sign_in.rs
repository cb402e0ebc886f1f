//! Request initiator: drives one sign-in attempt from config validation to
//! the code exchange.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::SignInConfig;
use crate::error::{SignInError, SignInErrorKind};
use crate::exchange::{CodeExchanger, ExchangeResult};
use crate::pending::{PendingExchangeState, PendingSlot, SharedPendingSlot};
use crate::pkce::AuthRequest;
use crate::session::{AuthSession, PromptResult};

/// Clears the loading flag when dropped.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn set(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// OAuth authorization code + PKCE sign-in bound to one configuration.
///
/// # Example
///
/// ```no_run
/// use signin_oauth::{DiscoveryDocument, PkceAuthSession, Presenter, SignInConfig, SignInOAuth};
///
/// # async fn example<P: Presenter>(presenter: P) {
/// let config = SignInConfig::new("my-client", "https://example.com/oauth/callback")
///     .with_scopes(["account.info:basic"])
///     .with_discovery(DiscoveryDocument::new(
///         "https://id.example.com/oauth/authorize",
///         "https://api.example.com/oauth/token",
///     ));
///
/// let sign_in = SignInOAuth::new(config, PkceAuthSession::new(presenter));
/// match sign_in.sign_in().await {
///     Ok(data) => println!("token: {}", data.access_token),
///     Err(e) if e.is_cancelled() => {}
///     Err(e) => eprintln!("sign-in failed: {e}"),
/// }
/// # }
/// ```
pub struct SignInOAuth<S> {
    config: SignInConfig,
    session: S,
    slot: SharedPendingSlot,
    exchanger: CodeExchanger,
    loading: AtomicBool,
}

impl<S: AuthSession> SignInOAuth<S> {
    /// Sign-in using the process-wide pending slot.
    pub fn new(config: SignInConfig, session: S) -> Self {
        Self::with_slot(config, session, PendingSlot::global())
    }

    /// Sign-in using a caller-provided pending slot.
    pub fn with_slot(config: SignInConfig, session: S, slot: SharedPendingSlot) -> Self {
        Self {
            exchanger: CodeExchanger::new(slot.clone()),
            config,
            session,
            slot,
            loading: AtomicBool::new(false),
        }
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.exchanger = self.exchanger.with_http_client(http);
        self
    }

    pub fn config(&self) -> &SignInConfig {
        &self.config
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// True while an attempt is between its first guard and its result.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Run one sign-in attempt.
    ///
    /// Every failure comes back as a [`SignInError`]; none is retried.
    pub async fn sign_in(&self) -> ExchangeResult {
        if !self.config.has_secure_redirect() {
            tracing::error!(
                redirect_uri = %self.config.redirect_uri,
                "OAuth invalid redirectUri error"
            );
            return Err(SignInErrorKind::InvalidRedirectUri.into());
        }

        let Some(request) = self.session.auth_request(&self.config) else {
            return Err(SignInErrorKind::RequestNotReady.into());
        };

        let _loading = LoadingGuard::set(&self.loading);

        let result = self.prompt_and_exchange(&request).await;
        if let Err(e) = &result
            && !e.is_cancelled()
        {
            tracing::error!(error = %e, kind = ?e.kind(), "OAuth sign in error");
        }
        result
    }

    async fn prompt_and_exchange(&self, request: &AuthRequest) -> ExchangeResult {
        let code_verifier = non_empty(&request.code_verifier)
            .ok_or(SignInErrorKind::MissingCodeVerifier)?;
        let csrf_state =
            non_empty(&request.state).ok_or(SignInErrorKind::MissingCsrfState)?;
        if non_empty(&self.config.discovery.token_endpoint).is_none() {
            return Err(SignInErrorKind::MissingTokenEndpoint.into());
        }

        self.slot.store(PendingExchangeState {
            client_id: self.config.client_id.clone(),
            redirect_uri: self.config.redirect_uri.clone(),
            discovery: self.config.discovery.clone(),
            code_verifier: code_verifier.to_string(),
            csrf_state: csrf_state.to_string(),
        });

        tracing::debug!(client_id = %self.config.client_id, "Prompting for authorization");
        let outcome = self
            .session
            .prompt(request, &self.config.discovery)
            .await
            .map_err(SignInError::prompt)?;

        match outcome {
            PromptResult::Cancel | PromptResult::Dismiss => {
                tracing::info!("Sign-in cancelled by user");
                Err(SignInErrorKind::UserCancelled.into())
            }
            PromptResult::Success { params } => {
                let code = params.get("code").map(String::as_str);
                let state = params.get("state").map(String::as_str);
                self.exchanger.exchange(code, state).await
            }
            other => {
                tracing::debug!(outcome = ?other, "Prompt finished without success");
                Err(SignInErrorKind::NoResponse.into())
            }
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::error::Error as _;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use tokio::sync::Notify;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::DiscoveryDocument;
    use crate::error::PromptError;

    const TOKEN_PATH: &str = "/oauth/token";

    #[derive(Clone)]
    enum Outcome {
        Result(PromptResult),
        Fail(&'static str),
    }

    struct MockSession {
        request: Option<AuthRequest>,
        outcome: Outcome,
        prompts: AtomicUsize,
        gate: Option<Arc<Notify>>,
    }

    impl MockSession {
        fn new(outcome: Outcome) -> Self {
            Self {
                request: Some(default_request()),
                outcome,
                prompts: AtomicUsize::new(0),
                gate: None,
            }
        }

        fn with_request(mut self, request: Option<AuthRequest>) -> Self {
            self.request = request;
            self
        }

        fn prompts(&self) -> usize {
            self.prompts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AuthSession for MockSession {
        fn auth_request(&self, _config: &SignInConfig) -> Option<AuthRequest> {
            self.request.clone()
        }

        async fn prompt(
            &self,
            _request: &AuthRequest,
            _discovery: &DiscoveryDocument,
        ) -> Result<PromptResult, PromptError> {
            self.prompts.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            match self.outcome.clone() {
                Outcome::Result(result) => Ok(result),
                Outcome::Fail(message) => Err(message.into()),
            }
        }
    }

    fn default_request() -> AuthRequest {
        AuthRequest {
            client_id: "test-client-id".to_string(),
            redirect_uri: "https://example-domain.com/oauth/callback/my-app".to_string(),
            scopes: vec!["openid".to_string()],
            code_verifier: Some("test-code-verifier".to_string()),
            code_challenge: Some("test-code-challenge".to_string()),
            state: Some("test-csrf-state".to_string()),
            extra_params: BTreeMap::new(),
        }
    }

    fn success() -> Outcome {
        Outcome::Result(PromptResult::success(
            "test-authorization-code",
            "test-csrf-state",
        ))
    }

    fn config(token_endpoint: &str) -> SignInConfig {
        SignInConfig::new(
            "test-client-id",
            "https://example-domain.com/oauth/callback/my-app",
        )
        .with_scopes(["account.info:basic"])
        .with_discovery(DiscoveryDocument::new(
            "https://id.example.com/oauth/authorize",
            token_endpoint,
        ))
    }

    async fn token_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_string_contains("code=test-authorization-code"))
            .and(body_string_contains("code_verifier=test-code-verifier"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "mock_access_token",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;
        server
    }

    fn sign_in_with(config: SignInConfig, session: MockSession) -> SignInOAuth<MockSession> {
        SignInOAuth::with_slot(config, session, PendingSlot::shared())
    }

    async fn run(session: MockSession) -> (ExchangeResult, SignInOAuth<MockSession>) {
        let server = token_server().await;
        let sign_in = sign_in_with(
            config(&format!("{}{}", server.uri(), TOKEN_PATH)),
            session,
        );
        let result = sign_in.sign_in().await;
        (result, sign_in)
    }

    #[test]
    fn test_not_loading_initially() {
        let sign_in = sign_in_with(config("https://t"), MockSession::new(success()));
        assert!(!sign_in.is_loading());
    }

    #[tokio::test]
    async fn test_successful_sign_in() {
        let (result, sign_in) = run(MockSession::new(success())).await;
        assert_eq!(result.unwrap().access_token, "mock_access_token");
        assert!(!sign_in.is_loading());
        assert_eq!(sign_in.session().prompts(), 1);
    }

    #[tokio::test]
    async fn test_invalid_redirect_uri_rejected_before_prompt() {
        let mut config = config("https://t");
        config.redirect_uri = "myapp://oauth/callback".to_string();
        let slot = PendingSlot::shared();
        let sign_in = SignInOAuth::with_slot(config, MockSession::new(success()), slot.clone());

        let err = sign_in.sign_in().await.unwrap_err();
        assert_eq!(err.kind(), SignInErrorKind::InvalidRedirectUri);
        assert_eq!(
            err.to_string(),
            "Invalid redirectUri, it must be a valid https universal link and app link"
        );
        assert_eq!(sign_in.session().prompts(), 0);
        assert!(!slot.is_pending());
    }

    #[tokio::test]
    async fn test_request_not_ready() {
        let sign_in = sign_in_with(
            config("https://t"),
            MockSession::new(success()).with_request(None),
        );
        let err = sign_in.sign_in().await.unwrap_err();
        assert_eq!(err.kind(), SignInErrorKind::RequestNotReady);
        assert_eq!(err.to_string(), "Request is still loading, try again later");
    }

    #[tokio::test]
    async fn test_missing_code_verifier() {
        let request = AuthRequest {
            code_verifier: None,
            ..default_request()
        };
        let (result, sign_in) = run(MockSession::new(success()).with_request(Some(request))).await;
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "No codeVerifier");
        assert_eq!(sign_in.session().prompts(), 0);
        assert!(!sign_in.is_loading());
    }

    #[tokio::test]
    async fn test_missing_csrf_state() {
        let request = AuthRequest {
            state: None,
            ..default_request()
        };
        let (result, _) = run(MockSession::new(success()).with_request(Some(request))).await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "No requestCsrfState for CSRF check"
        );
    }

    #[tokio::test]
    async fn test_missing_token_endpoint() {
        let mut config = config("https://t");
        config.discovery = DiscoveryDocument::default();
        let slot = PendingSlot::shared();
        let sign_in = SignInOAuth::with_slot(config, MockSession::new(success()), slot.clone());

        let err = sign_in.sign_in().await.unwrap_err();
        assert_eq!(err.kind(), SignInErrorKind::MissingTokenEndpoint);
        assert_eq!(err.to_string(), "No discovery token endpoint");
        assert!(!slot.is_pending());
    }

    #[tokio::test]
    async fn test_cancel_and_dismiss_are_user_cancelled() {
        for outcome in [PromptResult::Cancel, PromptResult::Dismiss] {
            let (result, _) = run(MockSession::new(Outcome::Result(outcome))).await;
            let err = result.unwrap_err();
            assert!(err.is_cancelled());
            assert_eq!(err.to_string(), "UserCancelled");
        }
    }

    #[tokio::test]
    async fn test_non_success_outcomes_are_no_response() {
        let outcomes = [
            PromptResult::Error {
                params: BTreeMap::new(),
                error: Some("access_denied".to_string()),
            },
            PromptResult::Locked,
            PromptResult::Opened,
        ];
        for outcome in outcomes {
            let (result, _) = run(MockSession::new(Outcome::Result(outcome))).await;
            let err = result.unwrap_err();
            assert_eq!(err.kind(), SignInErrorKind::NoResponse);
            assert_eq!(err.to_string(), "No oAuthResponse");
        }
    }

    #[tokio::test]
    async fn test_prompt_failure_keeps_message_and_cause() {
        let (result, sign_in) = run(MockSession::new(Outcome::Fail("test-error"))).await;
        let err = result.unwrap_err();
        assert_eq!(err.kind(), SignInErrorKind::Prompt);
        assert_eq!(err.to_string(), "test-error");
        assert_eq!(err.source().unwrap().to_string(), "test-error");
        assert!(!sign_in.is_loading());
    }

    #[tokio::test]
    async fn test_tampered_state_from_redirect_fails_csrf_check() {
        let outcome = Outcome::Result(PromptResult::success(
            "test-authorization-code",
            "csrf-state-tampered",
        ));
        let (result, _) = run(MockSession::new(outcome)).await;
        assert_eq!(result.unwrap_err().kind(), SignInErrorKind::CsrfMismatch);
    }

    #[tokio::test]
    async fn test_cancelled_attempt_leaves_pending_state_for_exchange() {
        let server = token_server().await;
        let slot = PendingSlot::shared();
        let sign_in = SignInOAuth::with_slot(
            config(&format!("{}{}", server.uri(), TOKEN_PATH)),
            MockSession::new(Outcome::Result(PromptResult::Cancel)),
            slot.clone(),
        );
        assert!(sign_in.sign_in().await.unwrap_err().is_cancelled());

        let pending = slot.get().unwrap();
        assert_eq!(pending.code_verifier, "test-code-verifier");
        assert_eq!(pending.csrf_state, "test-csrf-state");

        let data = CodeExchanger::new(slot)
            .exchange(Some("test-authorization-code"), Some("test-csrf-state"))
            .await
            .unwrap();
        assert_eq!(data.access_token, "mock_access_token");
    }

    #[tokio::test]
    async fn test_loading_while_prompting() {
        let gate = Arc::new(Notify::new());
        let mut session = MockSession::new(Outcome::Result(PromptResult::Dismiss));
        session.gate = Some(gate.clone());
        let sign_in = Arc::new(sign_in_with(config("https://t"), session));

        let task = tokio::spawn({
            let sign_in = sign_in.clone();
            async move { sign_in.sign_in().await }
        });

        while sign_in.session().prompts() == 0 {
            tokio::task::yield_now().await;
        }
        assert!(sign_in.is_loading());

        gate.notify_one();
        let result = task.await.unwrap();
        assert!(result.unwrap_err().is_cancelled());
        assert!(!sign_in.is_loading());
    }
}
