//! Error types for the sign-in flow.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, SignInError>;

/// Error raised by an interactive prompt implementation.
pub type PromptError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The distinct ways a sign-in attempt can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInErrorKind {
    /// Redirect URI is not an `https://` universal/app link.
    InvalidRedirectUri,
    /// The auth session has not produced a request yet.
    RequestNotReady,
    /// The authorization request carries no PKCE code verifier.
    MissingCodeVerifier,
    /// The authorization request carries no CSRF state.
    MissingCsrfState,
    /// The discovery document has no token endpoint.
    MissingTokenEndpoint,
    /// A code exchange was attempted before any request was issued.
    NoPriorRequest,
    /// The redirect carried no authorization code.
    MissingAuthorizationCode,
    /// The returned state is absent or differs from the issued one.
    CsrfMismatch,
    /// The user cancelled or dismissed the prompt.
    UserCancelled,
    /// The prompt finished without a success result.
    NoResponse,
    /// The token endpoint answered with a non-2xx status.
    TokenRequestFailed,
    /// The token request never got a response.
    Network,
    /// The token endpoint answered 2xx with an unusable body.
    InvalidTokenResponse,
    /// The interactive prompt itself failed.
    Prompt,
}

impl SignInErrorKind {
    /// User-facing message for this kind.
    pub fn message(self) -> &'static str {
        match self {
            Self::InvalidRedirectUri => {
                "Invalid redirectUri, it must be a valid https universal link and app link"
            }
            Self::RequestNotReady => "Request is still loading, try again later",
            Self::MissingCodeVerifier => "No codeVerifier",
            Self::MissingCsrfState => "No requestCsrfState for CSRF check",
            Self::MissingTokenEndpoint => "No discovery token endpoint",
            Self::NoPriorRequest => "No prior sign-in request",
            Self::MissingAuthorizationCode => "No authorization code",
            Self::CsrfMismatch => "Failed CSRF check",
            Self::UserCancelled => "UserCancelled",
            Self::NoResponse => "No oAuthResponse",
            Self::TokenRequestFailed => "Failed to get access token",
            Self::Network => "Token request failed",
            Self::InvalidTokenResponse => "Invalid token response",
            Self::Prompt => "Unknown error",
        }
    }
}

/// A failed sign-in attempt.
///
/// `Display` is the user-facing message. The underlying cause, when there is
/// one (a prompt failure, a transport error), is kept as the error source.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct SignInError {
    kind: SignInErrorKind,
    message: String,
    status: Option<u16>,
    #[source]
    source: Option<PromptError>,
}

impl SignInError {
    /// Create an error of the given kind with its standard message.
    pub fn new(kind: SignInErrorKind) -> Self {
        Self {
            kind,
            message: kind.message().to_string(),
            status: None,
            source: None,
        }
    }

    /// Non-2xx answer from the token endpoint.
    pub fn token_request_failed(status: u16) -> Self {
        Self {
            status: Some(status),
            ..Self::new(SignInErrorKind::TokenRequestFailed)
        }
    }

    /// 2xx answer whose body could not be used.
    pub fn invalid_token_response(
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::new(SignInErrorKind::InvalidTokenResponse)
        }
    }

    /// Failure raised by the interactive prompt; its message becomes ours.
    pub fn prompt(source: PromptError) -> Self {
        Self {
            kind: SignInErrorKind::Prompt,
            message: source.to_string(),
            status: None,
            source: Some(source),
        }
    }

    pub fn kind(&self) -> SignInErrorKind {
        self.kind
    }

    /// HTTP status returned by the token endpoint, if any.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Whether the user backed out of the prompt.
    pub fn is_cancelled(&self) -> bool {
        self.kind == SignInErrorKind::UserCancelled
    }
}

impl From<SignInErrorKind> for SignInError {
    fn from(kind: SignInErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<reqwest::Error> for SignInError {
    fn from(e: reqwest::Error) -> Self {
        Self {
            kind: SignInErrorKind::Network,
            message: e.to_string(),
            status: e.status().map(|s| s.as_u16()),
            source: Some(Box::new(e)),
        }
    }
}
