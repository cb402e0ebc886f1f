//! OAuth 2.0 authorization code + PKCE sign-in.
//!
//! A sign-in attempt asks an [`AuthSession`] for an authorization request,
//! remembers the request's verifier and CSRF state in a single pending slot,
//! lets the session run the interactive login, and then trades the returned
//! code for an access token.
//!
//! # Components
//!
//! - [`config`] — sign-in configuration and discovery document
//! - [`pkce`] — PKCE pair, CSRF state, authorization URL
//! - [`session`] — the interactive seam (`AuthSession`, `Presenter`, prompt outcomes)
//! - [`pending`] — the single-slot record of the attempt in flight
//! - [`exchange`] — CSRF check and token endpoint exchange
//! - [`sign_in`] — the request initiator tying it together

pub mod config;
pub mod error;
pub mod exchange;
pub mod pending;
pub mod pkce;
pub mod session;
pub mod sign_in;

pub use config::{DiscoveryDocument, SignInConfig};
pub use error::{PromptError, Result, SignInError, SignInErrorKind};
pub use exchange::{CodeExchanger, ExchangeResult, SignInData, sign_in_with_authorization_code};
pub use pending::{PendingExchangeState, PendingSlot, SharedPendingSlot};
pub use pkce::{AuthRequest, PkceChallenge};
pub use session::{AuthSession, PkceAuthSession, Presenter, PromptResult};
pub use sign_in::SignInOAuth;
