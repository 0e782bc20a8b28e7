//! Session management: login, token refresh, and authorization state
//!
//! The session owns the client identifier, the credentials supplied at
//! construction, and the authorization state obtained from the service. Other
//! components only ever see it through [`SessionView`], a read-only handle
//! used by the transport to build headers.

use std::fmt;
use std::sync::Arc;

use basket_domain::{Credentials, Result, ServiceConfig, SyncError};
use parking_lot::RwLock;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::endpoints::{LOGIN_PATH, REFRESH_PATH};
use super::transport::AuthenticatedTransport;
use crate::http::HttpClient;

/// Authentication mechanism selected by the construction credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Email/password login yielding a signed user id
    SignedUser,
    /// Refresh-token exchange yielding an access/refresh token pair
    Token,
}

/// Authorization obtained from the service
///
/// Tokens only ever exist as a pair, so a half-authenticated session cannot
/// be represented.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    SignedUser { signed_user_id: String, user_id: String },
    Token { access_token: String, refresh_token: String },
}

impl fmt::Debug for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => f.write_str("Unauthenticated"),
            Self::SignedUser { user_id, .. } => f
                .debug_struct("SignedUser")
                .field("signed_user_id", &"<redacted>")
                .field("user_id", user_id)
                .finish(),
            Self::Token { .. } => f
                .debug_struct("Token")
                .field("access_token", &"<redacted>")
                .field("refresh_token", &"<redacted>")
                .finish(),
        }
    }
}

/// Point-in-time copy of the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub client_id: String,
    pub auth: AuthState,
}

/// Credential carried in request headers
#[derive(Clone, PartialEq, Eq)]
pub enum HeaderCredential {
    AccessToken(String),
    SignedUser(String),
}

impl fmt::Debug for HeaderCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessToken(_) => f.debug_tuple("AccessToken").field(&"<redacted>").finish(),
            Self::SignedUser(_) => f.debug_tuple("SignedUser").field(&"<redacted>").finish(),
        }
    }
}

/// Header material for one outbound request
#[derive(Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    pub client_id: String,
    /// `None` until a login or refresh has succeeded
    pub credential: Option<HeaderCredential>,
}

impl fmt::Debug for AuthHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let credential = match &self.credential {
            None => "none",
            Some(HeaderCredential::AccessToken(_)) => "access-token",
            Some(HeaderCredential::SignedUser(_)) => "signed-user",
        };
        f.debug_struct("AuthHeaders")
            .field("client_id", &self.client_id)
            .field("credential", &credential)
            .finish()
    }
}

/// Read-only handle onto the session state
#[derive(Clone)]
pub struct SessionView {
    state: Arc<RwLock<SessionState>>,
}

impl SessionView {
    /// Current header material.
    pub fn headers(&self) -> AuthHeaders {
        let state = self.state.read();
        let credential = match &state.auth {
            AuthState::Unauthenticated => None,
            AuthState::SignedUser { signed_user_id, .. } => {
                Some(HeaderCredential::SignedUser(signed_user_id.clone()))
            }
            AuthState::Token { access_token, .. } => {
                Some(HeaderCredential::AccessToken(access_token.clone()))
            }
        };
        AuthHeaders { client_id: state.client_id.clone(), credential }
    }

    /// Copy of the full session state.
    pub fn snapshot(&self) -> SessionState {
        self.state.read().clone()
    }
}

#[derive(Debug, Default, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    signed_user_id: String,
    #[serde(default)]
    user_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    access_token: String,
}

/// Owns credentials and authorization state for one client instance
pub struct SessionManager {
    credentials: Credentials,
    state: Arc<RwLock<SessionState>>,
    transport: AuthenticatedTransport,
    refresh_lock: Mutex<()>,
}

impl SessionManager {
    /// Create an unauthenticated session with a fresh client identifier.
    pub fn new(
        http: HttpClient,
        service: &ServiceConfig,
        credentials: Credentials,
        cancel: CancellationToken,
    ) -> Self {
        let state = Arc::new(RwLock::new(SessionState {
            client_id: Uuid::new_v4().to_string(),
            auth: AuthState::Unauthenticated,
        }));
        let view = SessionView { state: Arc::clone(&state) };
        let transport = AuthenticatedTransport::new(http, service, view, cancel);

        Self { credentials, state, transport, refresh_lock: Mutex::new(()) }
    }

    /// Authentication mechanism in use.
    pub const fn mode(&self) -> AuthMode {
        match self.credentials {
            Credentials::Password { .. } => AuthMode::SignedUser,
            Credentials::RefreshToken(_) => AuthMode::Token,
        }
    }

    /// Transport that signs requests with this session's headers.
    pub const fn transport(&self) -> &AuthenticatedTransport {
        &self.transport
    }

    /// Perform the initial login for the configured mode.
    ///
    /// # Errors
    /// Returns `SyncError::Auth` if the service rejects the credentials or
    /// its response cannot be decoded.
    pub async fn authenticate(&self) -> Result<()> {
        match &self.credentials {
            Credentials::Password { email, password } => {
                self.login_with_password(email, password).await
            }
            Credentials::RefreshToken(token) => self.login_with_refresh_token(token).await,
        }
    }

    /// Log in with an email and password.
    ///
    /// On success the signed user id and user id are taken from the response.
    ///
    /// # Errors
    /// Returns `SyncError::Auth` on a non-2xx status, an undecodable body,
    /// missing fields, or when the session is in token mode.
    #[instrument(skip(self, email, password), fields(client_id = %self.client_id()))]
    pub async fn login_with_password(&self, email: &str, password: &str) -> Result<()> {
        if self.mode() != AuthMode::SignedUser {
            return Err(SyncError::Auth(
                "password login is unavailable for a refresh-token session".to_string(),
            ));
        }

        let response =
            self.transport.post_form(LOGIN_PATH, &[("email", email), ("password", password)]).await?;
        let status = response.status();
        if !status.is_success() {
            warn!(%status, "password login rejected");
            return Err(SyncError::Auth(format!("login rejected with status {status}")));
        }

        let body = self.transport.read_body(response).await?;
        let parsed: LoginResponse = serde_json::from_slice(&body)
            .map_err(|e| SyncError::Auth(format!("failed to decode login response: {e}")))?;

        if parsed.signed_user_id.is_empty() || parsed.user_id.is_empty() {
            return Err(SyncError::Auth(
                "login response is missing signed_user_id or user_id".to_string(),
            ));
        }

        self.state.write().auth = AuthState::SignedUser {
            signed_user_id: parsed.signed_user_id,
            user_id: parsed.user_id,
        };
        info!("logged in with password");
        Ok(())
    }

    /// Exchange a refresh token for a new access/refresh token pair.
    ///
    /// # Errors
    /// Returns `SyncError::Auth` on rejection, an undecodable body, or when
    /// the session is in signed-user mode.
    #[instrument(skip(self, token), fields(client_id = %self.client_id()))]
    pub async fn login_with_refresh_token(&self, token: &str) -> Result<()> {
        self.ensure_token_mode()?;
        let _guard = self.refresh_lock.lock().await;
        self.exchange_refresh_token(token).await
    }

    /// Rotate the session tokens using the currently held refresh token.
    ///
    /// Calls are serialized: a second caller waits for the first rotation and
    /// then uses the token it produced. The previous refresh token is invalid
    /// once this returns `Ok`.
    ///
    /// # Errors
    /// Returns `SyncError::Auth` on rejection or in signed-user mode.
    #[instrument(skip(self), fields(client_id = %self.client_id()))]
    pub async fn refresh(&self) -> Result<()> {
        self.ensure_token_mode()?;
        let _guard = self.refresh_lock.lock().await;

        let token = match (&self.state.read().auth, &self.credentials) {
            (AuthState::Token { refresh_token, .. }, _) => refresh_token.clone(),
            (_, Credentials::RefreshToken(initial)) => initial.clone(),
            (_, Credentials::Password { .. }) => {
                return Err(SyncError::Auth("no refresh token held".to_string()))
            }
        };

        self.exchange_refresh_token(&token).await
    }

    /// Header material for the current authorization state.
    pub fn current_headers(&self) -> AuthHeaders {
        SessionView { state: Arc::clone(&self.state) }.headers()
    }

    /// Copy of the session state.
    pub fn snapshot(&self) -> SessionState {
        self.state.read().clone()
    }

    /// Per-instance client identifier.
    pub fn client_id(&self) -> String {
        self.state.read().client_id.clone()
    }

    /// Latest refresh token, which callers must persist to resume later.
    pub fn refresh_token(&self) -> Option<String> {
        match &self.state.read().auth {
            AuthState::Token { refresh_token, .. } => Some(refresh_token.clone()),
            _ => None,
        }
    }

    /// Acting user id embedded in operations; empty in token mode.
    pub fn user_id(&self) -> String {
        match &self.state.read().auth {
            AuthState::SignedUser { user_id, .. } => user_id.clone(),
            _ => String::new(),
        }
    }

    /// Whether a login or refresh has succeeded.
    pub fn is_authenticated(&self) -> bool {
        !matches!(self.state.read().auth, AuthState::Unauthenticated)
    }

    fn ensure_token_mode(&self) -> Result<()> {
        if self.mode() == AuthMode::Token {
            Ok(())
        } else {
            Err(SyncError::Auth(
                "token refresh is unavailable for a password session".to_string(),
            ))
        }
    }

    /// Caller must hold `refresh_lock`.
    async fn exchange_refresh_token(&self, token: &str) -> Result<()> {
        let response = self.transport.post_form(REFRESH_PATH, &[("refresh_token", token)]).await?;
        let status = response.status();
        if !status.is_success() {
            warn!(%status, "refresh token rejected");
            return Err(SyncError::Auth(format!("token refresh rejected with status {status}")));
        }

        let body = self.transport.read_body(response).await?;
        let parsed: RefreshResponse = serde_json::from_slice(&body)
            .map_err(|e| SyncError::Auth(format!("failed to decode refresh response: {e}")))?;

        if parsed.refresh_token.is_empty() || parsed.access_token.is_empty() {
            return Err(SyncError::Auth(
                "refresh response is missing refresh_token or access_token".to_string(),
            ));
        }

        self.state.write().auth = AuthState::Token {
            access_token: parsed.access_token,
            refresh_token: parsed.refresh_token,
        };
        debug!("refresh token rotated");
        info!("session tokens refreshed");
        Ok(())
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("mode", &self.mode())
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}
