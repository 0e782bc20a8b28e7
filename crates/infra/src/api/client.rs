//! Remote list client
//!
//! [`Client`] ties the session, the fetcher and the operation encoder
//! together. Mutations are sent once and never retried; a failure leaves the
//! caller's view of the list untouched.

use std::sync::Arc;

use async_trait::async_trait;
use basket_domain::{Credentials, ListSnapshot, Result, ServiceConfig, SyncError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::auth::{AuthMode, SessionManager};
use super::endpoints::LIST_UPDATE_PATH;
use super::fetcher::ListFetcher;
use super::operations::{form_body, Operation};
use crate::http::HttpClient;
use crate::sync::ListStore;

const USER_AGENT: &str = concat!("basket/", env!("CARGO_PKG_VERSION"));

/// Authenticated client for one remote account
pub struct Client {
    session: Arc<SessionManager>,
    fetcher: ListFetcher,
}

impl Client {
    /// Start building a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Log in with email and password.
    ///
    /// # Errors
    /// Fails with `Auth` when the service rejects the credentials.
    pub async fn new(service: &ServiceConfig, email: &str, password: &str) -> Result<Self> {
        Self::builder()
            .service(service.clone())
            .credentials(Credentials::password(email, password))
            .connect()
            .await
    }

    /// Resume a session from a previously persisted refresh token.
    ///
    /// The supplied token is consumed by the initial exchange; read the
    /// replacement from [`Client::refresh_token`].
    ///
    /// # Errors
    /// Fails with `Auth` when the token is rejected.
    pub async fn from_refresh_token(service: &ServiceConfig, token: &str) -> Result<Self> {
        Self::builder()
            .service(service.clone())
            .credentials(Credentials::refresh_token(token))
            .connect()
            .await
    }

    /// Per-instance client identifier sent with every request.
    pub fn client_id(&self) -> String {
        self.session.client_id()
    }

    pub fn mode(&self) -> AuthMode {
        self.session.mode()
    }

    /// Latest refresh token in token mode.
    pub fn refresh_token(&self) -> Option<String> {
        self.session.refresh_token()
    }

    /// Rotate the token pair (token mode only).
    ///
    /// # Errors
    /// Fails with `Auth` in password mode or when the exchange is rejected.
    pub async fn refresh(&self) -> Result<()> {
        self.session.refresh().await
    }

    /// Snapshot of the list named exactly `name`.
    ///
    /// # Errors
    /// `NotFound` when no such list exists, plus any fetch error.
    pub async fn fetch_list(&self, name: &str) -> Result<ListSnapshot> {
        self.fetcher.fetch_list(name).await
    }

    /// Snapshots of every list on the account.
    pub async fn fetch_lists(&self) -> Result<Vec<ListSnapshot>> {
        self.fetcher.fetch_lists().await
    }

    /// Append a new unchecked item to a list.
    pub async fn add_item(&self, list_id: &str, name: &str) -> Result<()> {
        self.apply(Operation::add_item(list_id, name, &self.session.user_id())).await
    }

    pub async fn remove_item(&self, list_id: &str, item_id: &str) -> Result<()> {
        self.apply(Operation::remove_item(list_id, item_id, &self.session.user_id())).await
    }

    pub async fn set_checked(&self, list_id: &str, item_id: &str, checked: bool) -> Result<()> {
        self.apply(Operation::set_checked(list_id, item_id, checked, &self.session.user_id()))
            .await
    }

    /// Cancel every in-flight and future request made by this client.
    pub fn shutdown(&self) {
        self.session.transport().cancellation().cancel();
    }

    #[instrument(
        skip(self, operation),
        fields(
            handler = %operation.handler(),
            list_id = operation.list_id(),
            item_id = operation.item_id(),
        )
    )]
    async fn apply(&self, operation: Operation) -> Result<()> {
        let transport = self.session.transport();
        let body = form_body(std::slice::from_ref(&operation));
        let response = transport.post_encoded(LIST_UPDATE_PATH, body).await?;
        let status = response.status();

        if !status.is_success() {
            let message = rejection_message(transport.read_body(response).await)?;
            warn!(%status, "mutation rejected");
            return Err(SyncError::Mutation { status: status.as_u16(), message });
        }

        info!(operation_id = operation.operation_id(), "mutation accepted");
        Ok(())
    }
}

/// Text of a rejected mutation's body.
///
/// Cancellation while reading wins over the rejection; any other read
/// failure leaves the message empty.
fn rejection_message(body: Result<Vec<u8>>) -> Result<String> {
    match body {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(SyncError::Cancelled) => Err(SyncError::Cancelled),
        Err(e) => {
            debug!(error = %e, "could not read rejection body");
            Ok(String::new())
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").field("session", &self.session).finish_non_exhaustive()
    }
}

#[async_trait]
impl ListStore for Client {
    async fn fetch_list(&self, target_name: &str) -> Result<ListSnapshot> {
        Self::fetch_list(self, target_name).await
    }

    async fn add_item(&self, list_id: &str, name: &str) -> Result<()> {
        Self::add_item(self, list_id, name).await
    }

    async fn remove_item(&self, list_id: &str, item_id: &str) -> Result<()> {
        Self::remove_item(self, list_id, item_id).await
    }

    async fn set_checked(&self, list_id: &str, item_id: &str, checked: bool) -> Result<()> {
        Self::set_checked(self, list_id, item_id, checked).await
    }
}

/// Builder for [`Client`]
#[derive(Debug, Default)]
pub struct ClientBuilder {
    service: ServiceConfig,
    credentials: Option<Credentials>,
    cancel: Option<CancellationToken>,
    http: Option<HttpClient>,
}

impl ClientBuilder {
    pub fn service(mut self, service: ServiceConfig) -> Self {
        self.service = service;
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Token whose cancellation aborts every request the client makes.
    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Use a preconfigured HTTP client instead of one built from the
    /// service timeout.
    pub fn http_client(mut self, http: HttpClient) -> Self {
        self.http = Some(http);
        self
    }

    /// Build the client and perform the initial login.
    ///
    /// # Errors
    /// `Config` when no credentials were supplied, otherwise whatever the
    /// login returns.
    pub async fn connect(self) -> Result<Client> {
        let credentials = self
            .credentials
            .ok_or_else(|| SyncError::Config("client credentials are required".to_string()))?;

        let http = match self.http {
            Some(http) => http,
            None => HttpClient::builder()
                .timeout(self.service.timeout())
                .user_agent(USER_AGENT)
                .build()?,
        };

        let session = Arc::new(SessionManager::new(
            http,
            &self.service,
            credentials,
            self.cancel.unwrap_or_default(),
        ));
        session.authenticate().await?;

        info!(client_id = %session.client_id(), mode = ?session.mode(), "client connected");
        let fetcher = ListFetcher::new(session.transport().clone());
        Ok(Client { session, fetcher })
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::super::endpoints::LOGIN_PATH;
    use super::*;

    async fn mount_login(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "signed_user_id": "su-1",
                "user_id": "u1"
            })))
            .mount(server)
            .await;
    }

    fn service(server: &MockServer) -> ServiceConfig {
        ServiceConfig { base_url: server.uri(), ..ServiceConfig::default() }
    }

    #[tokio::test]
    async fn builder_requires_credentials() {
        let err = Client::builder().connect().await.unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
    }

    #[tokio::test]
    async fn mutation_failure_reports_status_and_body() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("POST"))
            .and(path(LIST_UPDATE_PATH))
            .respond_with(ResponseTemplate::new(409).set_body_string("stale list"))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new(&service(&server), "me@example.com", "pw").await.unwrap();
        let err = client.set_checked("L1", "i1", true).await.unwrap_err();

        match err {
            SyncError::Mutation { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "stale list");
            }
            other => panic!("expected mutation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn default_http_client_identifies_itself() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "signed_user_id": "su-1",
                "user_id": "u1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        Client::new(&service(&server), "me@example.com", "pw").await.expect("login");
    }

    #[tokio::test]
    async fn injected_http_client_deadline_applies() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_millis(500)))
            .mount(&server)
            .await;

        let http = HttpClient::builder()
            .timeout(std::time::Duration::from_millis(50))
            .build()
            .expect("http client");
        let err = Client::builder()
            .service(service(&server))
            .credentials(Credentials::password("me@example.com", "pw"))
            .http_client(http)
            .connect()
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Timeout(_)), "got {err:?}");
    }

    #[test]
    fn cancelled_body_read_is_not_a_rejection() {
        assert!(matches!(rejection_message(Err(SyncError::Cancelled)), Err(SyncError::Cancelled)));
        assert_eq!(rejection_message(Ok(b"stale list".to_vec())).unwrap(), "stale list");
        assert_eq!(
            rejection_message(Err(SyncError::Transport("connection reset".into()))).unwrap(),
            ""
        );
    }

    #[tokio::test]
    async fn any_success_status_accepts_mutation() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("POST"))
            .and(path(LIST_UPDATE_PATH))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = Client::new(&service(&server), "me@example.com", "pw").await.unwrap();
        client.remove_item("L1", "i1").await.expect("accepted");
    }

    #[tokio::test]
    async fn refresh_is_rejected_in_password_mode() {
        let server = MockServer::start().await;
        mount_login(&server).await;

        let client = Client::new(&service(&server), "me@example.com", "pw").await.unwrap();
        assert_eq!(client.mode(), AuthMode::SignedUser);
        assert!(matches!(client.refresh().await, Err(SyncError::Auth(_))));
        assert!(client.refresh_token().is_none());
    }

    #[tokio::test]
    async fn shutdown_cancels_later_requests() {
        let server = MockServer::start().await;
        mount_login(&server).await;

        let client = Client::new(&service(&server), "me@example.com", "pw").await.unwrap();
        client.shutdown();

        assert!(matches!(client.fetch_list("Groceries").await, Err(SyncError::Cancelled)));
    }
}
