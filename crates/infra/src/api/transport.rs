use basket_domain::{Result, ServiceConfig};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, Response};
use tokio_util::sync::CancellationToken;

use super::auth::{HeaderCredential, SessionView};
use super::endpoints::{
    requires_session_credential, API_VERSION_HEADER, CLIENT_ID_HEADER, SIGNED_USER_HEADER,
};
use crate::http::HttpClient;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// HTTP transport that signs every request with the current session headers.
///
/// Header values are read from the session at send time, so a request built
/// after a token rotation always carries the new access token.
#[derive(Clone)]
pub struct AuthenticatedTransport {
    http: HttpClient,
    base_url: String,
    api_version: String,
    session: SessionView,
    cancel: CancellationToken,
}

impl AuthenticatedTransport {
    pub(crate) fn new(
        http: HttpClient,
        service: &ServiceConfig,
        session: SessionView,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            http,
            base_url: service.base_url.trim_end_matches('/').to_string(),
            api_version: service.api_version.clone(),
            session,
            cancel,
        }
    }

    /// Token that aborts every request sent through this transport.
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// POST a form built from key/value pairs.
    pub async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> Result<Response> {
        let builder = self.request(path).form(fields);
        self.http.send(builder, &self.cancel).await
    }

    /// POST an already-encoded form body.
    pub async fn post_encoded(&self, path: &str, body: String) -> Result<Response> {
        let builder = self.request(path).header(CONTENT_TYPE, FORM_CONTENT_TYPE).body(body);
        self.http.send(builder, &self.cancel).await
    }

    /// POST with no body but a form content type.
    pub async fn post_empty(&self, path: &str) -> Result<Response> {
        let builder = self.request(path).header(CONTENT_TYPE, FORM_CONTENT_TYPE);
        self.http.send(builder, &self.cancel).await
    }

    /// Read a response body under the transport's cancellation token.
    pub async fn read_body(&self, response: Response) -> Result<Vec<u8>> {
        self.http.read_body(response, &self.cancel).await
    }

    fn request(&self, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.sign(self.http.request(Method::POST, url), path)
    }

    fn sign(&self, builder: RequestBuilder, path: &str) -> RequestBuilder {
        let headers = self.session.headers();
        let builder = builder
            .header(API_VERSION_HEADER, &self.api_version)
            .header(CLIENT_ID_HEADER, &headers.client_id);

        if !requires_session_credential(path) {
            return builder;
        }

        match headers.credential {
            Some(HeaderCredential::AccessToken(token)) => builder.bearer_auth(token),
            Some(HeaderCredential::SignedUser(id)) => builder.header(SIGNED_USER_HEADER, id),
            None => builder,
        }
    }
}
