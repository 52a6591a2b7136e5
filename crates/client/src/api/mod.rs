//! Portal backend HTTP client.
//!
//! One cookie-carrying [`reqwest::Client`] talks to every endpoint. Each
//! request is tagged with an `x-request-id` header so backend logs can be
//! correlated with ours.

mod resources;
pub mod types;

use std::future::Future;
use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use school_portal_core::Session;
use school_portal_core::validation::ValidSignup;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::config::PortalConfig;
use crate::error::{PortalError, Result};
use types::{AuthOutcome, LoginRequest, SignupRequest};

/// Correlation header attached to every request.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// The session endpoints the auth layer depends on.
///
/// Implemented by [`BackendClient`]; tests substitute scripted fakes.
pub trait SessionBackend: Send + Sync {
    /// Ask the backend who is signed in. `None` means nobody.
    fn check_session(&self) -> impl Future<Output = Result<Option<Session>>> + Send;

    /// Submit login credentials.
    fn login(
        &self,
        identifier: &str,
        password: &SecretString,
        recaptcha_token: &str,
    ) -> impl Future<Output = Result<AuthOutcome>> + Send;

    /// Submit a validated signup form.
    fn signup(
        &self,
        form: &ValidSignup,
        password: &SecretString,
        recaptcha_token: &str,
    ) -> impl Future<Output = Result<AuthOutcome>> + Send;

    /// Tell the backend the session is over.
    fn logout(&self) -> impl Future<Output = Result<()>> + Send;
}

impl<T: SessionBackend> SessionBackend for Arc<T> {
    fn check_session(&self) -> impl Future<Output = Result<Option<Session>>> + Send {
        (**self).check_session()
    }

    fn login(
        &self,
        identifier: &str,
        password: &SecretString,
        recaptcha_token: &str,
    ) -> impl Future<Output = Result<AuthOutcome>> + Send {
        (**self).login(identifier, password, recaptcha_token)
    }

    fn signup(
        &self,
        form: &ValidSignup,
        password: &SecretString,
        recaptcha_token: &str,
    ) -> impl Future<Output = Result<AuthOutcome>> + Send {
        (**self).signup(form, password, recaptcha_token)
    }

    fn logout(&self) -> impl Future<Output = Result<()>> + Send {
        (**self).logout()
    }
}

/// Typed client for the portal backend.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    /// Base URL, always ending in `/`
    base_url: Url,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl BackendClient {
    /// Create a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::Network` if the HTTP client cannot be built.
    pub fn new(config: &PortalConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().cookie_store(true);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.api_url.clone(),
            }),
        })
    }

    /// The backend base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Build an endpoint URL from path segments, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.inner.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.inner
            .client
            .request(method, url)
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string())
    }

    /// Send a request and return the raw body of an acceptable response.
    ///
    /// 2xx responses are accepted. A 4xx whose body is an explicit
    /// `success: false` rejection is accepted too, so its message reaches
    /// the caller. Everything else is a network error.
    async fn send(&self, endpoint: &'static str, request: RequestBuilder) -> Result<Vec<u8>> {
        let response = request.send().await.map_err(|e| {
            warn!(endpoint, error = %e, "Request failed");
            PortalError::from(e)
        })?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();
        debug!(endpoint, status = status.as_u16(), bytes = body.len(), "Response received");

        if status.is_success() || (status.is_client_error() && is_rejection(&body)) {
            Ok(body)
        } else {
            Err(status_error(endpoint, status))
        }
    }
}

fn is_rejection(body: &[u8]) -> bool {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("success").and_then(Value::as_bool))
        == Some(false)
}

fn status_error(endpoint: &str, status: StatusCode) -> PortalError {
    PortalError::Network(format!("{endpoint} returned {status}"))
}

impl SessionBackend for BackendClient {
    #[instrument(skip(self))]
    async fn check_session(&self) -> Result<Option<Session>> {
        let url = self.endpoint(&["check_session"]);
        let body = self.send("check_session", self.request(Method::GET, url)).await?;
        let session = types::parse_check_session(&body)?;
        debug!(signed_in = session.is_some(), "Session checked");
        Ok(session)
    }

    #[instrument(skip_all)]
    async fn login(
        &self,
        identifier: &str,
        password: &SecretString,
        recaptcha_token: &str,
    ) -> Result<AuthOutcome> {
        let payload = LoginRequest {
            login: identifier,
            password: password.expose_secret(),
            recaptcha_token,
        };
        let url = self.endpoint(&["login"]);
        let body = self
            .send("login", self.request(Method::POST, url).json(&payload))
            .await?;
        Ok(types::parse_auth_outcome("login", &body)?)
    }

    #[instrument(skip_all)]
    async fn signup(
        &self,
        form: &ValidSignup,
        password: &SecretString,
        recaptcha_token: &str,
    ) -> Result<AuthOutcome> {
        let payload = SignupRequest {
            first_name: &form.first_name,
            last_name: &form.last_name,
            lrn: form.lrn.as_str(),
            email: form.email.as_str(),
            password: password.expose_secret(),
            recaptcha_token,
        };
        let url = self.endpoint(&["signup"]);
        let body = self
            .send("signup", self.request(Method::POST, url).json(&payload))
            .await?;
        Ok(types::parse_auth_outcome("signup", &body)?)
    }

    #[instrument(skip(self))]
    async fn logout(&self) -> Result<()> {
        let url = self.endpoint(&["logout"]);
        self.send("logout", self.request(Method::POST, url)).await?;
        Ok(())
    }
}
