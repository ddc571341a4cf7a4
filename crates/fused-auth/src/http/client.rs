/*
[INPUT]:  HTTP configuration (base URL, timeouts), form fields, bearer tokens
[OUTPUT]: Configured reqwest client and decoded JSON responses
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Url, header};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::http::{FusedError, Result};

/// Base URL of the hosted service
pub const DEFAULT_BASE_URL: &str = "https://fused-api.herokuapp.com";

/// The login call is held open server-side for up to six minutes.
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(6 * 60 + 30);

const BODY_EXCERPT_LEN: usize = 200;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Applies to the long-polling login request only
    pub login_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            login_timeout: DEFAULT_LOGIN_TIMEOUT,
        }
    }
}

/// Main HTTP client for the auth service
#[derive(Debug, Clone)]
pub struct FusedClient {
    http_client: Client,
    base_url: Url,
    config: ClientConfig,
}

impl FusedClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let base_url = config.base_url.clone();
        Self::with_config_and_base_url(config, &base_url)
    }

    /// Create a client against an explicit base URL (mock servers, staging)
    pub fn with_config_and_base_url(mut config: ClientConfig, base_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(FusedError::Config(format!(
                "base URL cannot carry endpoint paths: {base_url}"
            )));
        }
        config.base_url = base_url.to_string();

        Ok(Self {
            http_client,
            base_url,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build full URL for an endpoint
    fn url(&self, endpoint: &str) -> Result<Url> {
        Ok(self.base_url.join(endpoint)?)
    }

    /// Build a form-encoded POST, optionally authenticated
    pub(crate) fn post_form(
        &self,
        endpoint: &str,
        form: &[(&str, &str)],
        bearer: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<RequestBuilder> {
        let url = self.url(endpoint)?;
        let mut builder = self.http_client.post(url).form(form);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(builder)
    }

    /// Send a request and decode its JSON body
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let request = builder.build()?;
        let method = request.method().clone();
        let path = request.url().path().to_string();
        let deadline = request.timeout().copied().unwrap_or(self.config.timeout);

        debug!(%method, %path, "sending request");
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|err| map_transport_error(err, deadline))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| map_transport_error(err, deadline))?;
        debug!(%path, status = status.as_u16(), bytes = body.len(), "received response");

        if !status.is_success() {
            return Err(FusedError::api_error(status, excerpt(&body)));
        }

        serde_json::from_slice(&body).map_err(|err| {
            FusedError::Protocol(format!(
                "unexpected response from {path}: {err} (body: {})",
                excerpt(&body)
            ))
        })
    }
}

fn map_transport_error(err: reqwest::Error, deadline: Duration) -> FusedError {
    if err.is_timeout() {
        FusedError::Timeout {
            seconds: deadline.as_secs(),
        }
    } else {
        FusedError::Http(err)
    }
}

fn excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.chars().count() <= BODY_EXCERPT_LEN {
        text.to_string()
    } else {
        let cut: String = text.chars().take(BODY_EXCERPT_LEN).collect();
        format!("{cut}...")
    }
}
