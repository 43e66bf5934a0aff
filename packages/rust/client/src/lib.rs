//! HTTP client for the brokersite content and mail API.
//!
//! Two endpoints matter:
//! - `GET {host}/feeds` returns the [`ContentFeed`](brokersite_shared::ContentFeed)
//!   wrapped in a `{status, message, data}` envelope
//! - `POST {host}/send-mail` accepts a contact form and answers `{status, message}`
//!
//! Every failure is mapped onto [`BrokerSiteError`] so callers can surface a
//! readable message without caring which layer failed.

mod contact;
mod feeds;

use std::time::Duration;

use brokersite_shared::{ApiSettings, BrokerSiteError, Result};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 3;

/// Maximum response size we accept (5 MB).
const MAX_RESPONSE_SIZE: u64 = 5 * 1024 * 1024;

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("brokersite/", env!("CARGO_PKG_VERSION"));

/// Thin JSON client over the site API. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    settings: ApiSettings,
}

impl ApiClient {
    /// Build a client for the resolved API settings.
    pub fn new(settings: ApiSettings) -> Result<Self> {
        let http = build_client(settings.timeout)?;
        Ok(Self { http, settings })
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    /// `GET` an endpoint and decode its JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.settings.endpoint(path);
        debug!(%url, "GET");

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| BrokerSiteError::Network(format!("{url}: {e}")))?;

        decode_json(&url, response).await
    }

    /// `POST` a JSON body with extra headers and decode the JSON reply.
    pub(crate) async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        headers: &[(&str, &str)],
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.settings.endpoint(path);
        debug!(%url, extra_headers = headers.len(), "POST");

        let mut request = self
            .http
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BrokerSiteError::Network(format!("{url}: {e}")))?;

        decode_json(&url, response).await
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a reqwest client with appropriate settings.
fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(timeout)
        .build()
        .map_err(|e| BrokerSiteError::Network(format!("failed to build HTTP client: {e}")))
}

/// Check status and size, then decode the body as JSON.
async fn decode_json<T: DeserializeOwned>(url: &str, response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(BrokerSiteError::Http {
            status: status.as_u16(),
        });
    }

    if let Some(len) = response.content_length() {
        if len > MAX_RESPONSE_SIZE {
            return Err(BrokerSiteError::validation(format!(
                "{url}: response too large ({len} bytes, max {MAX_RESPONSE_SIZE})"
            )));
        }
    }

    let body = read_body_limited(url, response, MAX_RESPONSE_SIZE).await?;

    serde_json::from_slice(&body)
        .map_err(|e| BrokerSiteError::parse(format!("{url}: invalid JSON response: {e}")))
}

/// Read the body chunk by chunk, failing once it grows past `limit` bytes.
/// Covers chunked responses that carry no `Content-Length`.
async fn read_body_limited(
    url: &str,
    mut response: reqwest::Response,
    limit: u64,
) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| BrokerSiteError::Network(format!("{url}: failed to read body: {e}")))?
    {
        if (body.len() + chunk.len()) as u64 > limit {
            return Err(BrokerSiteError::validation(format!(
                "{url}: response too large (over {limit} bytes)"
            )));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

#[cfg(test)]
pub(crate) mod test_support {
    use brokersite_shared::{ApiSettings, AppConfig};

    use super::ApiClient;

    /// Client pointed at a mock server.
    pub(crate) fn client_for(uri: &str) -> ApiClient {
        let config = AppConfig::default();
        let settings = ApiSettings::resolve(&config, Some(uri)).expect("resolve settings");
        ApiClient::new(settings).expect("build client")
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::client_for;
    use super::*;

    #[derive(Debug, serde::Deserialize)]
    struct Ping {
        ok: bool,
    }

    #[tokio::test]
    async fn http_error_carries_status() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/ping"))
            .respond_with(wiremock::ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let err = client.get_json::<Ping>("/ping").await.unwrap_err();
        assert!(matches!(err, BrokerSiteError::Http { status: 502 }));
        assert_eq!(err.to_string(), "HTTP error! status: 502");
    }

    #[tokio::test]
    async fn invalid_json_is_parse_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/ping"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let err = client.get_json::<Ping>("/ping").await.unwrap_err();
        assert!(matches!(err, BrokerSiteError::Parse { .. }));
    }

    #[tokio::test]
    async fn decodes_json_body() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/ping"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "ok": true })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let ping = client.get_json::<Ping>("/ping").await.expect("ping");
        assert!(ping.ok);
    }

    #[tokio::test]
    async fn body_read_stops_at_size_limit() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/big"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("x".repeat(64)))
            .mount(&server)
            .await;

        let url = format!("{}/big", server.uri());
        let http = reqwest::Client::new();

        let response = http.get(&url).send().await.expect("send");
        let err = read_body_limited(&url, response, 16).await.unwrap_err();
        assert!(matches!(err, BrokerSiteError::Validation { .. }));
        assert!(err.to_string().contains("too large"));

        let response = http.get(&url).send().await.expect("send");
        let body = read_body_limited(&url, response, 64).await.expect("within limit");
        assert_eq!(body.len(), 64);
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        // Port 9 (discard) on localhost is almost never listening.
        let client = client_for("http://127.0.0.1:9");
        let err = client.get_json::<Ping>("/ping").await.unwrap_err();
        assert!(matches!(err, BrokerSiteError::Network(_)));
    }
}
