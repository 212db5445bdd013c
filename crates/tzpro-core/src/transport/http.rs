use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, trace};

use crate::config::ClientConfig;
use crate::error::{CoreError, TransportError};

use super::{Request, Response, Transport};

const API_KEY_HEADER: &str = "x-api-key";

// ==============================================================================
// HttpTransport: reqwest client bound to one API base URL
// ==============================================================================

/// `reqwest` backed [`Transport`].
///
/// The API key, user agent, and `Accept: application/json` are installed as
/// default headers at construction and sent with every request.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, CoreError> {
        let base_url = config.parsed_base_url()?;

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(key) = &config.api_key {
            let mut value = HeaderValue::from_str(key)
                .map_err(|e| CoreError::Config(format!("invalid API key header value: {e}")))?;
            value.set_sensitive(true);
            headers.insert(HeaderName::from_static(API_KEY_HEADER), value);
        }

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .pool_max_idle_per_host(32)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| CoreError::Config(format!("build HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, request: &Request) -> Result<Response, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!(api.path = %request.path, "api request");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        debug!(api.path = %request.path, %status, body_len = body.len(), "api response");
        trace!(
            api.path = %request.path,
            body = %String::from_utf8_lossy(&body),
            "api response body"
        );

        Ok(Response {
            status: status.as_u16(),
            body: body.to_vec(),
        })
    }
}
