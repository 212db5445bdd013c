use std::time::Duration;

use reqwest::Url;

use crate::error::CoreError;

pub const DEFAULT_URL: &str = "https://api.tzpro.io";
pub const ENV_URL: &str = "TZPRO_URL";
pub const ENV_API_KEY: &str = "TZPRO_API_KEY";

/// Read-only client configuration, shared by every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Sent as `X-Api-Key` when set.
    pub api_key: Option<String>,
    pub user_agent: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_URL.to_owned(),
            api_key: None,
            user_agent: concat!("tzpro-rs/", env!("CARGO_PKG_VERSION")).to_owned(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Defaults overridden by `TZPRO_URL` and `TZPRO_API_KEY` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(url) = non_empty_env(ENV_URL) {
            config.base_url = url;
        }
        config.api_key = non_empty_env(ENV_API_KEY);
        config
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Parsed base URL with any trailing slash removed.
    pub(crate) fn parsed_base_url(&self) -> Result<String, CoreError> {
        parse_base_url(&self.base_url)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

pub(crate) fn parse_base_url(base_url: &str) -> Result<String, CoreError> {
    let parsed = Url::parse(base_url).map_err(|e| {
        CoreError::Config(format!("invalid base URL `{base_url}`: expected HTTP(S) URL ({e})"))
    })?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(CoreError::Config(format!(
                "unsupported base URL scheme `{other}`; expected http or https"
            )));
        }
    }
    if parsed.query().is_some() {
        return Err(CoreError::Config(format!(
            "base URL `{base_url}` must not carry a query string"
        )));
    }
    Ok(base_url.trim_end_matches('/').to_owned())
}
