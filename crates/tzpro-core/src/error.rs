use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("API transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("decode response of {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: DecodeError,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CoreError {
    pub(crate) fn decode(endpoint: &str, source: DecodeError) -> Self {
        Self::Decode {
            endpoint: endpoint.to_owned(),
            source,
        }
    }

    /// HTTP status code when the server answered with a non-2xx response.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Http(err) => Some(err.status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Http(err) if err.is_not_found())
    }

    pub fn as_http(&self) -> Option<&HttpError> {
        match self {
            Self::Http(err) => Some(err),
            _ => None,
        }
    }
}

// ==============================================================================
// Transport Errors
// ==============================================================================

/// Failure to complete a request/response exchange. Never retried internally.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("request deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    #[error("{0}")]
    Other(String),
}

// ==============================================================================
// HTTP Status Errors
// ==============================================================================

/// A non-2xx response. Keeps the status code and the raw body so callers
/// can special-case, e.g., not-found.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{path}: HTTP {status}{}", summary(.errors))]
pub struct HttpError {
    pub status: u16,
    pub path: String,
    pub body: String,
    /// Structured errors when the body follows the `{"errors": [...]}` shape.
    pub errors: Vec<ApiError>,
}

impl HttpError {
    pub fn new(path: &str, status: u16, body: &[u8]) -> Self {
        let errors = serde_json::from_slice::<ApiErrorBody>(body)
            .map(|parsed| parsed.errors)
            .unwrap_or_default();
        Self {
            status,
            path: path.to_owned(),
            body: String::from_utf8_lossy(body).into_owned(),
            errors,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401 || self.status == 403
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }
}

fn summary(errors: &[ApiError]) -> String {
    match errors.first() {
        Some(err) => format!(": {err}"),
        None => String::new(),
    }
}

/// One entry of the server's structured error list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiError {
    pub code: i64,
    pub status: u16,
    pub message: String,
    pub scope: String,
    pub detail: String,
    pub request_id: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code)?;
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct ApiErrorBody {
    errors: Vec<ApiError>,
}

// ==============================================================================
// Decode Errors
// ==============================================================================

/// Malformed JSON or an unexpected shape, located by byte offset into the
/// response body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("at byte {offset}: {message}")]
pub struct DecodeError {
    pub offset: usize,
    pub message: String,
}

impl DecodeError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }

    /// Translate a `serde_json` error (line/column) into a byte offset of
    /// `text`, shifted by `base` when `text` is a slice of a larger body.
    pub(crate) fn from_json(text: &str, base: usize, err: &serde_json::Error) -> Self {
        Self::new(base + byte_offset(text, err.line(), err.column()), err.to_string())
    }
}

/// `line` and `column` are 1-based as reported by `serde_json`; a column of
/// 0 means the error happened before the first byte of the line.
fn byte_offset(text: &str, line: usize, column: usize) -> usize {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_keeps_status_and_body() {
        let err = HttpError::new("/explorer/bakers/tz1x", 404, b"not found");
        assert_eq!(err.status, 404);
        assert_eq!(err.body, "not found");
        assert!(err.errors.is_empty());
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "/explorer/bakers/tz1x: HTTP 404");
    }

    #[test]
    fn http_error_parses_structured_body() {
        let body = br#"{"errors":[{"code":1003,"status":404,"message":"resource not found","detail":"no such account","request_id":"abc"}]}"#;
        let err = HttpError::new("/explorer/account/tz1x", 404, body);
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].code, 1003);
        assert_eq!(err.errors[0].request_id, "abc");
        assert!(err.to_string().contains("resource not found (1003): no such account"));
    }

    #[test]
    fn core_error_exposes_http_status() {
        let err = CoreError::from(HttpError::new("/x", 429, b""));
        assert_eq!(err.http_status(), Some(429));
        assert!(!err.is_not_found());
        assert!(err.as_http().expect("http error").is_rate_limited());

        let err = CoreError::Config("bad".into());
        assert_eq!(err.http_status(), None);
    }

    #[test]
    fn json_error_offset_on_second_line() {
        let text = "{\n  \"a\": tru }";
        let err = serde_json::from_str::<serde_json::Value>(text).expect_err("must fail");
        let decoded = DecodeError::from_json(text, 0, &err);
        assert!(decoded.offset > 2 && decoded.offset <= text.len());
    }

    #[test]
    fn json_error_offset_respects_base() {
        let text = "[1,,2]";
        let err = serde_json::from_str::<Vec<i64>>(text).expect_err("must fail");
        let decoded = DecodeError::from_json(text, 10, &err);
        assert_eq!(decoded.offset, 13);
    }
}
