//! HTTP transport abstraction.
//!
//! Defines the [`Transport`] trait the client talks to, a `reqwest` backed
//! implementation ([`HttpTransport`]), and a test mock (`mock::MockTransport`).

mod http;
#[cfg(test)]
pub mod mock;

pub use http::HttpTransport;

use async_trait::async_trait;

use crate::error::TransportError;

/// A GET request relative to the transport's base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Path including the rendered query string, e.g. `/explorer/tip`.
    pub path: String,
}

impl Request {
    pub fn get(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Status code and raw body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Minimal HTTP client surface the SDK needs.
///
/// Implementations own the base URL and default headers, and must surface
/// any status code as a [`Response`]; only failures to complete the
/// exchange are errors. Dropping the returned future cancels the request.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: &Request) -> Result<Response, TransportError>;
}
