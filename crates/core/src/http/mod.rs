//! HTTP GET capability used by strategies and the comment enricher.
//!
//! Strategies only see the [`HttpClient`] trait; [`ReqwestHttpClient`] is the
//! production implementation.

mod reqwest_client;

pub use reqwest_client::ReqwestHttpClient;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// A GET request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    /// Extra headers on top of the client defaults.
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            timeout,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Status and decoded body of a response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Errors raised by the transport itself (no HTTP status was received).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request failed: {0}")]
    Request(String),
}

/// Capability to perform an HTTP GET.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}
