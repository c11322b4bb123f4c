//! Mock HTTP client for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::http::{HttpClient, HttpRequest, HttpResponse, TransportError};

type Scripted = Result<HttpResponse, TransportError>;

/// Mock implementation of the HttpClient trait.
///
/// Responses are scripted per URL. Each URL holds a queue; calls consume the
/// queue front to back and the last entry repeats. URLs with nothing scripted
/// fail with a connection error.
///
/// # Example
///
/// ```rust,ignore
/// use bookfinder_core::testing::MockHttpClient;
///
/// let http = MockHttpClient::new();
/// http.push_error(url, TransportError::Timeout).await;
/// http.respond(url, HttpResponse::new(200, "<html>...</html>")).await;
///
/// // First call times out, every later call returns the page.
/// assert_eq!(http.request_count().await, 0);
/// ```
#[derive(Debug, Default)]
pub struct MockHttpClient {
    responses: Arc<RwLock<HashMap<String, VecDeque<Scripted>>>>,
    requests: Arc<RwLock<Vec<HttpRequest>>>,
    delay: Arc<RwLock<Duration>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `url`.
    pub async fn respond(&self, url: &str, response: HttpResponse) {
        self.push(url, Ok(response)).await;
    }

    /// Queue a transport error for `url`.
    pub async fn push_error(&self, url: &str, error: TransportError) {
        self.push(url, Err(error)).await;
    }

    async fn push(&self, url: &str, scripted: Scripted) {
        self.responses
            .write()
            .await
            .entry(url.to_string())
            .or_default()
            .push_back(scripted);
    }

    /// Latency applied to every request.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    pub async fn recorded_requests(&self) -> Vec<HttpRequest> {
        self.requests.read().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }

    pub async fn clear_recorded(&self) {
        self.requests.write().await.clear();
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.write().await.push(request.clone());

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut responses = self.responses.write().await;
        let Some(queue) = responses.get_mut(&request.url) else {
            return Err(TransportError::Connect(format!(
                "no mock response for {}",
                request.url
            )));
        };

        let next = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        next.unwrap_or_else(|| {
            Err(TransportError::Connect(format!(
                "no mock response for {}",
                request.url
            )))
        })
    }
}
