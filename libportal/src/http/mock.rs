//! Scripted transport for tests
//!
//! Routes are matched on method and path (query string ignored). The most
//! recently registered route wins, so a test can override an earlier reply.
//! Unmatched requests get a 404. Every request is recorded.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{HttpRequest, HttpResponse, Method, Transport};
use crate::error::ApiError;

#[derive(Debug, Clone)]
enum Reply {
    Respond { status: u16, body: Value },
    NetworkError(String),
}

#[derive(Debug, Clone)]
struct MockRoute {
    method: Method,
    path: String,
    reply: Reply,
    delay: Duration,
}

#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<MockRoute>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to `method path` with `status` and `body`
    pub fn on(&self, method: Method, path: &str, status: u16, body: Value) -> &Self {
        self.on_with_delay(method, path, status, body, Duration::ZERO)
    }

    /// Like [`MockTransport::on`], after sleeping for `delay`
    pub fn on_with_delay(
        &self,
        method: Method,
        path: &str,
        status: u16,
        body: Value,
        delay: Duration,
    ) -> &Self {
        self.add(MockRoute {
            method,
            path: path.to_string(),
            reply: Reply::Respond { status, body },
            delay,
        })
    }

    /// Fail `method path` as if the network were down
    pub fn fail_network(&self, method: Method, path: &str, message: &str) -> &Self {
        self.add(MockRoute {
            method,
            path: path.to_string(),
            reply: Reply::NetworkError(message.to_string()),
            delay: Duration::ZERO,
        })
    }

    /// Every request sent so far, oldest first
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests().pop()
    }

    pub fn request_count(&self) -> usize {
        self.requests().len()
    }

    /// Requests sent to `path` (query string ignored)
    pub fn requests_to(&self, path: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.route() == path)
            .collect()
    }

    fn add(&self, route: MockRoute) -> &Self {
        if let Ok(mut routes) = self.routes.lock() {
            routes.push(route);
        }
        self
    }

    fn find(&self, request: &HttpRequest) -> Option<MockRoute> {
        let routes = self.routes.lock().ok()?;
        routes
            .iter()
            .rev()
            .find(|route| route.method == request.method && route.path == request.route())
            .cloned()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let Some(route) = self.find(&request) else {
            return Ok(HttpResponse {
                status: 404,
                body: json!({
                    "message": format!("No mock route for {} {}", request.method, request.route())
                }),
            });
        };

        if !route.delay.is_zero() {
            tokio::time::sleep(route.delay).await;
        }

        match route.reply {
            Reply::Respond { status, body } => Ok(HttpResponse { status, body }),
            Reply::NetworkError(message) => Err(ApiError::Network(message)),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
