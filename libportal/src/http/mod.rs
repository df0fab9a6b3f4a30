//! HTTP client for the cinema backend
//!
//! [`HttpClient`] is the only way the API modules talk to the network. It
//! sends every request through a [`Transport`], which keeps the client
//! testable: production uses [`ReqwestTransport`], tests script a
//! [`MockTransport`].
//!
//! For every request the client:
//! - attaches `Authorization: Bearer <token>` when a session is present
//! - always sends `Content-Type: application/json`
//! - returns the response body on 2xx
//! - on 401, clears the session and emits [`Event::SessionExpired`]
//!   (except for the profile update endpoint, whose 401 is a form error)
//! - on 405, logs the offending method and path

pub mod mock;
pub mod query;
pub mod transport;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ApiError;
use crate::events::{Event, EventBus};
use crate::routes::Route;
use crate::session::SessionManager;

pub use mock::MockTransport;
pub use query::Query;
pub use transport::ReqwestTransport;

/// A 401 from this endpoint does not end the session
pub const PROFILE_UPDATE_PATH: &str = "/user-accounts/me/info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully prepared request, relative to the transport's base URL
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    /// Path including the encoded query string, e.g. `/admin/users?Page=2`
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Path without the query string
    pub fn route(&self) -> &str {
        self.path.split('?').next().unwrap_or(&self.path)
    }

    /// Encoded query string, without the leading `?`
    pub fn query(&self) -> Option<&str> {
        self.path.split_once('?').map(|(_, query)| query)
    }
}

/// Raw response; `body` is `Null` when the server sent nothing
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Value,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Moves a request over the wire
///
/// Implementations report connectivity problems as [`ApiError::Network`]
/// and return every HTTP status, including errors, as a response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;

    /// Transport name for logs
    fn name(&self) -> &str;
}

pub struct HttpClient {
    transport: Arc<dyn Transport>,
    session: Arc<SessionManager>,
    events: EventBus,
}

impl HttpClient {
    pub fn new(transport: Arc<dyn Transport>, session: Arc<SessionManager>, events: EventBus) -> Self {
        Self {
            transport,
            session,
            events,
        }
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub async fn get(&self, path: &str, query: &Query) -> Result<Value, ApiError> {
        self.request(Method::Get, path, None, query).await
    }

    pub async fn post(&self, path: &str, body: Option<Value>) -> Result<Value, ApiError> {
        self.request(Method::Post, path, body, &Query::new()).await
    }

    pub async fn put(&self, path: &str, body: Option<Value>) -> Result<Value, ApiError> {
        self.request(Method::Put, path, body, &Query::new()).await
    }

    /// Send one request and unwrap its body
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        query: &Query,
    ) -> Result<Value, ApiError> {
        let full_path = if query.is_empty() {
            path.to_string()
        } else {
            format!("{}?{}", path, query.encode())
        };

        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if let Some(token) = self.session.token() {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }

        let request = HttpRequest {
            method,
            path: full_path,
            headers,
            body,
        };

        tracing::debug!(
            transport = self.transport.name(),
            "{} {}",
            request.method,
            request.path
        );

        let response = self.transport.send(request).await.map_err(|e| {
            tracing::warn!("{} {} failed: {}", method, path, e);
            e
        })?;

        if response.is_success() {
            tracing::debug!(status = response.status, "{} {} succeeded", method, path);
            return Ok(response.body);
        }

        let error = ApiError::Status {
            status: response.status,
            path: path.to_string(),
            body: response.body,
        };

        match error.status() {
            Some(401) if error.ends_session() => self.end_session(path),
            Some(401) => tracing::debug!("401 from profile update, keeping session"),
            Some(405) => tracing::error!(
                "Method not allowed: {} {} (check the endpoint's HTTP method)",
                method,
                path
            ),
            status => tracing::warn!(?status, "{} {} rejected", method, path),
        }

        Err(error)
    }

    fn end_session(&self, path: &str) {
        tracing::warn!("Unauthorized response from {}, ending session", path);
        if let Err(e) = self.session.clear() {
            tracing::error!("Failed to clear stored session: {}", e);
        }
        self.events.emit(Event::SessionExpired {
            redirect_to: Route::Login.path().to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Role, Session, User};
    use serde_json::json;

    fn signed_in_session() -> Arc<SessionManager> {
        let session = Arc::new(SessionManager::in_memory());
        session
            .save(&Session {
                token: "tok-1".to_string(),
                refresh_token: None,
                user: User {
                    id: "1".to_string(),
                    full_name: "Admin".to_string(),
                    email: None,
                    role_name: Some(Role::Admin),
                    cinema_id: None,
                    phone: None,
                },
            })
            .unwrap();
        session
    }

    fn client(mock: &Arc<MockTransport>, session: Arc<SessionManager>) -> HttpClient {
        HttpClient::new(mock.clone(), session, EventBus::new(8))
    }

    #[tokio::test]
    async fn test_injects_bearer_token_and_content_type() {
        let mock = Arc::new(MockTransport::new());
        mock.on(Method::Get, "/Auth/me", 200, json!({"id": "1"}));
        let http = client(&mock, signed_in_session());

        http.get("/Auth/me", &Query::new()).await.unwrap();

        let sent = mock.last_request().unwrap();
        assert_eq!(sent.header("authorization"), Some("Bearer tok-1"));
        assert_eq!(sent.header("Content-Type"), Some("application/json"));
    }

    #[tokio::test]
    async fn test_no_authorization_without_session() {
        let mock = Arc::new(MockTransport::new());
        mock.on(Method::Post, "/Auth/login", 200, json!({}));
        let http = client(&mock, Arc::new(SessionManager::in_memory()));

        http.post("/Auth/login", Some(json!({"email": "a"}))).await.unwrap();

        let sent = mock.last_request().unwrap();
        assert!(sent.header("Authorization").is_none());
        assert_eq!(sent.body, Some(json!({"email": "a"})));
    }

    #[tokio::test]
    async fn test_success_returns_body() {
        let mock = Arc::new(MockTransport::new());
        mock.on(Method::Get, "/admin/stats", 200, json!({"todayRevenue": 10}));
        let http = client(&mock, signed_in_session());

        let body = http.get("/admin/stats", &Query::new()).await.unwrap();
        assert_eq!(body, json!({"todayRevenue": 10}));
    }

    #[tokio::test]
    async fn test_unauthorized_clears_session_and_emits_event() {
        let mock = Arc::new(MockTransport::new());
        mock.on(Method::Get, "/admin/stats", 401, json!({"message": "expired"}));
        let session = signed_in_session();
        let http = client(&mock, session.clone());
        let mut events = http.events().subscribe();

        let err = http.get("/admin/stats", &Query::new()).await.unwrap_err();

        assert!(err.is_unauthorized());
        assert!(session.current().is_none());
        assert_eq!(
            events.try_recv().unwrap(),
            Event::SessionExpired {
                redirect_to: "/admin/login".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_unauthorized_profile_update_keeps_session() {
        let mock = Arc::new(MockTransport::new());
        mock.on(Method::Put, "/user-accounts/me/info", 401, json!({"message": "Wrong password"}));
        let session = signed_in_session();
        let http = client(&mock, session.clone());
        let mut events = http.events().subscribe();

        let err = http.put("/user-accounts/me/info", Some(json!({}))).await.unwrap_err();

        assert!(err.is_unauthorized());
        assert!(session.current().is_some());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_method_not_allowed_is_plain_error() {
        let mock = Arc::new(MockTransport::new());
        mock.on(Method::Put, "/Bookings/1/check-in", 405, Value::Null);
        let session = signed_in_session();
        let http = client(&mock, session.clone());

        let err = http.put("/Bookings/1/check-in", None).await.unwrap_err();
        assert_eq!(err.status(), Some(405));
        assert!(session.current().is_some());
    }

    #[tokio::test]
    async fn test_query_appended_to_path() {
        let mock = Arc::new(MockTransport::new());
        mock.on(Method::Get, "/admin/users", 200, json!({"items": []}));
        let http = client(&mock, signed_in_session());

        let mut query = Query::new();
        query.push("Role", "Staff").push("Page", 2);
        http.get("/admin/users", &query).await.unwrap();

        let sent = mock.last_request().unwrap();
        assert_eq!(sent.route(), "/admin/users");
        assert_eq!(sent.query(), Some("Role=Staff&Page=2"));
    }

    #[tokio::test]
    async fn test_network_error_passes_through() {
        let mock = Arc::new(MockTransport::new());
        mock.fail_network(Method::Get, "/Bookings/today", "connection refused");
        let http = client(&mock, signed_in_session());

        let err = http.get("/Bookings/today", &Query::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }
}
