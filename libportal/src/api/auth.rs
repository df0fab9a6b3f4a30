use std::sync::Arc;

use serde_json::{json, Value};

use crate::error::ApiError;
use crate::http::{HttpClient, Query};
use crate::types::LoginCredentials;

#[derive(Clone)]
pub struct AuthApi {
    http: Arc<HttpClient>,
}

impl AuthApi {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// `POST /Auth/login`
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<Value, ApiError> {
        self.http.post("/Auth/login", Some(credentials.to_body())).await
    }

    /// `POST /Auth/logout`
    pub async fn logout(&self) -> Result<Value, ApiError> {
        self.http.post("/Auth/logout", None).await
    }

    /// `GET /Auth/me`
    pub async fn current_user(&self) -> Result<Value, ApiError> {
        self.http.get("/Auth/me", &Query::new()).await
    }

    /// `POST /Auth/refresh-token`
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<Value, ApiError> {
        self.http
            .post(
                "/Auth/refresh-token",
                Some(json!({ "refreshToken": refresh_token })),
            )
            .await
    }
}
