//! Service layer for the cinema portal
//!
//! Services are the orchestrators between the view layer and the backend.
//! Every operation follows the same shape:
//!
//! 1. dispatch `Started` with a fresh sequence number
//! 2. call the API module
//! 3. normalize the response with the resource's [`ResponseShape`]
//! 4. dispatch `Succeeded` or `Failed` and return an [`Outcome`]
//!
//! `PortalService` is the facade that wires the shared pieces (store,
//! session, HTTP client, event bus) and hands out the sub-services.
//!
//! # Example
//!
//! ```no_run
//! use libportal::service::PortalService;
//! use libportal::types::LoginCredentials;
//!
//! # async fn example() -> libportal::Result<()> {
//! let service = PortalService::new()?;
//!
//! let outcome = service
//!     .auth()
//!     .login(LoginCredentials::new("staff@cinema.vn", "secret"))
//!     .await;
//! if outcome.success {
//!     service.bookings().fetch_today(&Default::default()).await;
//! }
//! # Ok(())
//! # }
//! ```

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod outcome;

pub use outcome::Outcome;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use self::admin::AdminService;
use self::auth::AuthService;
use self::bookings::BookingsService;
use crate::api::{AdminApi, AuthApi, BookingsApi};
use crate::error::ApiError;
use crate::events::{EventBus, EventReceiver};
use crate::http::{HttpClient, ReqwestTransport, Transport};
use crate::normalize::{normalize, Normalized, ResponseShape};
use crate::session::{FileStorage, SessionManager, SessionStorage};
use crate::store::{Action, Lifecycle, PortalState, Store};
use crate::{Config, Result};

/// Main service facade
pub struct PortalService {
    context: Context,
    auth: AuthService,
    bookings: BookingsService,
    admin: AdminService,
}

impl PortalService {
    /// Load configuration from the default location and talk to the real
    /// backend, persisting the session to the configured file
    pub fn new() -> Result<Self> {
        let config = Config::load()?;
        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self> {
        let transport = ReqwestTransport::new(
            &config.api.base_url,
            config.api.timeout_secs.map(Duration::from_secs),
        )?;
        let storage = FileStorage::new(config.storage_path());
        Ok(Self::with_parts(
            config,
            Arc::new(transport),
            Arc::new(storage),
        ))
    }

    /// Assemble from explicit parts; tests pass a `MockTransport` and
    /// `MemoryStorage` here
    pub fn with_parts(
        config: Config,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn SessionStorage>,
    ) -> Self {
        let session = Arc::new(SessionManager::new(storage));
        let events = EventBus::new(100);
        let http = Arc::new(HttpClient::new(transport, session.clone(), events.clone()));

        let context = Context {
            store: Arc::new(Store::new()),
            session,
            events,
            config: Arc::new(config),
        };

        Self {
            auth: AuthService::new(context.clone(), AuthApi::new(http.clone())),
            bookings: BookingsService::new(context.clone(), BookingsApi::new(http.clone())),
            admin: AdminService::new(context.clone(), AdminApi::new(http)),
            context,
        }
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn bookings(&self) -> &BookingsService {
        &self.bookings
    }

    pub fn admin(&self) -> &AdminService {
        &self.admin
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.context.store
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.context.session
    }

    pub fn config(&self) -> &Config {
        &self.context.config
    }

    /// Snapshot of the current state
    pub fn state(&self) -> PortalState {
        self.context.store.state()
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.context.events.subscribe()
    }
}

/// Shared resources every sub-service holds
#[derive(Clone)]
pub(crate) struct Context {
    pub(crate) store: Arc<Store>,
    pub(crate) session: Arc<SessionManager>,
    pub(crate) events: EventBus,
    pub(crate) config: Arc<Config>,
}

/// Static description of one orchestrated operation
pub(crate) struct Operation<T> {
    pub(crate) name: &'static str,
    pub(crate) action: fn(Lifecycle<T>) -> Action,
    pub(crate) shape: ResponseShape,
    /// Message when the call failed without a usable server message
    pub(crate) fallback: &'static str,
    /// Message when the body had an unrecognized shape; defaults to `fallback`
    pub(crate) invalid_shape: Option<&'static str>,
    /// Message when the server confirmed success without saying anything
    pub(crate) success_message: Option<&'static str>,
}

impl<T> Operation<T> {
    pub(crate) fn new(
        name: &'static str,
        action: fn(Lifecycle<T>) -> Action,
        shape: ResponseShape,
        fallback: &'static str,
    ) -> Self {
        Self {
            name,
            action,
            shape,
            fallback,
            invalid_shape: None,
            success_message: None,
        }
    }

    pub(crate) fn invalid_shape(mut self, message: &'static str) -> Self {
        self.invalid_shape = Some(message);
        self
    }

    pub(crate) fn success_message(mut self, message: &'static str) -> Self {
        self.success_message = Some(message);
        self
    }
}

impl Context {
    /// Run one operation through its full request lifecycle
    ///
    /// `extract` turns the normalized payload into the slice's data type;
    /// an `Err` from it fails the operation with that message.
    pub(crate) async fn run<T, F, E>(&self, op: Operation<T>, call: F, extract: E) -> Outcome<T>
    where
        T: Clone,
        F: Future<Output = std::result::Result<Value, ApiError>>,
        E: FnOnce(Value) -> std::result::Result<T, String>,
    {
        self.run_sequenced(op, call, extract).await.1
    }

    /// [`Context::run`], also returning the sequence number the request was
    /// issued under
    pub(crate) async fn run_sequenced<T, F, E>(
        &self,
        op: Operation<T>,
        call: F,
        extract: E,
    ) -> (u64, Outcome<T>)
    where
        T: Clone,
        F: Future<Output = std::result::Result<Value, ApiError>>,
        E: FnOnce(Value) -> std::result::Result<T, String>,
    {
        let seq = self.store.begin();
        self.store.dispatch((op.action)(Lifecycle::Started { seq }));
        tracing::debug!(operation = op.name, seq, "Request started");

        let result = match call.await {
            Ok(raw) => match normalize(&raw, &op.shape) {
                Normalized::Ok { payload, message } => extract(payload).map(|data| {
                    let message = message.or_else(|| op.success_message.map(str::to_string));
                    (data, message)
                }),
                Normalized::Rejected { message } => Err(message.unwrap_or_else(|| {
                    op.invalid_shape.unwrap_or(op.fallback).to_string()
                })),
            },
            Err(error) => Err(self.api_failure(&error, op.fallback)),
        };

        match result {
            Ok((data, message)) => {
                tracing::debug!(operation = op.name, seq, "Request succeeded");
                self.store.dispatch((op.action)(Lifecycle::Succeeded {
                    seq,
                    payload: data.clone(),
                }));
                (seq, Outcome::ok(data, message))
            }
            Err(error) => {
                tracing::warn!(operation = op.name, seq, "{}", error);
                self.store.dispatch((op.action)(Lifecycle::Failed {
                    seq,
                    error: error.clone(),
                }));
                (seq, Outcome::failed(error))
            }
        }
    }

    /// User-facing message for `error`, tearing down the auth slice first
    /// when the backend rejected our session
    pub(crate) fn api_failure(&self, error: &ApiError, fallback: &str) -> String {
        if error.ends_session() && self.store.select(|s| s.auth.is_authenticated) {
            self.store.dispatch(Action::SessionExpired);
        }
        error.user_message(fallback)
    }
}

/// Deserialize a normalized payload, reporting failures as `fallback: reason`
pub(crate) fn decode<T: DeserializeOwned>(payload: Value, fallback: &str) -> std::result::Result<T, String> {
    serde_json::from_value(payload).map_err(|e| {
        tracing::debug!("Payload did not decode: {}", e);
        ApiError::Decode(e.to_string()).user_message(fallback)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{MockTransport, PROFILE_UPDATE_PATH};
    use crate::routes::Route;
    use crate::session::MemoryStorage;
    use crate::types::{Role, Session, User};

    fn signed_in() -> PortalService {
        let service = PortalService::with_parts(
            Config::default_config(),
            Arc::new(MockTransport::new()),
            Arc::new(MemoryStorage::new()),
        );
        service.store().dispatch(Action::SessionRestored(Session {
            token: "tok".to_string(),
            refresh_token: None,
            user: User {
                id: "1".to_string(),
                full_name: "Staff".to_string(),
                email: None,
                role_name: Some(Role::Staff),
                cinema_id: None,
                phone: None,
            },
        }));
        service
            .store()
            .dispatch(Action::NavigateTo(Route::StaffDashboard));
        service
    }

    fn unauthorized(path: &str) -> ApiError {
        ApiError::Status {
            status: 401,
            path: path.to_string(),
            body: Value::Null,
        }
    }

    #[test]
    fn test_unauthorized_failure_expires_session() {
        let service = signed_in();
        let message = service
            .context
            .api_failure(&unauthorized("/Bookings/today"), "Failed to fetch bookings");

        assert_eq!(message, "Request failed with status code 401");
        let state = service.state();
        assert!(!state.auth.is_authenticated);
        assert_eq!(state.location, Route::Login);
    }

    #[test]
    fn test_profile_update_rejection_keeps_auth_state() {
        let service = signed_in();
        service
            .context
            .api_failure(&unauthorized(PROFILE_UPDATE_PATH), "Update failed");

        assert!(service.state().auth.is_authenticated);
    }
}
