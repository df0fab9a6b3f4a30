//! Authentication orchestration

use serde_json::Value;

use super::{Context, Operation, Outcome};
use crate::api::AuthApi;
use crate::events::Event;
use crate::normalize::{normalize, Normalized, ResponseShape};
use crate::routes::Route;
use crate::store::{Action, Lifecycle};
use crate::types::{LoginCredentials, Role, Session, User};

pub const ROLE_NOT_FOUND: &str = "User role not found";
pub const INVALID_ROLE: &str = "Invalid role for this portal";

pub struct AuthService {
    context: Context,
    api: AuthApi,
}

impl AuthService {
    pub(crate) fn new(context: Context, api: AuthApi) -> Self {
        Self { context, api }
    }

    /// Sign in and persist the session
    ///
    /// The user must carry one of the configured portal roles; otherwise
    /// the login fails and nothing is written to storage.
    pub async fn login(&self, credentials: LoginCredentials) -> Outcome<Session> {
        let op = Operation::new("login", Action::Login, ResponseShape::LOGIN, "Login failed");
        let allowed = &self.context.config.portal.allowed_roles;

        let (seq, outcome) = self
            .context
            .run_sequenced(op, self.api.login(&credentials), |payload| {
                session_from_login(&payload, allowed)
            })
            .await;

        let Some(session) = &outcome.data else {
            return outcome;
        };

        // A newer login owns the auth slice and storage now
        if self.context.store.select(|s| s.auth.seq) != seq {
            tracing::debug!(seq, "Login superseded, session not persisted");
            return outcome;
        }

        if let Err(e) = self.context.session.save(session) {
            let error = e.to_string();
            tracing::warn!(seq, "{}", error);
            self.context.store.dispatch(Action::Login(Lifecycle::Failed {
                seq,
                error: error.clone(),
            }));
            return Outcome::failed(error);
        }

        if let Some(role) = &session.user.role_name {
            tracing::info!(user_id = %session.user.id, %role, "Signed in");
            self.context.events.emit(Event::SignedIn {
                user_id: session.user.id.clone(),
                role: role.clone(),
            });
            self.context
                .store
                .dispatch(Action::NavigateTo(Route::home_for(role)));
        }
        outcome
    }

    /// Sign out remotely; local session and auth state are cleared whether
    /// or not the backend call succeeds
    pub async fn logout(&self) -> Outcome<()> {
        let store = &self.context.store;
        let seq = store.begin();
        store.dispatch(Action::Logout(Lifecycle::Started { seq }));

        let result = self.api.logout().await;

        if let Err(e) = self.context.session.clear() {
            tracing::error!("Failed to clear stored session: {}", e);
        }

        let outcome = match result {
            Ok(_) => {
                store.dispatch(Action::Logout(Lifecycle::Succeeded { seq, payload: () }));
                Outcome::ok((), None)
            }
            Err(error) => {
                let message = error.user_message("Logout failed");
                tracing::warn!("Remote logout failed: {}", message);
                store.dispatch(Action::Logout(Lifecycle::Failed {
                    seq,
                    error: message.clone(),
                }));
                store.dispatch(Action::ClearAuth);
                Outcome::failed(message)
            }
        };

        self.context.events.emit(Event::SignedOut);
        store.dispatch(Action::NavigateTo(Route::Login));
        outcome
    }

    /// Restore the persisted session without touching the network
    pub fn rehydrate(&self) -> Outcome<User> {
        match self.context.session.load() {
            Ok(Some(session)) => {
                let user = session.user.clone();
                self.context.store.dispatch(Action::SessionRestored(session));
                Outcome::ok(user, None)
            }
            Ok(None) => Outcome::nothing(),
            Err(e) => {
                tracing::error!("Error loading session from storage: {}", e);
                Outcome::nothing()
            }
        }
    }

    /// Re-read the signed-in user from `GET /Auth/me`
    pub async fn fetch_current_user(&self) -> Outcome<User> {
        let fallback = "Failed to fetch current user";
        let raw = match self.api.current_user().await {
            Ok(raw) => raw,
            Err(error) => return Outcome::failed(self.context.api_failure(&error, fallback)),
        };

        let user = match normalize(&raw, &ResponseShape::CURRENT_USER) {
            Normalized::Ok { payload, .. } => User::from_value(&payload),
            Normalized::Rejected { message } => {
                return Outcome::failed(message.unwrap_or_else(|| fallback.to_string()))
            }
        };
        let Some(user) = user else {
            return Outcome::failed(fallback);
        };

        if let Err(e) = self.context.session.update_user(user.clone()) {
            tracing::warn!("Failed to persist refreshed user: {}", e);
        }
        self.context.store.dispatch(Action::SetUser(user.clone()));
        Outcome::ok(user, None)
    }

    /// Exchange the stored refresh token for a new access token
    pub async fn refresh_session(&self) -> Outcome<()> {
        let fallback = "Token refresh failed";
        let Some(refresh_token) = self.context.session.refresh_token() else {
            return Outcome::failed("No refresh token available");
        };

        let raw = match self.api.refresh_token(&refresh_token).await {
            Ok(raw) => raw,
            Err(error) => return Outcome::failed(self.context.api_failure(&error, fallback)),
        };

        let payload = match normalize(&raw, &ResponseShape::REFRESH) {
            Normalized::Ok { payload, .. } => payload,
            Normalized::Rejected { message } => {
                return Outcome::failed(message.unwrap_or_else(|| fallback.to_string()))
            }
        };
        let Some(token) = string_field(&payload, &["token", "accessToken"]) else {
            return Outcome::failed(fallback);
        };
        let refresh = string_field(&payload, &["refreshToken"]);

        if let Err(e) = self
            .context
            .session
            .update_tokens(token.clone(), refresh.clone())
        {
            return Outcome::failed(e.to_string());
        }
        self.context.store.dispatch(Action::SetTokens {
            token,
            refresh_token: refresh,
        });
        Outcome::ok((), None)
    }

    pub fn clear_error(&self) {
        self.context.store.dispatch(Action::ClearAuthError);
    }
}

/// Build the session from a normalized login payload and check its role
fn session_from_login(payload: &Value, allowed: &[Role]) -> Result<Session, String> {
    let user = payload
        .get("user")
        .and_then(User::from_value)
        .ok_or_else(|| ROLE_NOT_FOUND.to_string())?;

    let role = user
        .role_name
        .as_ref()
        .ok_or_else(|| ROLE_NOT_FOUND.to_string())?;
    if !allowed.contains(role) {
        return Err(INVALID_ROLE.to_string());
    }

    let token = string_field(payload, &["token", "accessToken"])
        .ok_or_else(|| "Login failed".to_string())?;

    Ok(Session {
        token,
        refresh_token: string_field(payload, &["refreshToken"]),
        user,
    })
}

fn string_field(payload: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| payload.get(*key).and_then(Value::as_str))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn portal_roles() -> Vec<Role> {
        vec![Role::Staff, Role::Admin]
    }

    #[test]
    fn test_session_from_login() {
        let payload = json!({
            "token": "t1",
            "refreshToken": "r1",
            "user": {"userId": "5", "fullname": "Hoa", "roleName": "Admin"}
        });
        let session = session_from_login(&payload, &portal_roles()).unwrap();
        assert_eq!(session.token, "t1");
        assert_eq!(session.refresh_token.as_deref(), Some("r1"));
        assert_eq!(session.user.role_name, Some(Role::Admin));
    }

    #[test]
    fn test_customer_role_is_rejected() {
        let payload = json!({"token": "t", "user": {"roleName": "Customer"}});
        assert_eq!(
            session_from_login(&payload, &portal_roles()).unwrap_err(),
            INVALID_ROLE
        );
    }

    #[test]
    fn test_missing_user_or_role() {
        let no_user = json!({"token": "t"});
        assert_eq!(
            session_from_login(&no_user, &portal_roles()).unwrap_err(),
            ROLE_NOT_FOUND
        );

        let no_role = json!({"token": "t", "user": {"fullName": "X"}});
        assert_eq!(
            session_from_login(&no_role, &portal_roles()).unwrap_err(),
            ROLE_NOT_FOUND
        );
    }

    #[test]
    fn test_role_checked_before_token() {
        let customer = json!({"user": {"roleName": "Customer"}});
        assert_eq!(
            session_from_login(&customer, &portal_roles()).unwrap_err(),
            INVALID_ROLE
        );

        let staff = json!({"user": {"roleName": "Staff"}});
        assert_eq!(
            session_from_login(&staff, &portal_roles()).unwrap_err(),
            "Login failed"
        );
    }

    #[test]
    fn test_allowed_roles_are_configurable() {
        let payload = json!({"token": "t", "user": {"roleName": "Staff"}});
        assert_eq!(
            session_from_login(&payload, &[Role::Admin]).unwrap_err(),
            INVALID_ROLE
        );
    }
}
