//! Portal routes and role gating

use serde::{Deserialize, Serialize};

use crate::store::state::AuthState;
use crate::types::{Role, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Route {
    #[default]
    Login,
    StaffDashboard,
    AdminDashboard,
}

impl Route {
    /// Resolve a path; `/` and anything unknown land on the login page
    pub fn parse(path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "/admin/login" => Route::Login,
            "/staff/dashboard" => Route::StaffDashboard,
            "/admin/dashboard" => Route::AdminDashboard,
            _ => Route::Login,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/admin/login",
            Route::StaffDashboard => "/staff/dashboard",
            Route::AdminDashboard => "/admin/dashboard",
        }
    }

    /// Role a user needs to see this route; `None` for public routes
    pub fn required_role(&self) -> Option<Role> {
        match self {
            Route::Login => None,
            Route::StaffDashboard => Some(Role::Staff),
            Route::AdminDashboard => Some(Role::Admin),
        }
    }

    /// Landing page after sign-in
    pub fn home_for(role: &Role) -> Route {
        match role {
            Role::Admin => Route::AdminDashboard,
            Role::Staff => Route::StaffDashboard,
            _ => Route::Login,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

pub fn can_access(user: Option<&User>, required: &Role) -> bool {
    user.map(|user| user.has_role(required)).unwrap_or(false)
}

/// What to show for a route given the auth slice
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Render(Route),
    /// Session check still in flight
    Loading,
    Redirect(Route),
    Forbidden { required: Role },
}

pub fn guard(auth: &AuthState, route: Route) -> RouteDecision {
    let Some(required) = route.required_role() else {
        return RouteDecision::Render(route);
    };

    if auth.loading {
        return RouteDecision::Loading;
    }
    if !auth.is_authenticated {
        return RouteDecision::Redirect(Route::Login);
    }
    if can_access(auth.user(), &required) {
        RouteDecision::Render(route)
    } else {
        RouteDecision::Forbidden { required }
    }
}
