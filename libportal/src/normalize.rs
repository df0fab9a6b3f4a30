//! Response normalization
//!
//! The backend is not consistent about envelopes. Depending on the endpoint
//! a successful body is one of:
//!
//! - `{ "success": true, "data": {...}, "message": "..." }` (or `isSuccess`)
//! - the payload itself, recognisable by a field such as `items` or
//!   `todayRevenue`
//! - `{ "data": {...} }` with that field one level down
//!
//! Each resource declares a [`ResponseShape`] and [`normalize`] turns any of
//! the above into a [`Normalized`] value.

use serde_json::{Map, Value};

/// Envelope flags, checked in order
const SUCCESS_FLAGS: &[&str] = &["success", "isSuccess"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseShape {
    /// Fields whose presence marks a bare (or `data`-wrapped) payload
    pub identifying: &'static [&'static str],
    /// Accept any object body as the payload when nothing else matched
    pub accept_bare: bool,
}

impl ResponseShape {
    /// Only an explicit success flag counts
    pub const FLAGGED: ResponseShape = ResponseShape {
        identifying: &[],
        accept_bare: false,
    };

    /// A `user` alone is enough so its role can be checked before the token
    pub const LOGIN: ResponseShape = ResponseShape {
        identifying: &["token", "accessToken", "user"],
        accept_bare: false,
    };
    pub const CURRENT_USER: ResponseShape = ResponseShape {
        identifying: &["id", "userId", "roleName"],
        accept_bare: false,
    };
    pub const REFRESH: ResponseShape = ResponseShape {
        identifying: &["token", "accessToken"],
        accept_bare: false,
    };

    pub const BOOKING_LIST: ResponseShape = ResponseShape {
        identifying: &["items"],
        accept_bare: false,
    };
    pub const CHECK_IN: ResponseShape = ResponseShape::FLAGGED;
    pub const VERIFY: ResponseShape = ResponseShape::FLAGGED;

    pub const ADMIN_STATS: ResponseShape = ResponseShape {
        identifying: &["todayRevenue"],
        accept_bare: true,
    };
    pub const BOOKING_STATS: ResponseShape = ResponseShape {
        identifying: &["totalBookings"],
        accept_bare: true,
    };
    pub const CUSTOMER_ANALYTICS: ResponseShape = ResponseShape {
        identifying: &["totalCustomers"],
        accept_bare: true,
    };
    pub const REVENUE_REPORT: ResponseShape = ResponseShape {
        identifying: &["totalRevenue"],
        accept_bare: true,
    };
    pub const USER_LIST: ResponseShape = ResponseShape {
        identifying: &["items"],
        accept_bare: false,
    };
    pub const USER_DETAIL: ResponseShape = ResponseShape {
        identifying: &["userId"],
        accept_bare: true,
    };
    pub const USER_MUTATION: ResponseShape = ResponseShape {
        identifying: &["userId"],
        accept_bare: false,
    };
}

/// Outcome of normalizing one response body
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Ok {
        payload: Value,
        message: Option<String>,
    },
    Rejected {
        message: Option<String>,
    },
}

impl Normalized {
    pub fn is_ok(&self) -> bool {
        matches!(self, Normalized::Ok { .. })
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Normalized::Ok { message, .. } | Normalized::Rejected { message } => message.as_deref(),
        }
    }
}

pub fn normalize(raw: &Value, shape: &ResponseShape) -> Normalized {
    let Some(obj) = raw.as_object() else {
        return if shape.accept_bare && !raw.is_null() {
            Normalized::Ok {
                payload: raw.clone(),
                message: None,
            }
        } else {
            Normalized::Rejected { message: None }
        };
    };

    let message = obj
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string);

    // Explicit flag decides on its own
    if let Some(flag) = SUCCESS_FLAGS
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_bool))
    {
        if !flag {
            return Normalized::Rejected { message };
        }
        let payload = match obj.get("data") {
            Some(data) if !data.is_null() => data.clone(),
            _ => raw.clone(),
        };
        return Normalized::Ok { payload, message };
    }

    if has_any(obj, shape.identifying) {
        return Normalized::Ok {
            payload: raw.clone(),
            message,
        };
    }

    if let Some(data) = obj.get("data").and_then(Value::as_object) {
        if has_any(data, shape.identifying) || shape.accept_bare {
            return Normalized::Ok {
                payload: Value::Object(data.clone()),
                message,
            };
        }
    }

    if shape.accept_bare {
        return Normalized::Ok {
            payload: raw.clone(),
            message,
        };
    }

    Normalized::Rejected { message }
}

fn has_any(obj: &Map<String, Value>, fields: &[&str]) -> bool {
    fields.iter().any(|field| obj.contains_key(*field))
}
