//! Actions for the portal store
//!
//! Every asynchronous operation reports through a [`Lifecycle`]: one
//! `Started` when the request is issued, then exactly one `Succeeded` or
//! `Failed`. All three carry the sequence number the store handed out when
//! the request began, so late answers to superseded requests can be told
//! apart from the current one.

use serde_json::Value;

use crate::routes::Route;
use crate::types::{
    AdminUser, BookingList, BookingStatistics, CheckInReceipt, CustomerAnalytics,
    DashboardStats, RevenueReport, Session, User, UserPage, VerifiedBooking,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Lifecycle<T> {
    Started { seq: u64 },
    Succeeded { seq: u64, payload: T },
    Failed { seq: u64, error: String },
}

impl<T> Lifecycle<T> {
    pub fn seq(&self) -> u64 {
        match self {
            Lifecycle::Started { seq }
            | Lifecycle::Succeeded { seq, .. }
            | Lifecycle::Failed { seq, .. } => *seq,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lifecycle<U> {
        match self {
            Lifecycle::Started { seq } => Lifecycle::Started { seq },
            Lifecycle::Succeeded { seq, payload } => Lifecycle::Succeeded {
                seq,
                payload: f(payload),
            },
            Lifecycle::Failed { seq, error } => Lifecycle::Failed { seq, error },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // === Auth ===
    Login(Lifecycle<Session>),
    Logout(Lifecycle<()>),

    /// Session read back from storage at startup
    SessionRestored(Session),

    /// Replace the signed-in user (e.g. after `GET /Auth/me`)
    SetUser(User),

    SetTokens {
        token: String,
        refresh_token: Option<String>,
    },

    ClearAuth,
    ClearAuthError,

    /// A request came back 401; the session is gone
    SessionExpired,

    // === Staff bookings ===
    FetchBookings(Lifecycle<BookingList>),
    CheckIn(Lifecycle<CheckInReceipt>),
    VerifyBooking(Lifecycle<VerifiedBooking>),
    ClearBookingsError,
    ClearVerifiedBooking,

    // === Admin dashboard ===
    FetchAdminStats(Lifecycle<DashboardStats>),
    FetchBookingStats(Lifecycle<BookingStatistics>),
    FetchCustomerAnalytics(Lifecycle<CustomerAnalytics>),
    FetchRevenueReport(Lifecycle<RevenueReport>),
    FetchUsers(Lifecycle<UserPage>),
    FetchUserDetail(Lifecycle<AdminUser>),
    CreateUser(Lifecycle<Value>),
    UpdateUserRole(Lifecycle<Value>),
    ToggleUserStatus(Lifecycle<Value>),
    ClearAdminErrors,

    // === Navigation ===
    NavigateTo(Route),
}
