//! Portal state
//!
//! The root state holds one slice per backend area. Each remote resource is
//! a [`Remote`] with its own loading flag, error and failure policy, so a
//! failing report never blanks out a neighbouring one.

use serde_json::Value;

use super::remote::{FailurePolicy, Remote};
use crate::routes::Route;
use crate::types::{
    AdminUser, BookingList, BookingStatistics, CheckInReceipt, CustomerAnalytics,
    DashboardStats, RevenueReport, Session, User, UserPage, VerifiedBooking,
};

/// Root state
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PortalState {
    pub auth: AuthState,
    pub bookings: BookingsState,
    pub admin: AdminState,
    /// Where the view layer should be
    pub location: Route,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuthState {
    pub session: Option<Session>,
    pub is_authenticated: bool,
    pub loading: bool,
    pub error: Option<String>,
    /// Latest login/logout request
    pub seq: u64,
}

impl AuthState {
    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingsState {
    pub list: Remote<BookingList>,
    /// Result of the last code lookup; cleared on tab change
    pub verified: Remote<Option<VerifiedBooking>>,
    pub check_in: Remote<Option<CheckInReceipt>>,
}

impl Default for BookingsState {
    fn default() -> Self {
        Self {
            list: Remote::new(FailurePolicy::Reset),
            verified: Remote::new(FailurePolicy::Reset),
            check_in: Remote::new(FailurePolicy::KeepStale),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdminState {
    pub stats: Remote<DashboardStats>,
    pub booking_stats: Remote<BookingStatistics>,
    pub customer_analytics: Remote<CustomerAnalytics>,
    pub revenue_report: Remote<RevenueReport>,
    pub users: Remote<UserPage>,
    pub user_detail: Remote<Option<AdminUser>>,
    /// Last create / role change / ban response
    pub user_mutation: Remote<Option<Value>>,
}

impl Default for AdminState {
    fn default() -> Self {
        Self {
            stats: Remote::new(FailurePolicy::KeepStale),
            booking_stats: Remote::new(FailurePolicy::KeepStale),
            customer_analytics: Remote::new(FailurePolicy::KeepStale),
            revenue_report: Remote::new(FailurePolicy::KeepStale),
            users: Remote::new(FailurePolicy::Reset),
            user_detail: Remote::new(FailurePolicy::KeepStale),
            user_mutation: Remote::new(FailurePolicy::KeepStale),
        }
    }
}

impl AdminState {
    /// Error messages of every admin slice, in display order
    pub fn errors(&self) -> Vec<&str> {
        [
            &self.stats.error,
            &self.booking_stats.error,
            &self.customer_analytics.error,
            &self.revenue_report.error,
            &self.users.error,
            &self.user_detail.error,
            &self.user_mutation.error,
        ]
        .into_iter()
        .filter_map(|e| e.as_deref())
        .collect()
    }
}
