//! Admin dashboard orchestration

use serde_json::Value;

use super::{decode, Context, Operation, Outcome};
use crate::api::AdminApi;
use crate::dates;
use crate::normalize::ResponseShape;
use crate::store::Action;
use crate::types::{
    AdminUser, BookingStatistics, CreateUserRequest, CustomerAnalytics, DashboardStats,
    RevenueQuery, RevenueReport, UserFilter, UserPage,
};

pub const REQUIRED_FIELDS_MESSAGE: &str = "Please fill in all required fields!";
pub const SELECT_ROLE_MESSAGE: &str = "Please select a role!";

/// Parameters for loading the whole dashboard at once
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub customer_period: String,
    pub top_customers_limit: u32,
    pub revenue: RevenueQuery,
}

impl Default for DashboardQuery {
    /// Month to date, monthly customer view, today's revenue
    fn default() -> Self {
        Self {
            start_date: Some(dates::first_of_month()),
            end_date: Some(dates::today()),
            customer_period: "month".to_string(),
            top_customers_limit: 5,
            revenue: RevenueQuery::Daily {
                date: Some(dates::today()),
            },
        }
    }
}

/// Results of [`AdminService::load_dashboard`]
#[derive(Debug, Clone)]
pub struct DashboardOutcome {
    pub stats: Outcome<DashboardStats>,
    pub booking_stats: Outcome<BookingStatistics>,
    pub customer_analytics: Outcome<CustomerAnalytics>,
    pub revenue_report: Outcome<RevenueReport>,
}

impl DashboardOutcome {
    pub fn all_succeeded(&self) -> bool {
        self.stats.success
            && self.booking_stats.success
            && self.customer_analytics.success
            && self.revenue_report.success
    }
}

pub struct AdminService {
    context: Context,
    api: AdminApi,
}

impl AdminService {
    pub(crate) fn new(context: Context, api: AdminApi) -> Self {
        Self { context, api }
    }

    pub async fn fetch_stats(&self) -> Outcome<DashboardStats> {
        let fallback = "Failed to fetch admin stats";
        let op = Operation::new(
            "fetch_admin_stats",
            Action::FetchAdminStats,
            ResponseShape::ADMIN_STATS,
            fallback,
        );
        self.context
            .run(op, self.api.stats(), |payload| decode(payload, fallback))
            .await
    }

    pub async fn fetch_booking_stats(
        &self,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Outcome<BookingStatistics> {
        let fallback = "Failed to fetch booking stats";
        let op = Operation::new(
            "fetch_booking_stats",
            Action::FetchBookingStats,
            ResponseShape::BOOKING_STATS,
            fallback,
        );
        self.context
            .run(
                op,
                self.api.booking_statistics(start_date, end_date),
                |payload| decode(payload, fallback),
            )
            .await
    }

    pub async fn fetch_customer_analytics(
        &self,
        period: Option<&str>,
        top_customers_limit: u32,
    ) -> Outcome<CustomerAnalytics> {
        let fallback = "Failed to fetch customer analytics";
        let op = Operation::new(
            "fetch_customer_analytics",
            Action::FetchCustomerAnalytics,
            ResponseShape::CUSTOMER_ANALYTICS,
            fallback,
        );
        self.context
            .run(
                op,
                self.api.customer_analytics(period, top_customers_limit),
                |payload| decode(payload, fallback),
            )
            .await
    }

    /// Daily or monthly revenue; missing parameters fail without a request
    pub async fn fetch_revenue_report(&self, report: &RevenueQuery) -> Outcome<RevenueReport> {
        let fallback = "Failed to fetch revenue report";
        let op = Operation::new(
            "fetch_revenue_report",
            Action::FetchRevenueReport,
            ResponseShape::REVENUE_REPORT,
            fallback,
        );
        self.context
            .run(op, self.api.revenue_report(report), |payload| {
                decode(payload, fallback)
            })
            .await
    }

    pub async fn fetch_users(&self, filter: &UserFilter) -> Outcome<UserPage> {
        let fallback = "Failed to fetch users";
        let op = Operation::new(
            "fetch_users",
            Action::FetchUsers,
            ResponseShape::USER_LIST,
            fallback,
        );
        self.context
            .run(op, self.api.list_users(filter), |payload| {
                decode(payload, fallback)
            })
            .await
    }

    pub async fn fetch_user_detail(&self, user_id: &str) -> Outcome<AdminUser> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Outcome::failed("User ID is required");
        }

        let fallback = "Failed to fetch user detail";
        let op = Operation::new(
            "fetch_user_detail",
            Action::FetchUserDetail,
            ResponseShape::USER_DETAIL,
            fallback,
        );
        self.context
            .run(op, self.api.get_user(user_id), |payload| {
                decode(payload, fallback)
            })
            .await
    }

    pub async fn create_user(&self, request: &CreateUserRequest) -> Outcome<Value> {
        if request.missing_required() {
            return Outcome::failed(REQUIRED_FIELDS_MESSAGE);
        }

        let op = Operation::new(
            "create_user",
            Action::CreateUser,
            ResponseShape::USER_MUTATION,
            "Failed to create user",
        )
        .success_message("User created successfully");
        self.context
            .run(op, self.api.create_user(request), Ok)
            .await
    }

    pub async fn update_user_role(&self, user_id: &str, new_role: &str) -> Outcome<Value> {
        if new_role.trim().is_empty() {
            return Outcome::failed(SELECT_ROLE_MESSAGE);
        }
        if user_id.trim().is_empty() {
            return Outcome::failed("User ID is required");
        }

        let op = Operation::new(
            "update_user_role",
            Action::UpdateUserRole,
            ResponseShape::USER_MUTATION,
            "Failed to update user role",
        )
        .success_message("User role updated successfully");
        self.context
            .run(op, self.api.update_user_role(user_id.trim(), new_role), Ok)
            .await
    }

    /// Ban (`is_active = false`) or unban a user
    pub async fn set_user_status(&self, user_id: &str, is_active: bool) -> Outcome<Value> {
        if user_id.trim().is_empty() {
            return Outcome::failed("User ID is required");
        }

        let op = Operation::new(
            "toggle_user_status",
            Action::ToggleUserStatus,
            ResponseShape::USER_MUTATION,
            "Failed to update user status",
        )
        .success_message("User status updated successfully");
        self.context
            .run(op, self.api.set_user_active(user_id.trim(), is_active), Ok)
            .await
    }

    /// Fetch the four dashboard panels concurrently
    ///
    /// Each panel settles into its own slice; one failing leaves the others
    /// untouched.
    pub async fn load_dashboard(&self, query: &DashboardQuery) -> DashboardOutcome {
        let (stats, booking_stats, customer_analytics, revenue_report) = futures::join!(
            self.fetch_stats(),
            self.fetch_booking_stats(query.start_date.as_deref(), query.end_date.as_deref()),
            self.fetch_customer_analytics(
                Some(query.customer_period.as_str()),
                query.top_customers_limit
            ),
            self.fetch_revenue_report(&query.revenue),
        );

        DashboardOutcome {
            stats,
            booking_stats,
            customer_analytics,
            revenue_report,
        }
    }

    pub fn clear_errors(&self) {
        self.context.store.dispatch(Action::ClearAdminErrors);
    }
}
