use std::sync::Arc;

use serde_json::{json, Value};

use crate::error::ApiError;
use crate::http::query::path_segment;
use crate::http::{HttpClient, Query};
use crate::types::{CreateUserRequest, RevenueQuery, UserFilter};

pub const INVALID_REPORT_MESSAGE: &str = "Invalid report type or missing parameters";

#[derive(Clone)]
pub struct AdminApi {
    http: Arc<HttpClient>,
}

impl AdminApi {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// `GET /admin/dashboard/stats`
    pub async fn stats(&self) -> Result<Value, ApiError> {
        self.http.get("/admin/dashboard/stats", &Query::new()).await
    }

    /// `GET /admin/reports/bookings/statistics`
    pub async fn booking_statistics(
        &self,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Value, ApiError> {
        let mut query = Query::new();
        query
            .push_str("StartDate", start_date)
            .push_str("EndDate", end_date);
        self.http
            .get("/admin/reports/bookings/statistics", &query)
            .await
    }

    /// `GET /admin/reports/customers/analytics`
    pub async fn customer_analytics(
        &self,
        period: Option<&str>,
        top_customers_limit: u32,
    ) -> Result<Value, ApiError> {
        let mut query = Query::new();
        query
            .push_str("Period", period)
            .push_opt("TopCustomersLimit", Some(top_customers_limit).filter(|l| *l > 0));
        self.http
            .get("/admin/reports/customers/analytics", &query)
            .await
    }

    /// `GET /admin/reports/revenue/{daily|monthly}`
    ///
    /// Fails without a request when the report's parameters are missing.
    pub async fn revenue_report(&self, report: &RevenueQuery) -> Result<Value, ApiError> {
        let (path, query) = revenue_request(report)?;
        self.http.get(path, &query).await
    }

    /// `GET /admin/users`
    pub async fn list_users(&self, filter: &UserFilter) -> Result<Value, ApiError> {
        self.http.get("/admin/users", &users_query(filter)).await
    }

    /// `POST /admin/users`
    pub async fn create_user(&self, request: &CreateUserRequest) -> Result<Value, ApiError> {
        let body = serde_json::to_value(request).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.http.post("/admin/users", Some(body)).await
    }

    /// `GET /admin/users/{id}`
    pub async fn get_user(&self, user_id: &str) -> Result<Value, ApiError> {
        self.http
            .get(&format!("/admin/users/{}", path_segment(user_id)), &Query::new())
            .await
    }

    /// `PUT /admin/users/{id}/role`
    pub async fn update_user_role(&self, user_id: &str, new_role: &str) -> Result<Value, ApiError> {
        self.http
            .put(
                &format!("/admin/users/{}/role", path_segment(user_id)),
                Some(json!({ "newRole": new_role })),
            )
            .await
    }

    /// `PUT /admin/users/{id}/ban`; `is_active = false` bans the user
    pub async fn set_user_active(&self, user_id: &str, is_active: bool) -> Result<Value, ApiError> {
        self.http
            .put(
                &format!("/admin/users/{}/ban", path_segment(user_id)),
                Some(json!({ "isActive": is_active })),
            )
            .await
    }
}

fn revenue_request(report: &RevenueQuery) -> Result<(&'static str, Query), ApiError> {
    let mut query = Query::new();
    match report {
        RevenueQuery::Daily { date: Some(date) } if !date.is_empty() => {
            query.push("Date", date);
            Ok(("/admin/reports/revenue/daily", query))
        }
        RevenueQuery::Monthly {
            month: Some(month),
            year: Some(year),
        } if *month > 0 && *year != 0 => {
            query.push("Month", month).push("Year", year);
            Ok(("/admin/reports/revenue/monthly", query))
        }
        _ => Err(ApiError::InvalidRequest(INVALID_REPORT_MESSAGE.to_string())),
    }
}

fn users_query(filter: &UserFilter) -> Query {
    let mut query = Query::new();
    query
        .push_str("Role", filter.role.as_deref())
        .push_str("Status", filter.status.as_deref())
        .push_str("Search", filter.search.as_deref())
        .push("Page", filter.page)
        .push("PageSize", filter.page_size);
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_users_query_omits_empty_search() {
        let filter = UserFilter {
            role: Some("Staff".to_string()),
            status: Some("true".to_string()),
            search: Some(String::new()),
            page: 2,
            page_size: 10,
        };
        assert_eq!(
            users_query(&filter).encode(),
            "Role=Staff&Status=true&Page=2&PageSize=10"
        );
    }

    #[test]
    fn test_revenue_daily_requires_date() {
        let (path, query) = revenue_request(&RevenueQuery::Daily {
            date: Some("2025-01-31".to_string()),
        })
        .unwrap();
        assert_eq!(path, "/admin/reports/revenue/daily");
        assert_eq!(query.encode(), "Date=2025-01-31");

        let err = revenue_request(&RevenueQuery::Daily { date: None }).unwrap_err();
        assert_eq!(err.to_string(), INVALID_REPORT_MESSAGE);
    }

    #[test]
    fn test_revenue_monthly_requires_month_and_year() {
        let (path, query) = revenue_request(&RevenueQuery::Monthly {
            month: Some(1),
            year: Some(2025),
        })
        .unwrap();
        assert_eq!(path, "/admin/reports/revenue/monthly");
        assert_eq!(query.encode(), "Month=1&Year=2025");

        assert!(revenue_request(&RevenueQuery::Monthly {
            month: Some(1),
            year: None
        })
        .is_err());
        assert!(revenue_request(&RevenueQuery::Monthly {
            month: Some(0),
            year: Some(2025)
        })
        .is_err());
    }
}
