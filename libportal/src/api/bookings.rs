use std::sync::Arc;

use serde_json::Value;

use crate::error::ApiError;
use crate::http::query::path_segment;
use crate::http::{HttpClient, Query};
use crate::types::{BookingFilter, CheckInRequest};

#[derive(Clone)]
pub struct BookingsApi {
    http: Arc<HttpClient>,
}

impl BookingsApi {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// `GET /Bookings/today`
    pub async fn list_today(&self, filter: &BookingFilter) -> Result<Value, ApiError> {
        self.http.get("/Bookings/today", &today_query(filter)).await
    }

    /// `PUT /Bookings/{id}/check-in`
    pub async fn check_in(&self, booking_id: &str, request: &CheckInRequest) -> Result<Value, ApiError> {
        let body = serde_json::to_value(request).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.http
            .put(
                &format!("/Bookings/{}/check-in", path_segment(booking_id)),
                Some(body),
            )
            .await
    }

    /// `GET /Bookings/verify/{code}`
    pub async fn verify(&self, booking_code: &str) -> Result<Value, ApiError> {
        self.http
            .get(
                &format!("/Bookings/verify/{}", path_segment(booking_code)),
                &Query::new(),
            )
            .await
    }
}

fn today_query(filter: &BookingFilter) -> Query {
    let mut query = Query::new();
    query
        .push_str("CinemaId", filter.cinema_id.as_deref())
        .push("Page", filter.page)
        .push("PageSize", filter.page_size)
        .push_str("Status", filter.status.as_deref())
        .push_opt("HasPayment", filter.has_payment);
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_sends_paging_only() {
        assert_eq!(today_query(&BookingFilter::default()).encode(), "Page=1&PageSize=10");
    }

    #[test]
    fn test_full_filter() {
        let filter = BookingFilter {
            cinema_id: Some("3".to_string()),
            page: 2,
            page_size: 20,
            status: Some("Confirmed".to_string()),
            has_payment: Some(false),
        };
        assert_eq!(
            today_query(&filter).encode(),
            "CinemaId=3&Page=2&PageSize=20&Status=Confirmed&HasPayment=false"
        );
    }
}
