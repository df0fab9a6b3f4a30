//! Staff booking orchestration

use serde::Deserialize;

use super::{decode, Context, Operation, Outcome};
use crate::api::BookingsApi;
use crate::dates;
use crate::normalize::ResponseShape;
use crate::store::Action;
use crate::types::{
    Booking, BookingFilter, BookingList, CheckInReceipt, CheckInRequest, Pagination,
    VerifiedBooking,
};

/// Optional overrides for a check-in
#[derive(Debug, Clone, Default)]
pub struct CheckInOptions {
    /// Defaults to the current cinema-local time
    pub check_in_time: Option<String>,
    pub notes: Option<String>,
}

impl CheckInOptions {
    pub fn into_request(self) -> CheckInRequest {
        CheckInRequest {
            check_in_time: self
                .check_in_time
                .filter(|t| !t.is_empty())
                .unwrap_or_else(dates::current_vietnam_time),
            notes: self.notes.unwrap_or_default(),
        }
    }
}

/// `GET /Bookings/today` page as the backend sends it
#[derive(Debug, Deserialize)]
struct BookingPage {
    #[serde(default)]
    items: Vec<Booking>,
    #[serde(flatten)]
    pagination: Pagination,
}

pub struct BookingsService {
    context: Context,
    api: BookingsApi,
}

impl BookingsService {
    pub(crate) fn new(context: Context, api: BookingsApi) -> Self {
        Self { context, api }
    }

    pub async fn fetch_today(&self, filter: &BookingFilter) -> Outcome<BookingList> {
        let fallback = "Failed to fetch bookings";
        let op = Operation::new(
            "fetch_bookings",
            Action::FetchBookings,
            ResponseShape::BOOKING_LIST,
            fallback,
        )
        .invalid_shape("Failed to fetch bookings - Invalid response structure");

        self.context
            .run(op, self.api.list_today(filter), |payload| {
                let page: BookingPage = decode(payload, fallback)?;
                Ok(BookingList {
                    bookings: page.items,
                    pagination: Some(page.pagination),
                })
            })
            .await
    }

    /// Check a booking in; only the matching booking is patched in state
    pub async fn check_in(&self, booking_id: &str, options: CheckInOptions) -> Outcome<CheckInReceipt> {
        let booking_id = booking_id.trim();
        if booking_id.is_empty() {
            return Outcome::failed("Booking ID is required");
        }

        let request = options.into_request();
        let op = Operation::new(
            "check_in",
            Action::CheckIn,
            ResponseShape::CHECK_IN,
            "Check-in failed",
        );

        self.context
            .run(op, self.api.check_in(booking_id, &request), |payload| {
                Ok(CheckInReceipt {
                    booking_id: booking_id.to_string(),
                    data: payload,
                })
            })
            .await
    }

    /// Look a booking up by its code
    pub async fn verify(&self, booking_code: &str) -> Outcome<VerifiedBooking> {
        let booking_code = booking_code.trim();
        if booking_code.is_empty() {
            return Outcome::failed("Please enter a booking code");
        }

        let fallback = "Verification failed";
        let op = Operation::new(
            "verify_booking",
            Action::VerifyBooking,
            ResponseShape::VERIFY,
            fallback,
        );

        self.context
            .run(op, self.api.verify(booking_code), |payload| {
                decode::<VerifiedBooking>(payload, fallback)
            })
            .await
    }

    pub fn clear_error(&self) {
        self.context.store.dispatch(Action::ClearBookingsError);
    }

    /// Drop the verified booking, e.g. when leaving the verify tab
    pub fn clear_verified(&self) {
        self.context.store.dispatch(Action::ClearVerifiedBooking);
    }
}
