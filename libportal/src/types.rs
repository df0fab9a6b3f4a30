//! Core types for the cinema portal
//!
//! Backend payloads are camelCase JSON and not always consistent about
//! casing or numeric encoding. Everything here deserializes leniently
//! (missing fields default) so one odd field does not fail a whole slice.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Roles and users
// ============================================================================

/// Portal role, as reported by the backend in `roleName`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Staff,
    Customer,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "Admin",
            Role::Staff => "Staff",
            Role::Customer => "Customer",
            Role::Other(name) => name,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Admin" => Role::Admin,
            "Staff" => Role::Staff,
            "Customer" => Role::Customer,
            _ => Role::Other(value),
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Role::from(value.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical signed-in user
///
/// Built from backend JSON with [`User::from_value`], which accepts both
/// `fullName`/`fullname`, `id`/`userId` and `roleName`/`role`. The serde
/// derive is only used for our own persisted copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role_name: Option<Role>,
    #[serde(default)]
    pub cinema_id: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl User {
    /// Normalize a backend user object
    ///
    /// Returns `None` when `value` is not an object. A missing role is kept
    /// as `None` so the caller can decide how to reject it.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            id: first_string(obj, &["id", "userId"]).unwrap_or_default(),
            full_name: first_string(obj, &["fullName", "fullname"]).unwrap_or_default(),
            email: first_string(obj, &["email"]),
            role_name: first_string(obj, &["roleName", "role"])
                .filter(|r| !r.is_empty())
                .map(Role::from),
            cinema_id: first_string(obj, &["cinemaId"]),
            phone: first_string(obj, &["phone", "phoneNumber"]),
        })
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.role_name.as_ref() == Some(role)
    }
}

/// Authenticated session: what gets persisted and rehydrated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub refresh_token: Option<String>,
    pub user: User,
}

/// Login form input
#[derive(Debug)]
pub struct LoginCredentials {
    pub email: String,
    pub password: SecretString,
}

impl LoginCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// Request body for `POST /Auth/login`
    pub fn to_body(&self) -> Value {
        serde_json::json!({
            "email": self.email,
            "password": self.password.expose_secret(),
        })
    }
}

// ============================================================================
// Pagination
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    pub current_page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            current_page: 1,
            page_size: 10,
            total_pages: 0,
            total_items: 0,
            has_next_page: false,
            has_previous_page: false,
        }
    }
}

// ============================================================================
// Bookings (staff)
// ============================================================================

/// One row of today's bookings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Booking {
    #[serde(deserialize_with = "de::opt_string_or_number")]
    pub id: Option<String>,
    #[serde(deserialize_with = "de::opt_string_or_number")]
    pub booking_id: Option<String>,
    pub booking_code: String,
    pub customer_name: Option<String>,
    pub movie_title: Option<String>,
    pub showtime_start: Option<String>,
    pub status: Option<String>,
    pub payment_status: Option<String>,
    pub can_check_in: bool,
    /// Set locally once a check-in for this booking succeeded
    pub checked_in: bool,
}

impl Booking {
    /// Whether `key` names this booking by id or by code
    pub fn matches(&self, key: &str) -> bool {
        self.id.as_deref() == Some(key)
            || self.booking_id.as_deref() == Some(key)
            || self.booking_code == key
    }

    pub fn mark_checked_in(&mut self) {
        self.checked_in = true;
        self.can_check_in = false;
    }
}

/// Bookings slice payload
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BookingList {
    pub bookings: Vec<Booking>,
    pub pagination: Option<Pagination>,
}

/// Filters for `GET /Bookings/today`
#[derive(Debug, Clone, PartialEq)]
pub struct BookingFilter {
    pub cinema_id: Option<String>,
    pub page: u32,
    pub page_size: u32,
    pub status: Option<String>,
    pub has_payment: Option<bool>,
}

impl Default for BookingFilter {
    fn default() -> Self {
        Self {
            cinema_id: None,
            page: 1,
            page_size: 10,
            status: None,
            has_payment: None,
        }
    }
}

/// Body for `PUT /Bookings/{id}/check-in`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    pub check_in_time: String,
    pub notes: String,
}

/// Result of a successful check-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInReceipt {
    pub booking_id: String,
    /// Whatever the backend returned alongside the confirmation
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifiedBooking {
    #[serde(deserialize_with = "de::opt_string_or_number")]
    pub id: Option<String>,
    #[serde(deserialize_with = "de::opt_string_or_number")]
    pub booking_id: Option<String>,
    pub booking_code: String,
    pub booking_status: Option<String>,
    pub status: Option<String>,
    pub booking_date: Option<String>,
    pub can_check_in: bool,
    pub movie: Option<MovieInfo>,
    pub showtime: Option<ShowtimeInfo>,
    pub pricing: Option<Pricing>,
    pub payment: Option<PaymentInfo>,
    pub check_in: Option<CheckInInfo>,
}

impl VerifiedBooking {
    pub fn matches(&self, key: &str) -> bool {
        self.id.as_deref() == Some(key)
            || self.booking_id.as_deref() == Some(key)
            || self.booking_code == key
    }

    /// Id to send to the check-in endpoint
    pub fn check_in_key(&self) -> &str {
        self.booking_id
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or(&self.booking_code)
    }

    pub fn is_checked_in(&self) -> bool {
        self.check_in.as_ref().map(|c| c.is_checked_in).unwrap_or(false)
    }

    pub fn mark_checked_in(&mut self) {
        self.can_check_in = false;
        self.check_in.get_or_insert_with(CheckInInfo::default).is_checked_in = true;
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MovieInfo {
    pub title: String,
    pub duration_minutes: Option<u32>,
    pub rating: Option<String>,
    pub poster_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShowtimeInfo {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub format: Option<String>,
    pub language: Option<String>,
    pub cinema: Option<CinemaInfo>,
    pub auditorium: Option<AuditoriumInfo>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CinemaInfo {
    pub name: String,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuditoriumInfo {
    pub name: String,
    pub total_seats: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pricing {
    pub number_of_tickets: u32,
    pub ticket_price: f64,
    pub subtotal: f64,
    pub discount: f64,
    pub total_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentInfo {
    pub payment_method: Option<String>,
    pub status: Option<String>,
    pub transaction_code: Option<String>,
    pub paid_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckInInfo {
    pub is_checked_in: bool,
    pub checked_in_time: Option<String>,
    #[serde(deserialize_with = "de::opt_string_or_number")]
    pub checked_in_by: Option<String>,
    pub checked_in_by_staff_name: Option<String>,
}

// ============================================================================
// Admin dashboard
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub today_revenue: f64,
    pub today_bookings: u64,
    pub active_movies: u64,
    pub active_customers: u64,
    pub popular_movies: Vec<PopularMovie>,
    pub upcoming_showtimes: Vec<UpcomingShowtime>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PopularMovie {
    #[serde(deserialize_with = "de::opt_string_or_number")]
    pub movie_id: Option<String>,
    pub title: Option<String>,
    pub movie_title: Option<String>,
    pub poster_url: Option<String>,
    pub total_bookings: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpcomingShowtime {
    #[serde(deserialize_with = "de::opt_string_or_number")]
    pub showtime_id: Option<String>,
    pub movie_title: String,
    pub movie_poster_url: Option<String>,
    pub cinema_name: Option<String>,
    pub auditorium_name: Option<String>,
    pub start_time: Option<String>,
    pub format: Option<String>,
    pub price: f64,
    pub available_seats: u32,
    pub total_seats: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingStatistics {
    pub total_bookings: u64,
    pub completed_bookings: u64,
    pub canceled_bookings: u64,
    pub checked_in_bookings: u64,
    #[serde(deserialize_with = "de::string_or_number")]
    pub cancellation_rate: String,
    #[serde(deserialize_with = "de::string_or_number")]
    pub check_in_rate: String,
    pub average_booking_value: f64,
    pub peak_hours: Vec<Value>,
    pub peak_days: Vec<Value>,
    #[serde(deserialize_with = "de::string_or_number")]
    pub conversion_rate: String,
}

impl Default for BookingStatistics {
    fn default() -> Self {
        Self {
            total_bookings: 0,
            completed_bookings: 0,
            canceled_bookings: 0,
            checked_in_bookings: 0,
            cancellation_rate: "0%".to_string(),
            check_in_rate: "0%".to_string(),
            average_booking_value: 0.0,
            peak_hours: Vec::new(),
            peak_days: Vec::new(),
            conversion_rate: "0%".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerAnalytics {
    pub total_customers: u64,
    pub new_customers: u64,
    pub active_customers: u64,
    #[serde(deserialize_with = "de::string_or_number")]
    pub retention_rate: String,
    #[serde(deserialize_with = "de::string_or_number")]
    pub churn_rate: String,
    pub average_lifetime_value: f64,
    pub top_customers: Vec<TopCustomer>,
    pub demographics: Demographics,
}

impl Default for CustomerAnalytics {
    fn default() -> Self {
        Self {
            total_customers: 0,
            new_customers: 0,
            active_customers: 0,
            retention_rate: "0%".to_string(),
            churn_rate: "0%".to_string(),
            average_lifetime_value: 0.0,
            top_customers: Vec::new(),
            demographics: Demographics::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopCustomer {
    #[serde(deserialize_with = "de::opt_string_or_number")]
    pub customer_id: Option<String>,
    #[serde(alias = "fullName")]
    pub fullname: String,
    pub email: Option<String>,
    pub total_bookings: u64,
    pub total_spent: f64,
    pub member_since: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Demographics {
    pub age: Map<String, Value>,
    pub gender: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RevenueReport {
    pub period: String,
    pub total_revenue: f64,
    pub total_bookings: u64,
    pub average_ticket_price: f64,
    pub breakdown: RevenueBreakdown,
    pub by_movie: Vec<Value>,
    pub by_cinema: Vec<Value>,
    pub by_hour: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RevenueBreakdown {
    pub ticket_sales: f64,
    pub concessions: f64,
}

/// Which revenue report to fetch
#[derive(Debug, Clone, PartialEq)]
pub enum RevenueQuery {
    /// `Date` as `YYYY-MM-DD`
    Daily { date: Option<String> },
    Monthly { month: Option<u32>, year: Option<i32> },
}

/// Row of the admin user list
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminUser {
    #[serde(deserialize_with = "de::string_or_number")]
    pub user_id: String,
    #[serde(alias = "fullName")]
    pub fullname: String,
    pub email: String,
    pub role: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub registered_at: Option<String>,
}

/// Users slice payload
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPage {
    pub items: Vec<AdminUser>,
    #[serde(flatten)]
    pub pagination: Pagination,
}

/// Filters for `GET /admin/users`
#[derive(Debug, Clone, PartialEq)]
pub struct UserFilter {
    pub role: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for UserFilter {
    fn default() -> Self {
        Self {
            role: None,
            status: None,
            search: None,
            page: 1,
            page_size: 10,
        }
    }
}

/// Body for `POST /admin/users`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub fullname: String,
    pub role: String,
    #[serde(default)]
    pub phone: String,
}

impl CreateUserRequest {
    /// Email, password, full name and role are required
    pub fn missing_required(&self) -> bool {
        [&self.email, &self.password, &self.fullname, &self.role]
            .iter()
            .any(|v| v.trim().is_empty())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn first_string(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Lenient deserializers for ids and rates that arrive as either strings or
/// numbers
mod de {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(opt_string_or_number(deserializer)?.unwrap_or_default())
    }

    pub fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }
}
