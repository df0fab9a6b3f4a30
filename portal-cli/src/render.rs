//! Text rendering for `--format text`

use libportal::dates::{format_vietnam_date, format_vietnam_time, format_vietnam_time_only};
use libportal::types::{
    AdminUser, BookingList, BookingStatistics, CustomerAnalytics, DashboardStats, Pagination,
    RevenueReport, UserPage, VerifiedBooking,
};
use libportal::User;

/// Format an amount in dong with `.` as the thousands separator
pub fn currency(amount: f64) -> String {
    let whole = amount.round() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    let sign = if whole < 0 { "-" } else { "" };
    format!("{}{} ₫", sign, grouped)
}

/// Truncate to `max_len` characters with an ellipsis
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_len).collect();
        format!("{}...", cut)
    }
}

pub fn user_label(user: &User) -> String {
    match &user.role_name {
        Some(role) => format!("{} ({})", user.full_name, role),
        None => user.full_name.clone(),
    }
}

pub fn user(user: &User) {
    println!("{}", user_label(user));
    println!("  id:     {}", user.id);
    if let Some(email) = &user.email {
        println!("  email:  {}", email);
    }
    if let Some(cinema) = &user.cinema_id {
        println!("  cinema: {}", cinema);
    }
}

fn pagination(page: &Pagination, noun: &str) {
    println!(
        "Page {}/{} ({} {})",
        page.current_page,
        page.total_pages.max(1),
        page.total_items,
        noun
    );
}

pub fn bookings(list: &BookingList) {
    if list.bookings.is_empty() {
        println!("No bookings today");
        return;
    }

    for booking in &list.bookings {
        let state = if booking.checked_in {
            "checked in"
        } else if booking.can_check_in {
            "ready"
        } else {
            "-"
        };
        println!(
            "{} | {} | {} | {} | {} | {}",
            booking.booking_code,
            booking.customer_name.as_deref().unwrap_or("N/A"),
            truncate(booking.movie_title.as_deref().unwrap_or("N/A"), 30),
            format_vietnam_time_only(booking.showtime_start.as_deref()),
            booking.status.as_deref().unwrap_or("-"),
            state
        );
    }

    if let Some(page) = &list.pagination {
        pagination(page, "bookings");
    }
}

pub fn verified_booking(booking: &VerifiedBooking) {
    println!("Booking {}", booking.booking_code);
    println!("  id:       {}", booking.check_in_key());
    if let Some(status) = booking.booking_status.as_deref().or(booking.status.as_deref()) {
        println!("  status:   {}", status);
    }

    if let Some(movie) = &booking.movie {
        match movie.duration_minutes {
            Some(minutes) => println!("  movie:    {} ({} min)", movie.title, minutes),
            None => println!("  movie:    {}", movie.title),
        }
    }

    if let Some(showtime) = &booking.showtime {
        println!(
            "  showtime: {} {}",
            format_vietnam_date(showtime.start_time.as_deref()),
            format_vietnam_time_only(showtime.start_time.as_deref())
        );
        if let Some(cinema) = &showtime.cinema {
            let hall = showtime
                .auditorium
                .as_ref()
                .map(|a| format!(", {}", a.name))
                .unwrap_or_default();
            println!("  cinema:   {}{}", cinema.name, hall);
        }
    }

    if let Some(pricing) = &booking.pricing {
        println!(
            "  tickets:  {} x {} = {}",
            pricing.number_of_tickets,
            currency(pricing.ticket_price),
            currency(pricing.total_amount)
        );
    }

    if let Some(payment) = &booking.payment {
        println!(
            "  payment:  {} {}",
            payment.payment_method.as_deref().unwrap_or("-"),
            payment.status.as_deref().unwrap_or("-")
        );
    }

    match &booking.check_in {
        Some(check_in) if check_in.is_checked_in => println!(
            "  check-in: done at {} by {}",
            format_vietnam_time(check_in.checked_in_time.as_deref()),
            check_in
                .checked_in_by_staff_name
                .as_deref()
                .or(check_in.checked_in_by.as_deref())
                .unwrap_or("N/A")
        ),
        _ if booking.can_check_in => println!("  check-in: ready"),
        _ => println!("  check-in: not allowed"),
    }
}

pub fn dashboard_stats(stats: &DashboardStats) {
    println!("Today's revenue:  {}", currency(stats.today_revenue));
    println!("Today's bookings: {}", stats.today_bookings);
    println!("Active movies:    {}", stats.active_movies);
    println!("Active customers: {}", stats.active_customers);

    if !stats.popular_movies.is_empty() {
        println!();
        println!("Popular movies:");
        for movie in &stats.popular_movies {
            let title = movie
                .title
                .as_deref()
                .or(movie.movie_title.as_deref())
                .unwrap_or("N/A");
            println!(
                "  {} | {} bookings | {}",
                truncate(title, 40),
                movie.total_bookings,
                currency(movie.revenue)
            );
        }
    }

    if !stats.upcoming_showtimes.is_empty() {
        println!();
        println!("Upcoming showtimes:");
        for showtime in &stats.upcoming_showtimes {
            println!(
                "  {} | {} | {} | {}/{} seats",
                format_vietnam_time_only(showtime.start_time.as_deref()),
                truncate(&showtime.movie_title, 40),
                showtime.cinema_name.as_deref().unwrap_or("-"),
                showtime.available_seats,
                showtime.total_seats
            );
        }
    }
}

pub fn booking_statistics(stats: &BookingStatistics) {
    println!("Total bookings:     {}", stats.total_bookings);
    println!("Completed:          {}", stats.completed_bookings);
    println!("Canceled:           {}", stats.canceled_bookings);
    println!("Checked in:         {}", stats.checked_in_bookings);
    println!("Cancellation rate:  {}", stats.cancellation_rate);
    println!("Check-in rate:      {}", stats.check_in_rate);
    println!("Conversion rate:    {}", stats.conversion_rate);
    println!("Avg booking value:  {}", currency(stats.average_booking_value));
}

pub fn customer_analytics(analytics: &CustomerAnalytics) {
    println!("Total customers:  {}", analytics.total_customers);
    println!("New customers:    {}", analytics.new_customers);
    println!("Active customers: {}", analytics.active_customers);
    println!("Retention rate:   {}", analytics.retention_rate);
    println!("Churn rate:       {}", analytics.churn_rate);
    println!("Avg lifetime:     {}", currency(analytics.average_lifetime_value));

    if !analytics.top_customers.is_empty() {
        println!();
        println!("Top customers:");
        for (rank, customer) in analytics.top_customers.iter().enumerate() {
            println!(
                "  {}. {} | {} bookings | {}",
                rank + 1,
                customer.fullname,
                customer.total_bookings,
                currency(customer.total_spent)
            );
        }
    }
}

pub fn revenue_report(report: &RevenueReport) {
    if !report.period.is_empty() {
        println!("Period:          {}", report.period);
    }
    println!("Total revenue:   {}", currency(report.total_revenue));
    println!("Total bookings:  {}", report.total_bookings);
    println!("Avg ticket:      {}", currency(report.average_ticket_price));
    println!("Ticket sales:    {}", currency(report.breakdown.ticket_sales));
    println!("Concessions:     {}", currency(report.breakdown.concessions));
}

pub fn users(page: &UserPage) {
    if page.items.is_empty() {
        println!("No users found");
        return;
    }

    for user in &page.items {
        println!(
            "{} | {} | {} | {} | {}",
            user.user_id,
            truncate(&user.fullname, 30),
            user.email,
            user.role.as_deref().unwrap_or("-"),
            if user.is_active { "active" } else { "banned" }
        );
    }
    pagination(&page.pagination, "users");
}

pub fn admin_user(user: &AdminUser) {
    println!("{} ({})", user.fullname, user.role.as_deref().unwrap_or("no role"));
    println!("  id:         {}", user.user_id);
    println!("  email:      {}", user.email);
    if let Some(phone) = user.phone.as_deref().filter(|p| !p.is_empty()) {
        println!("  phone:      {}", phone);
    }
    println!("  status:     {}", if user.is_active { "active" } else { "banned" });
    println!("  verified:   {}", if user.is_verified { "yes" } else { "no" });
    println!("  registered: {}", format_vietnam_time(user.registered_at.as_deref()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_groups_thousands() {
        assert_eq!(currency(1_500_000.0), "1.500.000 ₫");
        assert_eq!(currency(90_000.0), "90.000 ₫");
        assert_eq!(currency(0.0), "0 ₫");
        assert_eq!(currency(-2500.0), "-2.500 ₫");
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("Mai", 10), "Mai");
        assert_eq!(truncate("Lật Mặt 7: Một Điều Ước", 7), "Lật Mặt...");
    }
}
