//! cinema-portal - Staff and admin console for the cinema booking system

mod render;

use std::io::BufRead;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use libportal::events::EventReceiver;
use libportal::logging::LoggingConfig;
use libportal::routes::{guard, RouteDecision};
use libportal::service::admin::{REQUIRED_FIELDS_MESSAGE, SELECT_ROLE_MESSAGE};
use libportal::service::bookings::CheckInOptions;
use libportal::types::{BookingFilter, CreateUserRequest, LoginCredentials, RevenueQuery, UserFilter};
use libportal::{dates, Config, Event, Outcome, PortalError, PortalService, Route};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "cinema-portal")]
#[command(version)]
#[command(about = "Staff and admin console for the cinema booking system")]
#[command(long_about = "\
cinema-portal - Staff and admin console for the cinema booking system

DESCRIPTION:
    Sign in once with `login`; the session is stored locally and reused by
    every later command until `logout` or until the backend rejects it.
    Staff commands (bookings, check-in, verify) need the Staff role, admin
    commands (stats, reports, users) need the Admin role.

USAGE EXAMPLES:
    # Sign in (prompts for the password)
    cinema-portal login --email staff@cinema.vn

    # Today's bookings, second page
    cinema-portal bookings --page 2

    # Look up a ticket and check it in
    cinema-portal verify BK-20250301-0042
    cinema-portal check-in 42 --notes \"Walk-in\"

    # Monthly revenue as JSON
    cinema-portal revenue monthly --month 3 --year 2025 --format json

    # Where would the portal send me?
    cinema-portal route /admin/dashboard

CONFIGURATION:
    Configuration file: ~/.config/cinema-portal/config.toml
    Session file:       ~/.local/share/cinema-portal/session.json

    Override with environment variables:
        PORTAL_CONFIG     - Path to config file
        PORTAL_API_URL    - Backend base URL
        PORTAL_LOG_LEVEL  - Log level (default: warn)
        PORTAL_LOG_FORMAT - text, json or pretty

EXIT CODES:
    0 - Success
    1 - Operation failed
    2 - Not signed in, session expired, or role not allowed
    3 - Invalid input
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file
    #[arg(long, global = true, env = "PORTAL_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in with email and password
    Login {
        #[arg(short, long)]
        email: String,

        /// Read the password from the first line of stdin
        #[arg(long)]
        password_stdin: bool,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami {
        /// Ask the backend instead of reading the stored session
        #[arg(long)]
        remote: bool,
    },

    /// Exchange the refresh token for a new access token
    Refresh,

    /// Show what the portal renders for a path
    Route {
        /// e.g. /admin/dashboard
        path: String,
    },

    /// List today's bookings
    Bookings {
        #[arg(long)]
        cinema: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 10)]
        page_size: u32,

        #[arg(long)]
        status: Option<String>,

        /// Only paid (true) or unpaid (false) bookings
        #[arg(long)]
        paid: Option<bool>,
    },

    /// Check a booking in
    CheckIn {
        booking_id: String,

        #[arg(long)]
        notes: Option<String>,

        /// Check-in time (RFC 3339); defaults to now, cinema time
        #[arg(long)]
        time: Option<String>,
    },

    /// Look a booking up by its code
    Verify { code: String },

    /// Dashboard overview
    Stats,

    /// Booking statistics for a date range
    BookingStats {
        /// Start date, YYYY-MM-DD (default: first of this month)
        #[arg(long)]
        from: Option<String>,

        /// End date, YYYY-MM-DD (default: today)
        #[arg(long)]
        to: Option<String>,
    },

    /// Customer analytics
    Customers {
        #[arg(long, default_value = "month")]
        period: String,

        /// Number of top customers to include
        #[arg(long, default_value_t = 5)]
        top: u32,
    },

    /// Revenue reports
    Revenue {
        #[command(subcommand)]
        report: RevenueCommand,
    },

    /// Manage portal users
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },
}

#[derive(Subcommand, Debug)]
enum RevenueCommand {
    /// Revenue for one day
    Daily {
        /// YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Revenue for one month (default: this month)
    Monthly {
        #[arg(long)]
        month: Option<u32>,

        #[arg(long)]
        year: Option<i32>,
    },
}

#[derive(Subcommand, Debug)]
enum UsersCommand {
    /// List users
    List {
        #[arg(long)]
        role: Option<String>,

        /// "true" for active users, "false" for banned ones
        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        search: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 10)]
        page_size: u32,
    },

    /// Show one user
    Get { user_id: String },

    /// Create a user (prompts for the password)
    Create {
        #[arg(long)]
        email: String,

        #[arg(long)]
        fullname: String,

        #[arg(long)]
        role: String,

        #[arg(long, default_value = "")]
        phone: String,

        /// Read the password from the first line of stdin
        #[arg(long)]
        password_stdin: bool,
    },

    /// Change a user's role
    Role { user_id: String, role: String },

    /// Ban a user
    Ban { user_id: String },

    /// Lift a ban
    Unban { user_id: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env(cli.verbose).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(exit_code(&e));
    }
}

fn exit_code(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<PortalError>()
        .map(PortalError::exit_code)
        .unwrap_or(1)
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let portal = PortalService::from_config(config)?;

    // Pick up a stored session before anything touches the network
    if let Some(user) = portal.auth().rehydrate().data {
        tracing::debug!(user_id = %user.id, "Restored stored session");
    }

    let mut console = Console {
        events: portal.subscribe(),
        portal,
        format: cli.format,
    };

    match cli.command {
        Commands::Login {
            email,
            password_stdin,
        } => cmd_login(&mut console, &email, password_stdin).await,
        Commands::Logout => cmd_logout(&mut console).await,
        Commands::Whoami { remote } => cmd_whoami(&mut console, remote).await,
        Commands::Refresh => cmd_refresh(&mut console).await,
        Commands::Route { path } => cmd_route(&console, &path),
        Commands::Bookings {
            cinema,
            page,
            page_size,
            status,
            paid,
        } => {
            let filter = BookingFilter {
                cinema_id: cinema,
                page,
                page_size,
                status,
                has_payment: paid,
            };
            cmd_bookings(&mut console, &filter).await
        }
        Commands::CheckIn {
            booking_id,
            notes,
            time,
        } => {
            let options = CheckInOptions {
                check_in_time: time,
                notes,
            };
            cmd_check_in(&mut console, &booking_id, options).await
        }
        Commands::Verify { code } => cmd_verify(&mut console, &code).await,
        Commands::Stats => cmd_stats(&mut console).await,
        Commands::BookingStats { from, to } => cmd_booking_stats(&mut console, from, to).await,
        Commands::Customers { period, top } => cmd_customers(&mut console, &period, top).await,
        Commands::Revenue { report } => cmd_revenue(&mut console, report).await,
        Commands::Users { command } => cmd_users(&mut console, command).await,
    }
}

fn load_config(path: Option<&Path>) -> libportal::Result<Config> {
    match path {
        Some(path) => {
            let mut config = Config::load_from_path(path)?;
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
        None => Config::load(),
    }
}

/// The service plus what every command needs to report back
struct Console {
    portal: PortalService,
    format: OutputFormat,
    events: EventReceiver,
}

impl Console {
    /// Fail unless the signed-in user may open `route`
    fn require(&self, route: Route) -> libportal::Result<()> {
        match guard(&self.portal.state().auth, route) {
            RouteDecision::Render(_) => Ok(()),
            RouteDecision::Redirect(_) | RouteDecision::Loading => Err(PortalError::Access(
                "Not signed in. Run `cinema-portal login` first".to_string(),
            )),
            RouteDecision::Forbidden { required } => Err(PortalError::Access(format!(
                "This command requires the {} role",
                required
            ))),
        }
    }

    fn require_signed_in(&self) -> libportal::Result<()> {
        if self.portal.state().auth.is_authenticated {
            Ok(())
        } else {
            Err(PortalError::Access(
                "Not signed in. Run `cinema-portal login` first".to_string(),
            ))
        }
    }

    /// Unwrap an outcome; failures caused by a rejected session become
    /// access errors
    fn settle<T>(&mut self, outcome: Outcome<T>) -> Result<(T, Option<String>)> {
        let message = outcome.message.clone();
        match outcome.into_result() {
            Ok(data) => Ok((data, message)),
            Err(error) if self.session_expired() => Err(PortalError::Access(error).into()),
            Err(error) => Err(anyhow::anyhow!(error)),
        }
    }

    fn session_expired(&mut self) -> bool {
        std::iter::from_fn(|| self.events.try_recv().ok())
            .any(|event| matches!(event, Event::SessionExpired { .. }))
    }

    /// Print `data` as JSON, or through `text` in text mode
    fn show<T: Serialize>(&self, data: &T, text: impl FnOnce(&T)) -> Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
            OutputFormat::Text => text(data),
        }
        Ok(())
    }

    /// Confirmation line for mutations
    fn confirm(&self, message: &str) -> Result<()> {
        self.show(&serde_json::json!({ "success": true, "message": message }), |_| {
            println!("{}", message)
        })
    }
}

fn read_password(from_stdin: bool) -> Result<String> {
    let password = if from_stdin {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        line.trim_end_matches(&['\r', '\n'][..]).to_string()
    } else {
        rpassword::prompt_password("Password: ")?
    };

    if password.is_empty() {
        return Err(PortalError::InvalidInput("Password cannot be empty".to_string()).into());
    }
    Ok(password)
}

fn require_value(value: &str, message: &str) -> libportal::Result<()> {
    if value.trim().is_empty() {
        Err(PortalError::InvalidInput(message.to_string()))
    } else {
        Ok(())
    }
}

async fn cmd_login(console: &mut Console, email: &str, password_stdin: bool) -> Result<()> {
    require_value(email, "Email is required")?;
    let password = read_password(password_stdin)?;

    let outcome = console
        .portal
        .auth()
        .login(LoginCredentials::new(email.trim(), password))
        .await;

    match outcome.into_result() {
        Ok(session) => {
            let home = console.portal.state().location;
            let summary = serde_json::json!({
                "user": session.user,
                "route": home.path(),
            });
            console.show(&summary, |_| {
                println!("Signed in as {}", render::user_label(&session.user));
                println!("Home: {}", home.path());
            })
        }
        // Wrong credentials and wrong roles are both authentication failures
        Err(error) => {
            let unauthorized = console.session_expired()
                || error == libportal::service::auth::ROLE_NOT_FOUND
                || error == libportal::service::auth::INVALID_ROLE;
            if unauthorized {
                Err(PortalError::Access(error).into())
            } else {
                Err(anyhow::anyhow!(error))
            }
        }
    }
}

async fn cmd_logout(console: &mut Console) -> Result<()> {
    if !console.portal.state().auth.is_authenticated {
        return console.confirm("Not signed in");
    }

    let outcome = console.portal.auth().logout().await;
    if let Some(error) = &outcome.error {
        eprintln!("Warning: remote logout failed: {}", error);
    }
    console.confirm("Signed out")
}

async fn cmd_whoami(console: &mut Console, remote: bool) -> Result<()> {
    console.require_signed_in()?;

    let user = if remote {
        let outcome = console.portal.auth().fetch_current_user().await;
        console.settle(outcome)?.0
    } else {
        match console.portal.state().auth.user() {
            Some(user) => user.clone(),
            None => return Err(PortalError::Access("Not signed in".to_string()).into()),
        }
    };

    console.show(&user, render::user)
}

async fn cmd_refresh(console: &mut Console) -> Result<()> {
    console.require_signed_in()?;
    let outcome = console.portal.auth().refresh_session().await;
    console.settle(outcome)?;
    console.confirm("Session refreshed")
}

fn cmd_route(console: &Console, path: &str) -> Result<()> {
    let route = Route::parse(path);
    let decision = guard(&console.portal.state().auth, route);
    let (verdict, target) = match &decision {
        RouteDecision::Render(route) => ("render", Some(route.path().to_string())),
        RouteDecision::Loading => ("loading", None),
        RouteDecision::Redirect(route) => ("redirect", Some(route.path().to_string())),
        RouteDecision::Forbidden { required } => ("forbidden", Some(required.to_string())),
    };

    let summary = serde_json::json!({
        "path": path,
        "route": route.path(),
        "decision": verdict,
        "target": target,
    });
    console.show(&summary, |_| match &decision {
        RouteDecision::Forbidden { required } => {
            println!("forbidden: {} requires the {} role", route.path(), required)
        }
        RouteDecision::Loading => println!("loading"),
        _ => println!("{} {}", verdict, target.as_deref().unwrap_or_default()),
    })
}

async fn cmd_bookings(console: &mut Console, filter: &BookingFilter) -> Result<()> {
    console.require(Route::StaffDashboard)?;
    let outcome = console.portal.bookings().fetch_today(filter).await;
    let (list, _) = console.settle(outcome)?;
    console.show(&list, render::bookings)
}

async fn cmd_check_in(console: &mut Console, booking_id: &str, options: CheckInOptions) -> Result<()> {
    console.require(Route::StaffDashboard)?;
    require_value(booking_id, "Booking ID is required")?;

    let outcome = console.portal.bookings().check_in(booking_id, options).await;
    let (receipt, message) = console.settle(outcome)?;
    let message = message.unwrap_or_else(|| format!("Booking {} checked in", receipt.booking_id));
    console.confirm(&message)
}

async fn cmd_verify(console: &mut Console, code: &str) -> Result<()> {
    console.require(Route::StaffDashboard)?;
    require_value(code, "Please enter a booking code")?;

    let outcome = console.portal.bookings().verify(code).await;
    let (booking, _) = console.settle(outcome)?;
    console.show(&booking, render::verified_booking)
}

async fn cmd_stats(console: &mut Console) -> Result<()> {
    console.require(Route::AdminDashboard)?;
    let outcome = console.portal.admin().fetch_stats().await;
    let (stats, _) = console.settle(outcome)?;
    console.show(&stats, render::dashboard_stats)
}

async fn cmd_booking_stats(
    console: &mut Console,
    from: Option<String>,
    to: Option<String>,
) -> Result<()> {
    console.require(Route::AdminDashboard)?;
    let from = from.unwrap_or_else(dates::first_of_month);
    let to = to.unwrap_or_else(dates::today);

    let outcome = console
        .portal
        .admin()
        .fetch_booking_stats(Some(&from), Some(&to))
        .await;
    let (stats, _) = console.settle(outcome)?;
    console.show(&stats, render::booking_statistics)
}

async fn cmd_customers(console: &mut Console, period: &str, top: u32) -> Result<()> {
    console.require(Route::AdminDashboard)?;
    let outcome = console
        .portal
        .admin()
        .fetch_customer_analytics(Some(period), top)
        .await;
    let (analytics, _) = console.settle(outcome)?;
    console.show(&analytics, render::customer_analytics)
}

async fn cmd_revenue(console: &mut Console, report: RevenueCommand) -> Result<()> {
    console.require(Route::AdminDashboard)?;

    let query = match report {
        RevenueCommand::Daily { date } => RevenueQuery::Daily {
            date: Some(date.unwrap_or_else(dates::today)),
        },
        RevenueCommand::Monthly {
            month: None,
            year: None,
        } => {
            let (month, year) = dates::current_month();
            RevenueQuery::Monthly {
                month: Some(month),
                year: Some(year),
            }
        }
        RevenueCommand::Monthly { month, year } => RevenueQuery::Monthly { month, year },
    };

    let outcome = console.portal.admin().fetch_revenue_report(&query).await;
    let (report, _) = console.settle(outcome)?;
    console.show(&report, render::revenue_report)
}

async fn cmd_users(console: &mut Console, command: UsersCommand) -> Result<()> {
    console.require(Route::AdminDashboard)?;

    match command {
        UsersCommand::List {
            role,
            status,
            search,
            page,
            page_size,
        } => {
            let filter = UserFilter {
                role,
                status,
                search,
                page,
                page_size,
            };
            let outcome = console.portal.admin().fetch_users(&filter).await;
            let (users, _) = console.settle(outcome)?;
            console.show(&users, render::users)
        }
        UsersCommand::Get { user_id } => {
            require_value(&user_id, "User ID is required")?;
            let outcome = console.portal.admin().fetch_user_detail(&user_id).await;
            let (user, _) = console.settle(outcome)?;
            console.show(&user, render::admin_user)
        }
        UsersCommand::Create {
            email,
            fullname,
            role,
            phone,
            password_stdin,
        } => {
            // Everything but the password is checked before prompting for it
            if [&email, &fullname, &role].iter().any(|v| v.trim().is_empty()) {
                return Err(PortalError::InvalidInput(REQUIRED_FIELDS_MESSAGE.to_string()).into());
            }
            let request = CreateUserRequest {
                email,
                password: read_password(password_stdin)?,
                fullname,
                role,
                phone,
            };

            let outcome = console.portal.admin().create_user(&request).await;
            let (_, message) = console.settle(outcome)?;
            console.confirm(message.as_deref().unwrap_or("User created successfully"))
        }
        UsersCommand::Role { user_id, role } => {
            require_value(&role, SELECT_ROLE_MESSAGE)?;
            require_value(&user_id, "User ID is required")?;
            let outcome = console.portal.admin().update_user_role(&user_id, &role).await;
            let (_, message) = console.settle(outcome)?;
            console.confirm(message.as_deref().unwrap_or("User role updated successfully"))
        }
        UsersCommand::Ban { user_id } => set_status(console, &user_id, false).await,
        UsersCommand::Unban { user_id } => set_status(console, &user_id, true).await,
    }
}

async fn set_status(console: &mut Console, user_id: &str, is_active: bool) -> Result<()> {
    require_value(user_id, "User ID is required")?;
    let outcome = console.portal.admin().set_user_status(user_id, is_active).await;
    let (_, message) = console.settle(outcome)?;
    console.confirm(message.as_deref().unwrap_or("User status updated successfully"))
}
