//! Cinema portal - staff and admin client for the cinema booking backend
//!
//! This library keeps the portal's view of remote data in sync with the
//! backend: an HTTP client with session handling, one API module per
//! resource, orchestrating services, and a reducer-driven state store.

pub mod api;
pub mod config;
pub mod dates;
pub mod error;
pub mod events;
pub mod http;
pub mod logging;
pub mod normalize;
pub mod routes;
pub mod service;
pub mod session;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{ApiError, PortalError, Result};
pub use events::{Event, EventBus};
pub use http::{HttpClient, MockTransport, ReqwestTransport, Transport};
pub use routes::Route;
pub use service::{Outcome, PortalService};
pub use session::{FileStorage, MemoryStorage, SessionManager, SessionStorage};
pub use store::{PortalState, Store};
pub use types::{Role, Session, User};
