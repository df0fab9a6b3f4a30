//! State store
//!
//! The store owns the [`PortalState`] and applies actions to it through the
//! pure [`reducer::reduce`]. The lock is only held while reducing, never
//! across an `.await`, so services can dispatch from any task.

pub mod actions;
pub mod reducer;
pub mod remote;
pub mod state;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

pub use actions::{Action, Lifecycle};
pub use remote::{FailurePolicy, Phase, Remote};
pub use state::{AdminState, AuthState, BookingsState, PortalState};

#[derive(Default)]
pub struct Store {
    state: Mutex<PortalState>,
    next_seq: AtomicU64,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: PortalState) -> Self {
        Self {
            state: Mutex::new(state),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Hand out the sequence number for a new request
    ///
    /// Numbers are unique across all slices and strictly increasing in
    /// issue order.
    pub fn begin(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn dispatch(&self, action: Action) {
        tracing::trace!(?action, "dispatch");
        let mut guard = self.lock();
        let current = std::mem::take(&mut *guard);
        *guard = reducer::reduce(current, action);
    }

    /// Copy of the whole state
    pub fn state(&self) -> PortalState {
        self.lock().clone()
    }

    /// Read part of the state without cloning the rest
    pub fn select<R>(&self, f: impl FnOnce(&PortalState) -> R) -> R {
        f(&self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, PortalState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::Route;

    #[test]
    fn test_sequence_numbers_increase() {
        let store = Store::new();
        let first = store.begin();
        let second = store.begin();
        assert!(second > first);
        assert!(first > 0);
    }

    #[test]
    fn test_dispatch_applies_reducer() {
        let store = Store::new();
        store.dispatch(Action::NavigateTo(Route::AdminDashboard));
        assert_eq!(store.select(|s| s.location), Route::AdminDashboard);
    }

    #[test]
    fn test_with_state() {
        let store = Store::with_state(PortalState {
            location: Route::StaffDashboard,
            ..PortalState::default()
        });
        assert_eq!(store.state().location, Route::StaffDashboard);
    }
}
