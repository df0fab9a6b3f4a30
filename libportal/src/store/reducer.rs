//! Pure reducer for the portal store
//!
//! `(PortalState, Action) -> PortalState`, with no I/O. Services do the
//! talking to the backend and describe the results as actions.

use super::actions::{Action, Lifecycle};
use super::state::{AdminState, AuthState, BookingsState, PortalState};
use crate::routes::Route;
use crate::types::{CheckInReceipt, Session};

pub fn reduce(state: PortalState, action: Action) -> PortalState {
    match action {
        // === Auth ===
        Action::Login(event) => PortalState {
            auth: reduce_login(state.auth, event),
            ..state
        },

        Action::Logout(event) => PortalState {
            auth: reduce_logout(state.auth, event),
            ..state
        },

        Action::SessionRestored(session) => PortalState {
            auth: AuthState {
                session: Some(session),
                is_authenticated: true,
                loading: false,
                error: None,
                ..state.auth
            },
            ..state
        },

        Action::SetUser(user) => {
            let session = state.auth.session.map(|session| Session { user, ..session });
            PortalState {
                auth: AuthState {
                    is_authenticated: session.is_some(),
                    session,
                    ..state.auth
                },
                ..state
            }
        }

        Action::SetTokens {
            token,
            refresh_token,
        } => {
            let session = state.auth.session.map(|session| Session {
                token,
                refresh_token: refresh_token.or(session.refresh_token),
                ..session
            });
            PortalState {
                auth: AuthState {
                    session,
                    ..state.auth
                },
                ..state
            }
        }

        Action::ClearAuth => PortalState {
            auth: AuthState {
                seq: state.auth.seq,
                ..AuthState::default()
            },
            ..state
        },

        Action::ClearAuthError => PortalState {
            auth: AuthState {
                error: None,
                ..state.auth
            },
            ..state
        },

        Action::SessionExpired => PortalState {
            auth: AuthState {
                seq: state.auth.seq,
                ..AuthState::default()
            },
            location: Route::Login,
            ..state
        },

        // === Staff bookings ===
        Action::FetchBookings(event) => PortalState {
            bookings: BookingsState {
                list: state.bookings.list.apply(event),
                ..state.bookings
            },
            ..state
        },

        Action::CheckIn(event) => PortalState {
            bookings: reduce_check_in(state.bookings, event),
            ..state
        },

        Action::VerifyBooking(event) => {
            let mut verified = state.bookings.verified;
            if matches!(event, Lifecycle::Started { .. }) {
                verified.data = None;
            }
            PortalState {
                bookings: BookingsState {
                    verified: verified.apply(event.map(Some)),
                    ..state.bookings
                },
                ..state
            }
        }

        Action::ClearBookingsError => PortalState {
            bookings: BookingsState {
                list: state.bookings.list.clear_error(),
                verified: state.bookings.verified.clear_error(),
                check_in: state.bookings.check_in.clear_error(),
            },
            ..state
        },

        // Only the data goes; loading and error belong to the lookup
        Action::ClearVerifiedBooking => {
            let mut verified = state.bookings.verified;
            verified.data = None;
            PortalState {
                bookings: BookingsState {
                    verified,
                    ..state.bookings
                },
                ..state
            }
        }

        // === Admin dashboard ===
        Action::FetchAdminStats(event) => PortalState {
            admin: AdminState {
                stats: state.admin.stats.apply(event),
                ..state.admin
            },
            ..state
        },

        Action::FetchBookingStats(event) => PortalState {
            admin: AdminState {
                booking_stats: state.admin.booking_stats.apply(event),
                ..state.admin
            },
            ..state
        },

        Action::FetchCustomerAnalytics(event) => PortalState {
            admin: AdminState {
                customer_analytics: state.admin.customer_analytics.apply(event),
                ..state.admin
            },
            ..state
        },

        Action::FetchRevenueReport(event) => PortalState {
            admin: AdminState {
                revenue_report: state.admin.revenue_report.apply(event),
                ..state.admin
            },
            ..state
        },

        Action::FetchUsers(event) => PortalState {
            admin: AdminState {
                users: state.admin.users.apply(event),
                ..state.admin
            },
            ..state
        },

        Action::FetchUserDetail(event) => PortalState {
            admin: AdminState {
                user_detail: state.admin.user_detail.apply(event.map(Some)),
                ..state.admin
            },
            ..state
        },

        Action::CreateUser(event)
        | Action::UpdateUserRole(event)
        | Action::ToggleUserStatus(event) => PortalState {
            admin: AdminState {
                user_mutation: state.admin.user_mutation.apply(event.map(Some)),
                ..state.admin
            },
            ..state
        },

        Action::ClearAdminErrors => PortalState {
            admin: AdminState {
                stats: state.admin.stats.clear_error(),
                booking_stats: state.admin.booking_stats.clear_error(),
                customer_analytics: state.admin.customer_analytics.clear_error(),
                revenue_report: state.admin.revenue_report.clear_error(),
                users: state.admin.users.clear_error(),
                user_detail: state.admin.user_detail.clear_error(),
                user_mutation: state.admin.user_mutation.clear_error(),
            },
            ..state
        },

        // === Navigation ===
        Action::NavigateTo(route) => PortalState {
            location: route,
            ..state
        },
    }
}

fn reduce_login(auth: AuthState, event: Lifecycle<Session>) -> AuthState {
    match event {
        Lifecycle::Started { seq } if seq >= auth.seq => AuthState {
            loading: true,
            error: None,
            seq,
            ..auth
        },
        Lifecycle::Succeeded { seq, payload } if seq == auth.seq => AuthState {
            session: Some(payload),
            is_authenticated: true,
            loading: false,
            error: None,
            seq,
        },
        Lifecycle::Failed { seq, error } if seq == auth.seq => AuthState {
            session: None,
            is_authenticated: false,
            loading: false,
            error: Some(error),
            seq,
        },
        _ => auth,
    }
}

fn reduce_logout(auth: AuthState, event: Lifecycle<()>) -> AuthState {
    match event {
        Lifecycle::Started { seq } if seq >= auth.seq => AuthState {
            loading: true,
            seq,
            ..auth
        },
        Lifecycle::Succeeded { seq, .. } if seq == auth.seq => AuthState {
            seq,
            ..AuthState::default()
        },
        Lifecycle::Failed { seq, error } if seq == auth.seq => AuthState {
            loading: false,
            error: Some(error),
            ..auth
        },
        _ => auth,
    }
}

/// A successful check-in marks the booking everywhere it is shown, even if
/// a newer check-in has been issued since: each one targets a different
/// booking. Only the check-in slice's own status is sequence-guarded.
fn reduce_check_in(bookings: BookingsState, event: Lifecycle<CheckInReceipt>) -> BookingsState {
    let BookingsState {
        mut list,
        mut verified,
        check_in,
    } = bookings;

    if let Lifecycle::Succeeded { payload, .. } = &event {
        list.data
            .bookings
            .iter_mut()
            .filter(|booking| booking.matches(&payload.booking_id))
            .for_each(|booking| booking.mark_checked_in());

        if let Some(booking) = verified.data.as_mut() {
            if booking.matches(&payload.booking_id) {
                booking.mark_checked_in();
            }
        }
    }

    BookingsState {
        list,
        verified,
        check_in: check_in.apply(event.map(Some)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::remote::Phase;
    use crate::types::{Booking, BookingList, DashboardStats, Role, User, UserPage, VerifiedBooking};
    use serde_json::Value;

    fn session(role: Role) -> Session {
        Session {
            token: "tok".to_string(),
            refresh_token: None,
            user: User {
                id: "1".to_string(),
                full_name: "Tester".to_string(),
                email: None,
                role_name: Some(role),
                cinema_id: None,
                phone: None,
            },
        }
    }

    fn booking(id: &str) -> Booking {
        Booking {
            id: Some(id.to_string()),
            booking_code: format!("BK-{}", id),
            can_check_in: true,
            ..Booking::default()
        }
    }

    fn receipt(id: &str) -> CheckInReceipt {
        CheckInReceipt {
            booking_id: id.to_string(),
            data: Value::Null,
        }
    }

    fn with_bookings(ids: &[&str]) -> PortalState {
        let state = reduce(
            PortalState::default(),
            Action::FetchBookings(Lifecycle::Started { seq: 1 }),
        );
        reduce(
            state,
            Action::FetchBookings(Lifecycle::Succeeded {
                seq: 1,
                payload: BookingList {
                    bookings: ids.iter().map(|id| booking(id)).collect(),
                    pagination: None,
                },
            }),
        )
    }

    #[test]
    fn test_login_success_authenticates() {
        let state = reduce(PortalState::default(), Action::Login(Lifecycle::Started { seq: 1 }));
        assert!(state.auth.loading);

        let state = reduce(
            state,
            Action::Login(Lifecycle::Succeeded {
                seq: 1,
                payload: session(Role::Staff),
            }),
        );
        assert!(state.auth.is_authenticated);
        assert!(!state.auth.loading);
        assert_eq!(state.auth.token(), Some("tok"));
    }

    #[test]
    fn test_login_failure_clears_session() {
        let state = PortalState {
            auth: AuthState {
                session: Some(session(Role::Admin)),
                is_authenticated: true,
                ..AuthState::default()
            },
            ..PortalState::default()
        };
        let state = reduce(state, Action::Login(Lifecycle::Started { seq: 1 }));
        let state = reduce(
            state,
            Action::Login(Lifecycle::Failed {
                seq: 1,
                error: "Login failed".to_string(),
            }),
        );

        assert!(!state.auth.is_authenticated);
        assert!(state.auth.session.is_none());
        assert_eq!(state.auth.error.as_deref(), Some("Login failed"));
    }

    #[test]
    fn test_session_expired_resets_auth_and_navigates() {
        let state = PortalState {
            auth: AuthState {
                session: Some(session(Role::Admin)),
                is_authenticated: true,
                ..AuthState::default()
            },
            location: Route::AdminDashboard,
            ..PortalState::default()
        };
        let state = reduce(state, Action::SessionExpired);

        assert!(!state.auth.is_authenticated);
        assert!(state.auth.session.is_none());
        assert_eq!(state.location, Route::Login);
    }

    #[test]
    fn test_set_user_requires_session() {
        let state = reduce(PortalState::default(), Action::SetUser(session(Role::Staff).user));
        assert!(!state.auth.is_authenticated);

        let state = reduce(
            PortalState::default(),
            Action::SessionRestored(session(Role::Staff)),
        );
        let mut renamed = session(Role::Staff).user;
        renamed.full_name = "Renamed".to_string();
        let state = reduce(state, Action::SetUser(renamed));
        assert_eq!(state.auth.user().unwrap().full_name, "Renamed");
    }

    #[test]
    fn test_set_tokens_keeps_refresh_token_when_absent() {
        let mut restored = session(Role::Staff);
        restored.refresh_token = Some("r1".to_string());
        let state = reduce(PortalState::default(), Action::SessionRestored(restored));
        let state = reduce(
            state,
            Action::SetTokens {
                token: "tok2".to_string(),
                refresh_token: None,
            },
        );
        let session = state.auth.session.unwrap();
        assert_eq!(session.token, "tok2");
        assert_eq!(session.refresh_token.as_deref(), Some("r1"));
    }

    #[test]
    fn test_check_in_patches_only_matching_booking() {
        let state = with_bookings(&["1", "2"]);
        let state = reduce(state, Action::CheckIn(Lifecycle::Started { seq: 2 }));
        let state = reduce(
            state,
            Action::CheckIn(Lifecycle::Succeeded {
                seq: 2,
                payload: receipt("2"),
            }),
        );

        let bookings = &state.bookings.list.data.bookings;
        assert!(!bookings[0].checked_in);
        assert!(bookings[1].checked_in);
        assert!(!bookings[1].can_check_in);
    }

    #[test]
    fn test_check_in_failure_leaves_list_untouched() {
        let before = with_bookings(&["1", "2"]);
        let state = reduce(before.clone(), Action::CheckIn(Lifecycle::Started { seq: 2 }));
        let state = reduce(
            state,
            Action::CheckIn(Lifecycle::Failed {
                seq: 2,
                error: "Already checked in".to_string(),
            }),
        );

        assert_eq!(state.bookings.list, before.bookings.list);
        assert_eq!(
            state.bookings.check_in.error.as_deref(),
            Some("Already checked in")
        );
    }

    #[test]
    fn test_out_of_order_check_ins_both_patch() {
        let state = with_bookings(&["1", "2"]);
        let state = reduce(state, Action::CheckIn(Lifecycle::Started { seq: 2 }));
        let state = reduce(state, Action::CheckIn(Lifecycle::Started { seq: 3 }));
        let state = reduce(
            state,
            Action::CheckIn(Lifecycle::Succeeded {
                seq: 3,
                payload: receipt("2"),
            }),
        );
        let state = reduce(
            state,
            Action::CheckIn(Lifecycle::Succeeded {
                seq: 2,
                payload: receipt("1"),
            }),
        );

        assert!(state.bookings.list.data.bookings.iter().all(|b| b.checked_in));
        assert_eq!(
            state.bookings.check_in.data.as_ref().map(|r| r.booking_id.as_str()),
            Some("2")
        );
        assert!(!state.bookings.check_in.loading);
    }

    #[test]
    fn test_check_in_patches_verified_booking() {
        let state = reduce(
            PortalState::default(),
            Action::VerifyBooking(Lifecycle::Started { seq: 1 }),
        );
        let state = reduce(
            state,
            Action::VerifyBooking(Lifecycle::Succeeded {
                seq: 1,
                payload: VerifiedBooking {
                    booking_id: Some("7".to_string()),
                    booking_code: "BK-7".to_string(),
                    can_check_in: true,
                    ..VerifiedBooking::default()
                },
            }),
        );
        let state = reduce(state, Action::CheckIn(Lifecycle::Started { seq: 2 }));
        let state = reduce(
            state,
            Action::CheckIn(Lifecycle::Succeeded {
                seq: 2,
                payload: receipt("7"),
            }),
        );

        assert!(state.bookings.verified.data.unwrap().is_checked_in());
    }

    #[test]
    fn test_verify_failure_and_clear() {
        let state = reduce(
            PortalState::default(),
            Action::VerifyBooking(Lifecycle::Started { seq: 1 }),
        );
        let state = reduce(
            state,
            Action::VerifyBooking(Lifecycle::Failed {
                seq: 1,
                error: "Verification failed".to_string(),
            }),
        );
        assert!(state.bookings.verified.data.is_none());
        assert_eq!(state.bookings.verified.phase, Phase::Failed);

        let state = reduce(state, Action::ClearVerifiedBooking);
        assert!(state.bookings.verified.data.is_none());
        assert_eq!(
            state.bookings.verified.error.as_deref(),
            Some("Verification failed")
        );
        assert_eq!(state.bookings.verified.phase, Phase::Failed);
    }

    #[test]
    fn test_clear_verified_during_lookup_keeps_loading() {
        let state = reduce(
            PortalState::default(),
            Action::VerifyBooking(Lifecycle::Started { seq: 1 }),
        );
        let state = reduce(state, Action::ClearVerifiedBooking);
        assert!(state.bookings.verified.loading);
        assert_eq!(state.bookings.verified.seq, 1);

        // The lookup still lands afterwards
        let state = reduce(
            state,
            Action::VerifyBooking(Lifecycle::Succeeded {
                seq: 1,
                payload: VerifiedBooking {
                    booking_code: "BK-9".to_string(),
                    ..VerifiedBooking::default()
                },
            }),
        );
        assert_eq!(
            state.bookings.verified.data.map(|b| b.booking_code).as_deref(),
            Some("BK-9")
        );
    }

    #[test]
    fn test_clear_verified_drops_loaded_booking() {
        let state = reduce(
            PortalState::default(),
            Action::VerifyBooking(Lifecycle::Started { seq: 1 }),
        );
        let state = reduce(
            state,
            Action::VerifyBooking(Lifecycle::Succeeded {
                seq: 1,
                payload: VerifiedBooking::default(),
            }),
        );
        let state = reduce(state, Action::ClearVerifiedBooking);
        assert!(state.bookings.verified.data.is_none());
        assert!(!state.bookings.verified.loading);
    }

    #[test]
    fn test_admin_slices_are_isolated() {
        let state = reduce(
            PortalState::default(),
            Action::FetchAdminStats(Lifecycle::Started { seq: 1 }),
        );
        let state = reduce(
            state,
            Action::FetchAdminStats(Lifecycle::Succeeded {
                seq: 1,
                payload: DashboardStats {
                    today_bookings: 4,
                    ..DashboardStats::default()
                },
            }),
        );
        let state = reduce(state, Action::FetchUsers(Lifecycle::Started { seq: 2 }));
        let state = reduce(
            state,
            Action::FetchUsers(Lifecycle::Failed {
                seq: 2,
                error: "Failed to fetch users".to_string(),
            }),
        );

        assert_eq!(state.admin.stats.data.today_bookings, 4);
        assert!(state.admin.stats.error.is_none());
        assert_eq!(state.admin.users.data, UserPage::default());
        assert_eq!(state.admin.errors(), vec!["Failed to fetch users"]);
    }

    #[test]
    fn test_clear_admin_errors_is_idempotent() {
        let state = reduce(
            PortalState::default(),
            Action::FetchRevenueReport(Lifecycle::Started { seq: 1 }),
        );
        let state = reduce(
            state,
            Action::FetchRevenueReport(Lifecycle::Failed {
                seq: 1,
                error: "Failed to fetch revenue report".to_string(),
            }),
        );

        let once = reduce(state.clone(), Action::ClearAdminErrors);
        let twice = reduce(once.clone(), Action::ClearAdminErrors);
        assert_eq!(once, twice);
        assert!(once.admin.errors().is_empty());
        assert_eq!(once.admin.revenue_report.data, state.admin.revenue_report.data);
    }

    #[test]
    fn test_clear_bookings_error_touches_only_errors() {
        let state = with_bookings(&["1"]);
        let state = reduce(state, Action::CheckIn(Lifecycle::Started { seq: 2 }));
        let state = reduce(
            state,
            Action::CheckIn(Lifecycle::Failed {
                seq: 2,
                error: "nope".to_string(),
            }),
        );
        let cleared = reduce(state.clone(), Action::ClearBookingsError);

        assert!(cleared.bookings.check_in.error.is_none());
        assert_eq!(cleared.bookings.list, state.bookings.list);
    }

    #[test]
    fn test_logout_success_resets_auth() {
        let state = reduce(
            PortalState::default(),
            Action::SessionRestored(session(Role::Admin)),
        );
        let state = reduce(state, Action::Logout(Lifecycle::Started { seq: 4 }));
        let state = reduce(state, Action::Logout(Lifecycle::Succeeded { seq: 4, payload: () }));

        assert!(!state.auth.is_authenticated);
        assert!(state.auth.session.is_none());
        assert_eq!(state.auth.seq, 4);
    }

    #[test]
    fn test_navigate() {
        let state = reduce(
            PortalState::default(),
            Action::NavigateTo(Route::StaffDashboard),
        );
        assert_eq!(state.location, Route::StaffDashboard);
    }
}
