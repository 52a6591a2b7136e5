//! Exhaustive properties of the gate and the landing resolver.
//!
//! Every session shape is checked against every route in the table plus a
//! handful of awkward paths. No backend is involved.

#![allow(clippy::unwrap_used)]

use school_portal_core::routes::{self, ROUTES};
use school_portal_core::{
    Decision, EnrollmentStatus, Landing, Role, Session, SessionState, UserId, authorize_route,
    resolve_landing,
};

/// Hops after which a navigation must have settled.
const MAX_HOPS: usize = 2;

fn paths() -> Vec<String> {
    let mut paths: Vec<String> = ROUTES
        .iter()
        .map(|route| route.pattern.replace(":sectionName", "Sampaguita"))
        .collect();
    paths.extend(
        [
            "/no-such-page",
            "/manage-users2",
            "/learner-dashboard/",
            "/authpage?next=/admin-dashboard",
            "/teacher-materials#week-3",
            "",
        ]
        .map(String::from),
    );
    paths
}

fn states() -> Vec<SessionState> {
    let mut states = vec![SessionState::Pending, SessionState::Absent];
    for role in Role::ALL {
        for verified in [false, true] {
            for enrollment in [None, Some(false), Some(true)] {
                states.push(SessionState::Present(Session {
                    id: UserId::new("7"),
                    role,
                    first_name: "Tandang".to_string(),
                    email: "sora@example.com".to_string(),
                    lrn: None,
                    is_email_verified: verified,
                    enrollment_status: enrollment.map(|is_enrolled| EnrollmentStatus {
                        is_enrolled,
                        enrollment_year: String::new(),
                    }),
                }));
            }
        }
    }
    states
}

/// One navigator hop: landing first, then the gate.
fn hop(state: &SessionState, path: &str) -> Option<&'static str> {
    match resolve_landing(state, path) {
        Landing::Redirect(target) => Some(target),
        Landing::Stay => authorize_route(state, path).redirect_target(),
    }
}

/// Follow hops until a path renders. Returns the path and the hop count.
fn settle(state: &SessionState, path: &str) -> (String, usize) {
    let mut current = path.to_string();
    for hops in 0..=MAX_HOPS {
        match hop(state, &current) {
            None => return (current, hops),
            Some(target) => current = target.to_string(),
        }
    }
    panic!("{path} did not settle for {state:?}");
}

#[test]
fn test_pending_session_only_shows_loading() {
    for path in paths() {
        assert_eq!(
            authorize_route(&SessionState::Pending, &path),
            Decision::ShowLoading,
            "{path}"
        );
        assert_eq!(resolve_landing(&SessionState::Pending, &path), Landing::Stay);
    }
}

#[test]
fn test_anonymous_renders_public_entries_only() {
    for path in paths() {
        let decision = authorize_route(&SessionState::Absent, &path);
        if routes::is_public_entry(&path) {
            assert_eq!(decision, Decision::Render, "{path}");
        } else {
            assert_eq!(decision, Decision::RedirectTo(routes::HOME), "{path}");
        }
    }
}

#[test]
fn test_gate_never_redirects_to_the_same_path() {
    for state in states().iter().skip(1) {
        for path in paths() {
            if let Decision::RedirectTo(target) = authorize_route(state, &path) {
                assert_ne!(routes::normalize(&path), target, "{state:?}");
            }
        }
    }
}

#[test]
fn test_decisions_are_deterministic() {
    for state in states() {
        for path in paths() {
            assert_eq!(authorize_route(&state, &path), authorize_route(&state, &path));
            assert_eq!(resolve_landing(&state, &path), resolve_landing(&state, &path));
        }
    }
}

#[test]
fn test_every_navigation_settles_where_it_should() {
    for state in states().iter().skip(1) {
        for path in paths() {
            let (rendered, hops) = settle(state, &path);
            assert!(hops <= MAX_HOPS);

            match state.session() {
                None => assert!(routes::is_public_entry(&rendered), "{path}"),
                Some(session) if !session.is_fully_onboarded() => {
                    assert_eq!(rendered, routes::VERIFICATION_PAGE, "{path} {session:?}");
                }
                Some(session) => {
                    assert!(routes::is_allowed(session.role, &rendered), "{path} {session:?}");
                }
            }
        }
    }
}

#[test]
fn test_unenrolled_learner_never_reaches_dashboard() {
    for state in states() {
        let Some(session) = state.session() else {
            continue;
        };
        if session.role != Role::Learner || session.is_enrolled() {
            continue;
        }
        for path in paths() {
            assert_ne!(settle(&state, &path).0, routes::LEARNER_DASHBOARD);
        }
    }
}

#[test]
fn test_staff_enrollment_record_is_ignored() {
    let all = states();
    for path in paths() {
        for role in [Role::Teacher, Role::Admin] {
            for verified in [false, true] {
                let decisions: Vec<Decision> = all
                    .iter()
                    .filter(|state| {
                        state
                            .session()
                            .is_some_and(|s| s.role == role && s.is_email_verified == verified)
                    })
                    .map(|state| authorize_route(state, &path))
                    .collect();
                assert_eq!(decisions.len(), 3);
                assert!(decisions.windows(2).all(|w| w[0] == w[1]), "{path} {role}");
            }
        }
    }
}

#[test]
fn test_verification_page_sends_onboarded_users_home_to_dashboard() {
    for state in states() {
        let Some(session) = state.session() else {
            continue;
        };
        let decision = authorize_route(&state, routes::VERIFICATION_PAGE);
        if session.is_fully_onboarded() {
            assert_eq!(
                decision,
                Decision::RedirectTo(routes::default_dashboard(session.role))
            );
        } else {
            assert_eq!(decision, Decision::Render);
        }
    }
}
