//! Route authorization gate.
//!
//! [`authorize`] decides, for one navigation, whether the requested view is
//! rendered, the user is sent elsewhere, or a loading indicator is shown. It is
//! a pure function of its inputs: calling it twice with the same session and
//! path yields the same [`Decision`].
//!
//! # Rules (first match wins)
//!
//! 1. Session check in flight - show loading.
//! 2. No session - render public entry paths, otherwise redirect to `/`.
//! 3. Verification page - onboarded users go to their dashboard, everyone
//!    else sees the verification UI.
//! 4. Onboarding incomplete - redirect to the verification page. This covers
//!    the unenrolled learner opening the learner dashboard.
//! 5. Role not allowed on the path - redirect to `/`.
//! 6. Render.

use crate::routes::{self, Access};
use crate::{Role, SessionState};

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Show the requested view.
    Render,
    /// Navigate to another path instead.
    RedirectTo(&'static str),
    /// A session check is in flight; show a wait indicator only.
    ShowLoading,
}

impl Decision {
    /// The redirect target, if this is a redirect.
    #[must_use]
    pub const fn redirect_target(self) -> Option<&'static str> {
        match self {
            Self::RedirectTo(path) => Some(path),
            Self::Render | Self::ShowLoading => None,
        }
    }
}

/// Decide what to do with a navigation to `requested_path`.
///
/// `allowed_roles` lists the roles that may see the view; it is ignored for
/// public entry paths and for the verification page.
#[must_use]
pub fn authorize(state: &SessionState, requested_path: &str, allowed_roles: &[Role]) -> Decision {
    let session = match state {
        SessionState::Pending => return Decision::ShowLoading,
        SessionState::Absent if routes::is_public_entry(requested_path) => {
            return Decision::Render;
        }
        SessionState::Absent => return Decision::RedirectTo(routes::HOME),
        SessionState::Present(session) => session,
    };

    if routes::is_verification_page(requested_path) {
        // A learner is done once verified and enrolled; staff once verified.
        return if session.is_fully_onboarded() {
            Decision::RedirectTo(routes::default_dashboard(session.role))
        } else {
            Decision::Render
        };
    }

    // Applies to teachers and admins too: unverified staff are held on the
    // verification page like learners.
    if !session.is_fully_onboarded() {
        return Decision::RedirectTo(routes::VERIFICATION_PAGE);
    }

    if !allowed_roles.contains(&session.role) {
        return Decision::RedirectTo(routes::HOME);
    }

    Decision::Render
}

/// Authorize a navigation using the route table for the allowed roles.
///
/// Public entry routes render for everyone once the session check has
/// finished; unknown paths allow no role at all.
#[must_use]
pub fn authorize_route(state: &SessionState, requested_path: &str) -> Decision {
    match routes::lookup(requested_path).map(|route| route.access) {
        Some(Access::Public) if state.is_pending() => Decision::ShowLoading,
        Some(Access::Public) => Decision::Render,
        Some(Access::Verification | Access::Roles(_)) | None => authorize(
            state,
            requested_path,
            routes::allowed_roles(requested_path),
        ),
    }
}
