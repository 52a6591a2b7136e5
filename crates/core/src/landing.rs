//! Landing redirects applied after every session refresh.
//!
//! Where the gate only runs when a protected view is entered, the landing
//! resolver runs on every navigation once the session has been fetched. It
//! keeps users who have not finished onboarding on the verification page and
//! keeps onboarded users inside their role's allowlist.

use crate::{SessionState, routes};

/// Where the user should be after a session refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landing {
    /// The current path is fine.
    Stay,
    /// Move to this path.
    Redirect(&'static str),
}

/// Resolve the landing destination for `current_path`.
#[must_use]
pub fn resolve_landing(state: &SessionState, current_path: &str) -> Landing {
    let session = match state {
        SessionState::Pending => return Landing::Stay,
        SessionState::Absent if routes::is_public_entry(current_path) => return Landing::Stay,
        SessionState::Absent => return Landing::Redirect(routes::HOME),
        SessionState::Present(session) => session,
    };

    if !session.is_fully_onboarded() {
        return if routes::is_verification_page(current_path) {
            Landing::Stay
        } else {
            Landing::Redirect(routes::VERIFICATION_PAGE)
        };
    }

    if routes::is_allowed(session.role, current_path) {
        Landing::Stay
    } else {
        Landing::Redirect(routes::default_dashboard(session.role))
    }
}
