//! Per-navigation state machine.
//!
//! ```text
//! Idle ──▶ Checking ──▶ Authorized
//!                   ├─▶ Redirecting ──────▶ Idle (at the new path)
//!                   └─▶ Unauthenticated ──▶ Idle (at "/")
//! ```
//!
//! Every navigation refreshes the session, applies the landing resolver and
//! then the gate. Redirects are followed until a path renders or
//! [`MAX_REDIRECTS`] is reached.

use std::sync::Arc;

use school_portal_core::{Landing, SessionState, authorize_route, resolve_landing};
use tracing::{debug, instrument, warn};

use crate::api::SessionBackend;
use crate::error::{PortalError, Result};
use crate::session_store::{Refreshed, SessionStore};

/// Redirects followed before a navigation is abandoned.
pub const MAX_REDIRECTS: usize = 8;

/// Where the navigator is within one navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    /// Waiting for a path change.
    Idle,
    /// Session check in flight.
    Checking,
    /// The path may be rendered.
    Authorized,
    /// Onboarding or role checks sent the user elsewhere.
    Redirecting,
    /// The backend reported no session on a non-public path. A failed session
    /// check is sent home as `Redirecting` instead.
    Unauthenticated,
}

/// One redirect taken during a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub from: String,
    pub to: &'static str,
    /// `Redirecting` or `Unauthenticated`.
    pub reason: NavState,
}

/// Result of a completed navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// Path originally asked for.
    pub requested: String,
    /// Path that ended up rendered.
    pub path: String,
    /// Redirects taken on the way, in order.
    pub redirects: Vec<Redirect>,
    /// Session the final decision was made with.
    pub session: SessionState,
}

impl Navigation {
    /// Whether the requested path rendered without a redirect.
    #[must_use]
    pub fn rendered_as_requested(&self) -> bool {
        self.redirects.is_empty()
    }
}

/// Drives navigations for one client.
#[derive(Debug)]
pub struct Navigator<B> {
    backend: B,
    store: Arc<SessionStore>,
    state: NavState,
    path: Option<String>,
}

impl<B: SessionBackend> Navigator<B> {
    #[must_use]
    pub const fn new(backend: B, store: Arc<SessionStore>) -> Self {
        Self {
            backend,
            store,
            state: NavState::Idle,
            path: None,
        }
    }

    /// Current state of the machine.
    #[must_use]
    pub const fn state(&self) -> NavState {
        self.state
    }

    /// Last rendered path, if any navigation has completed.
    #[must_use]
    pub fn current_path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Navigate to `path`, following redirects.
    ///
    /// # Errors
    ///
    /// Returns `RedirectLoop` after [`MAX_REDIRECTS`] redirects.
    #[instrument(skip(self))]
    pub async fn navigate(&mut self, path: &str) -> Result<Navigation> {
        let mut current = path.to_string();
        let mut redirects = Vec::new();

        loop {
            let (state, target) = self.step(&current).await;
            let Some(target) = target else {
                self.path = Some(current.clone());
                return Ok(Navigation {
                    requested: path.to_string(),
                    path: current,
                    redirects,
                    session: state,
                });
            };

            if redirects.len() == MAX_REDIRECTS {
                warn!(requested = %path, at = %current, "Redirect loop");
                self.state = NavState::Idle;
                return Err(PortalError::RedirectLoop {
                    hops: MAX_REDIRECTS,
                    path: current,
                });
            }
            debug!(from = %current, to = target, reason = ?self.state, "Redirecting");
            redirects.push(Redirect {
                from: std::mem::replace(&mut current, target.to_string()),
                to: target,
                reason: self.state,
            });
        }
    }

    /// Run one Idle → Checking → outcome cycle at `path`.
    ///
    /// Returns the session used and the redirect target, if any.
    async fn step(&mut self, path: &str) -> (SessionState, Option<&'static str>) {
        self.state = NavState::Checking;
        let mut refreshed = self.store.refresh(&self.backend).await;
        if refreshed.state.is_pending() {
            // Superseded by a newer refresh; decide on its result instead.
            refreshed = self
                .store
                .subscribe()
                .settled_refresh()
                .await
                .unwrap_or(Refreshed {
                    state: SessionState::Absent,
                    check_failed: false,
                });
        }
        let Refreshed {
            state,
            check_failed,
        } = refreshed;

        let target = match resolve_landing(&state, path) {
            Landing::Redirect(target) => Some(target),
            Landing::Stay => authorize_route(&state, path).redirect_target(),
        };
        self.state = match (target, &state) {
            (None, _) => NavState::Authorized,
            (Some(_), SessionState::Absent) if !check_failed => NavState::Unauthenticated,
            (Some(_), _) => NavState::Redirecting,
        };
        (state, target)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use school_portal_core::validation::ValidSignup;
    use school_portal_core::{Role, Session};
    use school_portal_core::routes::*;
    use secrecy::SecretString;

    use super::*;
    use crate::api::types::AuthOutcome;
    use crate::testing::{FakeBackend, session};

    /// Reports the learner as verified on every other check, starting unverified.
    #[derive(Default)]
    struct FlakyOnboarding {
        onboarded: AtomicBool,
    }

    impl SessionBackend for FlakyOnboarding {
        async fn check_session(&self) -> Result<Option<Session>> {
            let onboarded = self.onboarded.fetch_xor(true, Ordering::SeqCst);
            Ok(Some(session(Role::Learner, onboarded)))
        }

        async fn login(&self, _: &str, _: &SecretString, _: &str) -> Result<AuthOutcome> {
            unreachable!("not scripted")
        }

        async fn signup(&self, _: &ValidSignup, _: &SecretString, _: &str) -> Result<AuthOutcome> {
            unreachable!("not scripted")
        }

        async fn logout(&self) -> Result<()> {
            Ok(())
        }
    }

    fn navigator(backend: FakeBackend) -> Navigator<FakeBackend> {
        Navigator::new(backend, Arc::new(SessionStore::new()))
    }

    #[tokio::test]
    async fn test_authorized_without_redirects() {
        let mut nav = navigator(FakeBackend::signed_in(session(Role::Teacher, true)));
        let result = nav.navigate(CLASS_MASTERLIST).await.unwrap();
        assert!(result.rendered_as_requested());
        assert_eq!(nav.state(), NavState::Authorized);
        assert_eq!(nav.current_path(), Some(CLASS_MASTERLIST));
    }

    #[tokio::test]
    async fn test_anonymous_ends_on_home() {
        let mut nav = navigator(FakeBackend::default());
        let result = nav.navigate(ADMIN_DASHBOARD).await.unwrap();
        assert_eq!(result.path, HOME);
        assert_eq!(result.redirects[0].reason, NavState::Unauthenticated);
        assert_eq!(result.session, SessionState::Absent);
    }

    #[tokio::test]
    async fn test_failed_session_check_redirects_home() {
        let mut nav = navigator(FakeBackend {
            check_fails: true,
            ..FakeBackend::signed_in(session(Role::Admin, true))
        });
        let result = nav.navigate(MANAGE_USERS).await.unwrap();
        assert_eq!(result.path, HOME);
        assert_eq!(result.redirects[0].reason, NavState::Redirecting);
        assert_eq!(result.session, SessionState::Absent);
    }

    #[tokio::test]
    async fn test_unverified_user_pinned_to_verification() {
        let mut nav = navigator(FakeBackend::signed_in(session(Role::Learner, false)));
        let result = nav.navigate(LEARNER_DASHBOARD).await.unwrap();
        assert_eq!(result.path, VERIFICATION_PAGE);
        assert_eq!(result.redirects.len(), 1);
        assert_eq!(result.redirects[0].reason, NavState::Redirecting);
    }

    #[tokio::test]
    async fn test_role_mismatch_lands_on_dashboard() {
        let mut nav = navigator(FakeBackend::signed_in(session(Role::Admin, true)));
        let result = nav.navigate(TEACHER_DASHBOARD).await.unwrap();
        assert_eq!(result.path, ADMIN_DASHBOARD);
    }

    #[tokio::test]
    async fn test_every_hop_refreshes_the_session() {
        let backend = FakeBackend::signed_in(session(Role::Learner, false));
        let mut nav = navigator(backend);
        nav.navigate(HOME).await.unwrap();
        assert_eq!(nav.backend.calls(), vec!["check_session", "check_session"]);
    }

    #[tokio::test]
    async fn test_redirect_loop_is_bounded() {
        let mut nav = Navigator::new(FlakyOnboarding::default(), Arc::new(SessionStore::new()));
        let err = nav.navigate(LEARNER_DASHBOARD).await.unwrap_err();
        assert!(matches!(err, PortalError::RedirectLoop { hops: MAX_REDIRECTS, .. }));
        assert_eq!(nav.current_path(), None);
    }
}
