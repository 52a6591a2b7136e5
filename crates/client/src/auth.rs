//! Login, signup and logout.
//!
//! The only code besides the navigator that writes the session store. Every
//! attempt runs in the same order: field validation, then the challenge
//! token, then the backend. A failure at any step leaves the store as it was.

use std::sync::Arc;
use std::time::Duration;

use school_portal_core::validation::{LoginForm, SignupForm};
use school_portal_core::{Session, SessionState, routes};
use secrecy::SecretString;
use tracing::{info, instrument, warn};

use crate::api::SessionBackend;
use crate::api::types::AuthOutcome;
use crate::challenge::ChallengeToken;
use crate::error::{PortalError, Result, SchemaError};
use crate::session_store::SessionStore;

/// A successful login or signup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSuccess {
    /// Where to go next.
    pub redirect: String,
    /// Message from the backend, if any.
    pub message: Option<String>,
}

/// Where a freshly signed-in user lands when the backend does not say.
#[must_use]
pub fn landing_for(session: &Session) -> &'static str {
    if session.is_fully_onboarded() {
        routes::default_dashboard(session.role)
    } else {
        routes::VERIFICATION_PAGE
    }
}

/// Authentication flows over a [`SessionBackend`].
#[derive(Debug)]
pub struct AuthService<B> {
    backend: B,
    store: Arc<SessionStore>,
    challenge_ttl: Duration,
}

impl<B: SessionBackend> AuthService<B> {
    /// Create the service. `challenge_ttl` bounds the age of challenge tokens.
    #[must_use]
    pub const fn new(backend: B, store: Arc<SessionStore>, challenge_ttl: Duration) -> Self {
        Self {
            backend,
            store,
            challenge_ttl,
        }
    }

    /// The session store this service writes.
    #[must_use]
    pub const fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Sign in with an email or LRN.
    ///
    /// # Errors
    ///
    /// - `Validation` if a field is empty
    /// - `Challenge` if the token is missing or expired (nothing is sent)
    /// - `Auth` with the backend's message if the credentials are refused
    /// - `Network` or `Schema` if the backend could not be reached or read
    #[instrument(skip_all)]
    pub async fn login(&self, form: LoginForm<'_>, challenge: ChallengeToken) -> Result<AuthSuccess> {
        let identifier = form.validate()?;
        let token = challenge.redeem(self.challenge_ttl)?;
        let password = SecretString::from(form.password.to_owned());

        let outcome = self.backend.login(&identifier, &password, &token).await?;
        let (session, redirect, message) = self.accepted("login", outcome).await?;
        let redirect = redirect.unwrap_or_else(|| landing_for(&session).to_string());

        info!(role = %session.role, redirect = %redirect, "Signed in");
        self.store.set(session);
        Ok(AuthSuccess { redirect, message })
    }

    /// Create an account. Always lands on the verification page.
    ///
    /// # Errors
    ///
    /// Same as [`AuthService::login`].
    #[instrument(skip_all)]
    pub async fn signup(&self, form: SignupForm<'_>, challenge: ChallengeToken) -> Result<AuthSuccess> {
        let valid = form.validate()?;
        let token = challenge.redeem(self.challenge_ttl)?;
        let password = SecretString::from(form.password.to_owned());

        let outcome = self.backend.signup(&valid, &password, &token).await?;
        let (session, _, message) = self.accepted("signup", outcome).await?;

        info!(role = %session.role, "Account created");
        self.store.set(session);
        Ok(AuthSuccess {
            redirect: routes::VERIFICATION_PAGE.to_string(),
            message,
        })
    }

    /// Sign out. Always clears the session and returns the home path.
    ///
    /// Telling the backend is best effort; a failure is only logged.
    #[instrument(skip_all)]
    pub async fn logout(&self) -> &'static str {
        self.store.clear();
        if let Err(error) = self.backend.logout().await {
            warn!(error = %error, "Logout request failed; session cleared locally");
        }
        routes::HOME
    }

    /// Turn an auth outcome into the new session, or the rejection error.
    ///
    /// An acceptance without user fields falls back to a session check, since
    /// the backend has set its cookie by then.
    async fn accepted(
        &self,
        endpoint: &'static str,
        outcome: AuthOutcome,
    ) -> Result<(Session, Option<String>, Option<String>)> {
        match outcome {
            AuthOutcome::Rejected { message } => {
                info!(endpoint, "Attempt rejected by backend");
                Err(PortalError::Auth(message))
            }
            AuthOutcome::Accepted {
                session: Some(session),
                redirect,
                message,
            } => Ok((session, redirect, message)),
            AuthOutcome::Accepted {
                session: None,
                redirect,
                message,
            } => match self.backend.check_session().await? {
                Some(session) => Ok((session, redirect, message)),
                None => Err(SchemaError::Decode {
                    endpoint,
                    message: "accepted without a session".to_string(),
                }
                .into()),
            },
        }
    }

    /// The current session state.
    #[must_use]
    pub fn session(&self) -> SessionState {
        self.store.current()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeDelta, Utc};
    use school_portal_core::Role;

    use super::*;
    use crate::testing::{FakeBackend, session};

    const TTL: Duration = Duration::from_secs(120);

    fn service(backend: FakeBackend) -> AuthService<FakeBackend> {
        AuthService::new(backend, Arc::new(SessionStore::new()), TTL)
    }

    fn login_form() -> LoginForm<'static> {
        LoginForm {
            identifier: "gabriela@example.com",
            password: "correct horse",
        }
    }

    fn signup_form() -> SignupForm<'static> {
        SignupForm {
            first_name: "Gabriela",
            last_name: "Silang",
            lrn: "136512140009",
            email: "gabriela@example.com",
            password: "correct horse",
            confirm_password: "correct horse",
        }
    }

    fn accepted(session: Session, redirect: Option<&str>) -> AuthOutcome {
        AuthOutcome::Accepted {
            session: Some(session),
            redirect: redirect.map(String::from),
            message: None,
        }
    }

    #[tokio::test]
    async fn test_login_uses_landing_when_server_is_silent() {
        let auth = service(FakeBackend {
            login_reply: Some(accepted(session(Role::Teacher, false), None)),
            ..FakeBackend::default()
        });
        let success = auth.login(login_form(), ChallengeToken::new("t")).await.unwrap();
        assert_eq!(success.redirect, routes::VERIFICATION_PAGE);
        assert!(matches!(auth.session(), SessionState::Present(s) if s.role == Role::Teacher));
    }

    #[tokio::test]
    async fn test_login_prefers_server_redirect() {
        let auth = service(FakeBackend {
            login_reply: Some(accepted(session(Role::Admin, true), Some("/manage-users"))),
            ..FakeBackend::default()
        });
        let success = auth.login(login_form(), ChallengeToken::new("t")).await.unwrap();
        assert_eq!(success.redirect, "/manage-users");
    }

    #[tokio::test]
    async fn test_failed_login_leaves_session_unchanged() {
        let auth = service(FakeBackend {
            login_reply: Some(AuthOutcome::Rejected {
                message: "Invalid credentials".to_string(),
            }),
            ..FakeBackend::default()
        });
        let existing = session(Role::Learner, true);
        auth.store().set(existing.clone());

        let err = auth.login(login_form(), ChallengeToken::new("t")).await.unwrap_err();
        assert_eq!(err.user_message(), "Invalid credentials");
        assert_eq!(auth.session(), SessionState::Present(existing));
    }

    #[tokio::test]
    async fn test_expired_or_empty_token_sends_nothing() {
        let auth = service(FakeBackend::default());
        let stale = ChallengeToken::issued_at("t", Utc::now() - TimeDelta::seconds(600));
        assert!(matches!(
            auth.login(login_form(), stale).await,
            Err(PortalError::Challenge(_))
        ));
        assert!(matches!(
            auth.signup(signup_form(), ChallengeToken::new("")).await,
            Err(PortalError::Challenge(_))
        ));
        assert!(auth.backend.calls().is_empty());
        assert!(auth.session().is_pending());
    }

    #[tokio::test]
    async fn test_validation_runs_before_challenge() {
        let auth = service(FakeBackend::default());
        let form = LoginForm {
            identifier: "",
            password: "",
        };
        assert!(matches!(
            auth.login(form, ChallengeToken::new("")).await,
            Err(PortalError::Validation(_))
        ));
        assert!(auth.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_signup_always_lands_on_verification() {
        let auth = service(FakeBackend {
            signup_reply: Some(accepted(session(Role::Learner, true), Some("/learner-dashboard"))),
            ..FakeBackend::default()
        });
        let success = auth.signup(signup_form(), ChallengeToken::new("t")).await.unwrap();
        assert_eq!(success.redirect, routes::VERIFICATION_PAGE);
        assert_eq!(auth.backend.calls(), vec!["signup"]);
    }

    #[tokio::test]
    async fn test_signup_without_user_fields_checks_session() {
        let backend = FakeBackend::signed_in(session(Role::Learner, false));
        let auth = service(FakeBackend {
            signup_reply: Some(AuthOutcome::Accepted {
                session: None,
                redirect: None,
                message: Some("Check your inbox".to_string()),
            }),
            ..backend
        });
        let success = auth.signup(signup_form(), ChallengeToken::new("t")).await.unwrap();
        assert_eq!(success.message.as_deref(), Some("Check your inbox"));
        assert_eq!(auth.backend.calls(), vec!["signup", "check_session"]);
        assert!(matches!(auth.session(), SessionState::Present(_)));
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_backend_fails() {
        let auth = service(FakeBackend {
            logout_fails: true,
            ..FakeBackend::signed_in(session(Role::Admin, true))
        });
        auth.store().set(session(Role::Admin, true));
        assert_eq!(auth.logout().await, routes::HOME);
        assert_eq!(auth.session(), SessionState::Absent);
        assert_eq!(auth.backend.calls(), vec!["logout"]);
    }

    #[test]
    fn test_landing_for() {
        assert_eq!(landing_for(&session(Role::Admin, true)), routes::ADMIN_DASHBOARD);
        assert_eq!(landing_for(&session(Role::Learner, false)), routes::VERIFICATION_PAGE);
    }
}
