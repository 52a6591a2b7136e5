//! In-memory backend for unit tests.

use std::sync::Mutex;

use school_portal_core::validation::ValidSignup;
use school_portal_core::{EnrollmentStatus, Role, Session, UserId};
use secrecy::SecretString;

use crate::api::SessionBackend;
use crate::api::types::AuthOutcome;
use crate::error::{PortalError, Result};

/// A signed-in user whose enrollment is in order.
pub fn session(role: Role, verified: bool) -> Session {
    Session {
        id: UserId::new("21"),
        role,
        first_name: "Gabriela".to_string(),
        email: "gabriela@example.com".to_string(),
        lrn: None,
        is_email_verified: verified,
        enrollment_status: Some(EnrollmentStatus {
            is_enrolled: true,
            enrollment_year: "2025-2026".to_string(),
        }),
    }
}

/// Backend that answers from fixed replies and records every call.
///
/// An accepted login or signup becomes the session reported by later
/// session checks, the way a session cookie would.
#[derive(Default)]
pub struct FakeBackend {
    pub session: Mutex<Option<Session>>,
    pub check_fails: bool,
    pub login_reply: Option<AuthOutcome>,
    pub signup_reply: Option<AuthOutcome>,
    pub logout_fails: bool,
    pub calls: Mutex<Vec<&'static str>>,
}

#[allow(clippy::unwrap_used)]
impl FakeBackend {
    pub fn signed_in(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    fn reply(&self, reply: Option<&AuthOutcome>) -> Result<AuthOutcome> {
        let outcome = reply
            .cloned()
            .ok_or_else(|| PortalError::Network("no reply scripted".to_string()))?;
        if let AuthOutcome::Accepted {
            session: Some(session),
            ..
        } = &outcome
        {
            *self.session.lock().unwrap() = Some(session.clone());
        }
        Ok(outcome)
    }
}

#[allow(clippy::unwrap_used)]
impl SessionBackend for FakeBackend {
    async fn check_session(&self) -> Result<Option<Session>> {
        self.record("check_session");
        if self.check_fails {
            return Err(PortalError::Network("connection reset".to_string()));
        }
        Ok(self.session.lock().unwrap().clone())
    }

    async fn login(&self, _: &str, _: &SecretString, _: &str) -> Result<AuthOutcome> {
        self.record("login");
        self.reply(self.login_reply.as_ref())
    }

    async fn signup(&self, _: &ValidSignup, _: &SecretString, _: &str) -> Result<AuthOutcome> {
        self.record("signup");
        self.reply(self.signup_reply.as_ref())
    }

    async fn logout(&self) -> Result<()> {
        self.record("logout");
        *self.session.lock().unwrap() = None;
        if self.logout_fails {
            return Err(PortalError::Network("logout returned 500".to_string()));
        }
        Ok(())
    }
}
