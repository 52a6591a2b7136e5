//! Session types.
//!
//! A [`Session`] is the client's view of the signed-in user. It is built from
//! a backend response at the HTTP boundary and replaced wholesale whenever the
//! session is checked again; nothing mutates it field by field.

use serde::{Deserialize, Serialize};

use super::{Role, UserId};

/// Learner enrollment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentStatus {
    /// Whether the learner is enrolled for the current school year.
    pub is_enrolled: bool,
    /// School year of the enrollment (e.g. "2025-2026"). Empty when unknown.
    #[serde(default)]
    pub enrollment_year: String,
}

/// The authenticated user as held by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque backend user identifier.
    pub id: UserId,
    /// Normalised role.
    pub role: Role,
    /// Display name.
    pub first_name: String,
    /// Email as reported by the backend.
    pub email: String,
    /// Learner reference number, when the backend sends one.
    #[serde(default)]
    pub lrn: Option<String>,
    /// Whether the user has confirmed their email address.
    pub is_email_verified: bool,
    /// Enrollment record. Only meaningful for learners.
    #[serde(default)]
    pub enrollment_status: Option<EnrollmentStatus>,
}

impl Session {
    /// Whether a learner session has an enrollment record marked enrolled.
    ///
    /// Always `false` for a learner with no enrollment record.
    #[must_use]
    pub fn is_enrolled(&self) -> bool {
        self.enrollment_status
            .as_ref()
            .is_some_and(|status| status.is_enrolled)
    }

    /// Whether the user has finished onboarding.
    ///
    /// Learners need a verified email *and* an enrollment; every other role
    /// only needs a verified email.
    #[must_use]
    pub fn is_fully_onboarded(&self) -> bool {
        match self.role {
            Role::Learner => self.is_email_verified && self.is_enrolled(),
            Role::Teacher | Role::Admin => self.is_email_verified,
        }
    }
}

/// The session slot owned by the session store.
///
/// This is the tri-state loading flag plus the record itself: while a session
/// check is outstanding the state is [`SessionState::Pending`] and no
/// authorization decision other than "show loading" may be made.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// A session check is in flight.
    #[default]
    Pending,
    /// No user is signed in.
    Absent,
    /// A user is signed in.
    Present(Session),
}

impl SessionState {
    /// The session, if one is present.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        match self {
            Self::Present(session) => Some(session),
            Self::Pending | Self::Absent => None,
        }
    }

    /// Whether a session check is in flight.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl From<Option<Session>> for SessionState {
    fn from(session: Option<Session>) -> Self {
        session.map_or(Self::Absent, Self::Present)
    }
}
