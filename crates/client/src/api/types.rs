//! Wire schemas for the portal backend.
//!
//! The backend speaks a mix of snake_case and camelCase and is loose about
//! scalar types. Everything is parsed here into the canonical core types;
//! nothing outside this module sees a wire struct.

use school_portal_core::{EnrollmentStatus, Role, Session, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;

/// A scalar the backend sends as either a number or a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Text(String),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Self::Int(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

/// `is_email_verified`: `"yes"` (any case) or JSON `true` means verified.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VerifiedFlag {
    Bool(bool),
    Text(String),
}

impl VerifiedFlag {
    fn is_verified(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Text(s) => s.trim().eq_ignore_ascii_case("yes"),
        }
    }
}

/// User fields shared by `check_session`, `login` and `signup`.
#[derive(Debug, Deserialize)]
struct WireUser {
    user_id: Scalar,
    #[serde(default)]
    lrn: Option<Scalar>,
    user_type: String,
    #[serde(default, alias = "firstName")]
    first_name: String,
    #[serde(default)]
    is_email_verified: Option<VerifiedFlag>,
    #[serde(default)]
    email: String,
    #[serde(default, rename = "enrollmentStatus")]
    enrollment_status: Option<EnrollmentStatus>,
}

impl TryFrom<WireUser> for Session {
    type Error = SchemaError;

    fn try_from(user: WireUser) -> Result<Self, Self::Error> {
        let role: Role = user
            .user_type
            .parse()
            .map_err(|_| SchemaError::UnknownRole(user.user_type.clone()))?;
        Ok(Self {
            id: UserId::new(user.user_id.into_text()),
            role,
            first_name: user.first_name,
            email: user.email,
            lrn: user
                .lrn
                .map(Scalar::into_text)
                .filter(|lrn| !lrn.is_empty()),
            is_email_verified: user
                .is_email_verified
                .as_ref()
                .is_some_and(VerifiedFlag::is_verified),
            enrollment_status: user.enrollment_status,
        })
    }
}

fn parse_value(endpoint: &'static str, body: &[u8]) -> Result<Value, SchemaError> {
    serde_json::from_slice(body).map_err(|e| SchemaError::decode(endpoint, &e))
}

fn parse_user(endpoint: &'static str, value: Value) -> Result<Session, SchemaError> {
    let user: WireUser =
        serde_json::from_value(value).map_err(|e| SchemaError::decode(endpoint, &e))?;
    Session::try_from(user)
}

/// Parse a `GET check_session` body. `None` means signed out.
pub(crate) fn parse_check_session(body: &[u8]) -> Result<Option<Session>, SchemaError> {
    const ENDPOINT: &str = "check_session";

    #[derive(Deserialize)]
    struct LoggedIn {
        #[serde(default, rename = "isLoggedIn")]
        is_logged_in: bool,
    }

    let value = parse_value(ENDPOINT, body)?;
    let flag: LoggedIn =
        LoggedIn::deserialize(&value).map_err(|e| SchemaError::decode(ENDPOINT, &e))?;
    if !flag.is_logged_in {
        return Ok(None);
    }
    parse_user(ENDPOINT, value).map(Some)
}

/// Result of a login or signup attempt, as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The backend accepted the attempt.
    Accepted {
        /// The new session, when the response carries the user fields.
        session: Option<Session>,
        /// Server-chosen destination.
        redirect: Option<String>,
        message: Option<String>,
    },
    /// The backend refused the attempt.
    Rejected { message: String },
}

/// Parse a `POST login` or `POST signup` body.
pub(crate) fn parse_auth_outcome(
    endpoint: &'static str,
    body: &[u8],
) -> Result<AuthOutcome, SchemaError> {
    #[derive(Deserialize)]
    struct Status {
        success: bool,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        redirect: Option<String>,
    }

    let value = parse_value(endpoint, body)?;
    let status = Status::deserialize(&value).map_err(|e| SchemaError::decode(endpoint, &e))?;
    if !status.success {
        return Ok(AuthOutcome::Rejected {
            message: status
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "Request was rejected".to_string()),
        });
    }

    let has_user = value.get("user_type").is_some();
    let session = if has_user {
        Some(parse_user(endpoint, value)?)
    } else {
        None
    };
    Ok(AuthOutcome::Accepted {
        session,
        redirect: status.redirect.filter(|r| is_local_path(r)),
        message: status.message,
    })
}

/// Same-origin absolute path. `//host` and `/\host` are read as
/// protocol-relative by browsers and leave the portal.
fn is_local_path(redirect: &str) -> bool {
    redirect.starts_with('/') && !redirect.starts_with("//") && !redirect.starts_with("/\\")
}

/// CRUD response envelope: `{success, message?, data?}`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

/// `POST login` request body.
#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub login: &'a str,
    pub password: &'a str,
    #[serde(rename = "recaptchaToken")]
    pub recaptcha_token: &'a str,
}

/// `POST signup` request body.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SignupRequest<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub lrn: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub recaptcha_token: &'a str,
}
