//! Offline gate evaluation.
//!
//! # Usage
//!
//! ```bash
//! # Unverified learner opening their dashboard
//! portal gate --path /learner-dashboard --role learner
//!
//! # Verified, enrolled learner on the verification page
//! portal gate --path /verification-page --role learner --verified --enrolled
//!
//! # Nobody signed in
//! portal gate --path /admin-dashboard --anonymous
//! ```

use school_portal_core::routes;
use school_portal_core::{
    Decision, EnrollmentStatus, Landing, Role, Session, SessionState, UserId, authorize_route,
    resolve_landing,
};
use thiserror::Error;

/// Errors from the `gate` command.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GateError {
    /// A signed-in session needs a role.
    #[error("--role is required unless --anonymous or --pending is given")]
    MissingRole,
}

/// Session described by command-line flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionFlags {
    pub role: Option<Role>,
    pub verified: bool,
    pub enrolled: bool,
    pub anonymous: bool,
    pub pending: bool,
}

impl SessionFlags {
    /// Build the session state these flags describe.
    ///
    /// # Errors
    ///
    /// Returns `MissingRole` for a signed-in session without a role.
    pub fn to_state(self) -> Result<SessionState, GateError> {
        if self.pending {
            return Ok(SessionState::Pending);
        }
        if self.anonymous {
            return Ok(SessionState::Absent);
        }
        let role = self.role.ok_or(GateError::MissingRole)?;
        Ok(SessionState::Present(Session {
            id: UserId::new("cli"),
            role,
            first_name: "CLI".to_string(),
            email: "cli@localhost".to_string(),
            lrn: None,
            is_email_verified: self.verified,
            enrollment_status: (role == Role::Learner).then(|| EnrollmentStatus {
                is_enrolled: self.enrolled,
                enrollment_year: String::new(),
            }),
        }))
    }
}

/// Both decisions for one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateReport {
    pub decision: Decision,
    pub landing: Landing,
}

/// Evaluate the gate and the landing resolver.
#[must_use]
pub fn evaluate(state: &SessionState, path: &str) -> GateReport {
    GateReport {
        decision: authorize_route(state, path),
        landing: resolve_landing(state, path),
    }
}

fn describe_session(state: &SessionState) -> String {
    match state {
        SessionState::Pending => "pending".to_string(),
        SessionState::Absent => "none".to_string(),
        SessionState::Present(session) => {
            let verified = if session.is_email_verified { "verified" } else { "unverified" };
            match session.role {
                Role::Learner if session.is_enrolled() => format!("learner ({verified}, enrolled)"),
                Role::Learner => format!("learner ({verified}, not enrolled)"),
                role => format!("{role} ({verified})"),
            }
        }
    }
}

fn describe_decision(decision: Decision) -> String {
    match decision {
        Decision::Render => "render".to_string(),
        Decision::RedirectTo(path) => format!("redirect -> {path}"),
        Decision::ShowLoading => "show loading".to_string(),
    }
}

fn describe_landing(landing: Landing) -> String {
    match landing {
        Landing::Stay => "stay".to_string(),
        Landing::Redirect(path) => format!("redirect -> {path}"),
    }
}

/// Print the gate outcome for `path`.
///
/// # Errors
///
/// Returns `GateError` if the flags do not describe a session.
#[allow(clippy::print_stdout)]
pub fn run(path: &str, flags: SessionFlags) -> Result<(), GateError> {
    let state = flags.to_state()?;
    let report = evaluate(&state, path);
    let route = routes::lookup(path).map_or("(unknown)", |route| route.pattern);

    println!("path:     {path}");
    println!("route:    {route}");
    println!("session:  {}", describe_session(&state));
    println!("gate:     {}", describe_decision(report.decision));
    println!("landing:  {}", describe_landing(report.landing));
    Ok(())
}
