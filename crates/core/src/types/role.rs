//! Portal roles.

use serde::{Deserialize, Serialize};

/// Error returned when a role string does not name a portal role.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid role: {0}")]
pub struct RoleError(pub String);

/// The role a signed-in user holds.
///
/// The backend reports roles as free-form strings with inconsistent casing.
/// They are normalised into this enum once, when a response is parsed, and
/// every other component works with the enum only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A student. Must also be enrolled to be fully onboarded.
    Learner,
    /// Teaching staff.
    Teacher,
    /// School administrator.
    Admin,
}

impl Role {
    /// All roles, in menu order.
    pub const ALL: [Self; 3] = [Self::Learner, Self::Teacher, Self::Admin];

    /// The lowercase wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Learner => "learner",
            Self::Teacher => "teacher",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim();
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(normalized))
            .ok_or_else(|| RoleError(s.to_owned()))
    }
}
