//! Client error taxonomy.

use school_portal_core::validation::ValidationErrors;
use thiserror::Error;

use crate::challenge::ChallengeError;
use crate::config::ConfigError;

/// A backend response that did not match the endpoint's schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The body is not JSON of the expected shape.
    #[error("{endpoint}: {message}")]
    Decode {
        endpoint: &'static str,
        message: String,
    },

    /// `user_type` named a role the client does not know.
    #[error("unknown role `{0}`")]
    UnknownRole(String),

    /// `success: true` without the `data` member.
    #[error("{0}: successful response without data")]
    MissingData(&'static str),
}

impl SchemaError {
    pub(crate) fn decode(endpoint: &'static str, error: &serde_json::Error) -> Self {
        Self::Decode {
            endpoint,
            message: error.to_string(),
        }
    }
}

/// Errors surfaced by the portal client.
#[derive(Debug, Error)]
pub enum PortalError {
    /// The request could not be sent, timed out, or came back non-2xx.
    #[error("Network error: {0}")]
    Network(String),

    /// The response could not be parsed or validated.
    #[error("Unexpected response: {0}")]
    Schema(#[from] SchemaError),

    /// The backend refused the request (`success: false`).
    #[error("{0}")]
    Auth(String),

    /// The human-verification token was missing or stale.
    #[error(transparent)]
    Challenge(#[from] ChallengeError),

    /// Client-side field checks failed.
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// Configuration is missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The navigator gave up following redirects.
    #[error("Redirect loop: gave up after {hops} redirects at {path}")]
    RedirectLoop { hops: usize, path: String },
}

impl From<reqwest::Error> for PortalError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl PortalError {
    /// Whether the error came from the transport or the response body.
    ///
    /// A session check that fails this way is treated as "signed out".
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Schema(_))
    }

    /// Message suitable for showing next to a form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Could not reach the server. Please try again.".to_string(),
            Self::Schema(_) => "The server sent an unexpected response.".to_string(),
            Self::Auth(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, PortalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(PortalError::Network("refused".to_string()).is_transport());
        assert!(PortalError::from(SchemaError::MissingData("tags")).is_transport());
        assert!(!PortalError::Auth("Invalid credentials".to_string()).is_transport());
        assert!(!PortalError::from(ChallengeError::Expired).is_transport());
    }

    #[test]
    fn test_user_message_keeps_backend_text() {
        let error = PortalError::Auth("Account locked".to_string());
        assert_eq!(error.user_message(), "Account locked");
        assert!(
            PortalError::Network("dns error".to_string())
                .user_message()
                .starts_with("Could not reach")
        );
    }
}
