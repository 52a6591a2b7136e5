//! Human-verification challenge tokens.
//!
//! The CAPTCHA widget is solved outside this crate; callers hand over the
//! resulting token together with the time it was issued. A token is good for
//! one attempt: [`ChallengeToken::redeem`] consumes it.

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Why a challenge token was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChallengeError {
    /// No token was supplied.
    #[error("complete the human verification challenge first")]
    Missing,

    /// The token outlived its lifetime.
    #[error("human verification expired, solve the challenge again")]
    Expired,
}

/// A solved challenge, valid for a single login or signup attempt.
///
/// Implements `Debug` manually; the token itself is never logged.
pub struct ChallengeToken {
    token: String,
    issued_at: DateTime<Utc>,
}

impl std::fmt::Debug for ChallengeToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChallengeToken")
            .field("token", &"[REDACTED]")
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

impl ChallengeToken {
    /// A token solved just now.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self::issued_at(token, Utc::now())
    }

    /// A token solved at `issued_at`.
    #[must_use]
    pub fn issued_at(token: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            issued_at,
        }
    }

    /// Spend the token, checking it against `ttl` at `now`.
    ///
    /// # Errors
    ///
    /// Returns `Missing` for a blank token and `Expired` once `ttl` has
    /// passed since it was issued.
    pub fn redeem_at(self, ttl: Duration, now: DateTime<Utc>) -> Result<String, ChallengeError> {
        let token = self.token.trim();
        if token.is_empty() {
            return Err(ChallengeError::Missing);
        }
        let age = now.signed_duration_since(self.issued_at);
        // A clock that moved backwards gives a negative age; treat it as fresh.
        if age.to_std().is_ok_and(|age| age > ttl) {
            return Err(ChallengeError::Expired);
        }
        Ok(token.to_owned())
    }

    /// Spend the token, checking it against `ttl` now.
    ///
    /// # Errors
    ///
    /// See [`ChallengeToken::redeem_at`].
    pub fn redeem(self, ttl: Duration) -> Result<String, ChallengeError> {
        self.redeem_at(ttl, Utc::now())
    }
}
