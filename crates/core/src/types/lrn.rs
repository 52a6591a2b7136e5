//! Learner Reference Number.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Lrn`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LrnError {
    /// The input is empty after trimming.
    #[error("LRN is required")]
    Empty,
    /// The input contains something other than ASCII digits.
    #[error("LRN must contain digits only")]
    NonDigit,
    /// The input has the wrong number of digits.
    #[error("LRN must be exactly {expected} digits (got {actual})")]
    Length {
        /// Required digit count.
        expected: usize,
        /// Digit count supplied.
        actual: usize,
    },
}

/// A learner reference number, the permanent 12-digit learner identifier
/// collected at signup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Lrn(String);

impl Lrn {
    /// Number of digits in an LRN.
    pub const LENGTH: usize = 12;

    /// Parse an `Lrn` from user input.
    ///
    /// # Errors
    ///
    /// Returns an [`LrnError`] if the trimmed input is empty, contains a
    /// non-digit, or is not exactly [`Lrn::LENGTH`] digits long.
    pub fn parse(s: &str) -> Result<Self, LrnError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(LrnError::Empty);
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LrnError::NonDigit);
        }
        if s.len() != Self::LENGTH {
            return Err(LrnError::Length {
                expected: Self::LENGTH,
                actual: s.len(),
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the LRN digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Lrn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Lrn {
    type Err = LrnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let lrn = Lrn::parse(" 123456789012 ").unwrap();
        assert_eq!(lrn.as_str(), "123456789012");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Lrn::parse(""), Err(LrnError::Empty));
        assert_eq!(Lrn::parse("12345678901a"), Err(LrnError::NonDigit));
        assert_eq!(
            Lrn::parse("12345"),
            Err(LrnError::Length {
                expected: 12,
                actual: 5
            })
        );
    }
}
