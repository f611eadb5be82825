//! Gift code type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`GiftCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CodeError {
    /// The input string is empty.
    #[error("gift code cannot be empty")]
    Empty,
    /// The input contains a character outside `[A-Za-z0-9]`.
    #[error("gift code contains invalid character {found:?}")]
    InvalidCharacter {
        /// First offending character.
        found: char,
    },
}

/// A redeemable promotional code.
///
/// ## Constraints
///
/// - Non-empty
/// - ASCII alphanumeric only (`^[A-Za-z0-9]+$`), case is preserved
///
/// ## Examples
///
/// ```
/// use giftsync_core::GiftCode;
///
/// assert!(GiftCode::parse("FREE50").is_ok());
/// assert!(GiftCode::parse("abc123XYZ").is_ok());
///
/// assert!(GiftCode::parse("").is_err());        // empty
/// assert!(GiftCode::parse("FREE-50").is_err()); // punctuation
/// assert!(GiftCode::parse("CAFÉ").is_err());    // non-ASCII
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct GiftCode(String);

impl GiftCode {
    /// Parse a `GiftCode` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or contains anything other than
    /// ASCII letters and digits.
    pub fn parse(s: &str) -> Result<Self, CodeError> {
        if s.is_empty() {
            return Err(CodeError::Empty);
        }

        if let Some(found) = s.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(CodeError::InvalidCharacter { found });
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `GiftCode` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for GiftCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for GiftCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for GiftCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_codes() {
        assert!(GiftCode::parse("FREE50").is_ok());
        assert!(GiftCode::parse("abc").is_ok());
        assert!(GiftCode::parse("0123456789").is_ok());
        assert!(GiftCode::parse("MixedCase99").is_ok());
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(GiftCode::parse(""), Err(CodeError::Empty));
    }

    #[test]
    fn test_parse_reports_first_invalid_character() {
        assert_eq!(
            GiftCode::parse("AB-C_D"),
            Err(CodeError::InvalidCharacter { found: '-' })
        );
        assert_eq!(
            GiftCode::parse("CODE 1"),
            Err(CodeError::InvalidCharacter { found: ' ' })
        );
    }

    #[test]
    fn test_parse_rejects_non_ascii_alphanumerics() {
        assert!(GiftCode::parse("ÅBC").is_err());
        assert!(GiftCode::parse("１２３").is_err());
    }

    #[test]
    fn test_display_preserves_case() {
        let code = GiftCode::parse("WoS2024").unwrap();
        assert_eq!(code.to_string(), "WoS2024");
    }
}
