//! Gift code issue dates.
//!
//! The remote API speaks `DD.MM.YYYY`; the local store keeps ISO `YYYY-MM-DD`.
//! [`IssuedDate`] holds the calendar date and renders either form.

use core::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const DOTTED_FORMAT: &str = "%d.%m.%Y";
const ISO_FORMAT: &str = "%Y-%m-%d";

/// Errors that can occur when parsing an [`IssuedDate`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    /// The input is not shaped like `DD.MM.YYYY`.
    #[error("date {0:?} is not in DD.MM.YYYY form")]
    NotDotted(String),
    /// The input is shaped correctly but names no calendar day (e.g. 31.02).
    #[error("date {input:?} is not a calendar date: {reason}")]
    NotACalendarDate {
        /// The rejected input.
        input: String,
        /// Parser message.
        reason: String,
    },
}

/// The calendar date a gift code was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssuedDate(NaiveDate);

impl IssuedDate {
    /// Wrap a calendar date.
    #[must_use]
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parse the remote `DD.MM.YYYY` form.
    ///
    /// Exactly two day digits, two month digits and four year digits are
    /// required, so formatting the result with [`IssuedDate::to_dotted`]
    /// reproduces the input.
    ///
    /// # Errors
    ///
    /// Returns [`DateError::NotDotted`] for any other shape and
    /// [`DateError::NotACalendarDate`] for impossible days.
    pub fn parse_dotted(s: &str) -> Result<Self, DateError> {
        let shaped = s.len() == 10
            && s.bytes().enumerate().all(|(i, b)| {
                if i == 2 || i == 5 {
                    b == b'.'
                } else {
                    b.is_ascii_digit()
                }
            });
        if !shaped {
            return Err(DateError::NotDotted(s.to_owned()));
        }

        NaiveDate::parse_from_str(s, DOTTED_FORMAT)
            .map(Self)
            .map_err(|e| DateError::NotACalendarDate {
                input: s.to_owned(),
                reason: e.to_string(),
            })
    }

    /// Parse the stored ISO `YYYY-MM-DD` form.
    ///
    /// # Errors
    ///
    /// Returns [`DateError::NotACalendarDate`] if the value does not parse.
    pub fn parse_iso(s: &str) -> Result<Self, DateError> {
        NaiveDate::parse_from_str(s, ISO_FORMAT)
            .map(Self)
            .map_err(|e| DateError::NotACalendarDate {
                input: s.to_owned(),
                reason: e.to_string(),
            })
    }

    /// Render as `DD.MM.YYYY` for the remote API.
    #[must_use]
    pub fn to_dotted(&self) -> String {
        self.0.format(DOTTED_FORMAT).to_string()
    }

    /// Render as `YYYY-MM-DD` for storage.
    #[must_use]
    pub fn to_iso(&self) -> String {
        self.0.format(ISO_FORMAT).to_string()
    }

    /// The underlying calendar date.
    #[must_use]
    pub const fn as_naive(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for IssuedDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso())
    }
}

impl From<NaiveDate> for IssuedDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_round_trip() {
        for input in ["01.06.2024", "29.02.2024", "31.12.1999", "10.10.0010"] {
            let date = IssuedDate::parse_dotted(input).unwrap();
            assert_eq!(date.to_dotted(), input);
        }
    }

    #[test]
    fn test_dotted_normalizes_to_iso() {
        let date = IssuedDate::parse_dotted("01.06.2024").unwrap();
        assert_eq!(date.to_iso(), "2024-06-01");
        assert_eq!(date.to_string(), "2024-06-01");
    }

    #[test]
    fn test_dotted_rejects_impossible_days() {
        assert!(matches!(
            IssuedDate::parse_dotted("31.02.2024"),
            Err(DateError::NotACalendarDate { .. })
        ));
        assert!(matches!(
            IssuedDate::parse_dotted("29.02.2023"),
            Err(DateError::NotACalendarDate { .. })
        ));
        assert!(matches!(
            IssuedDate::parse_dotted("01.13.2024"),
            Err(DateError::NotACalendarDate { .. })
        ));
    }

    #[test]
    fn test_dotted_rejects_other_shapes() {
        for input in ["1.6.2024", "2024-06-01", "01/06/2024", "01.06.24", "01.06.20245", ""] {
            assert!(
                matches!(IssuedDate::parse_dotted(input), Err(DateError::NotDotted(_))),
                "{input} should be rejected by shape"
            );
        }
    }

    #[test]
    fn test_iso_round_trip_through_dotted() {
        let date = IssuedDate::parse_iso("2025-01-09").unwrap();
        assert_eq!(date.to_dotted(), "09.01.2025");
        assert!(IssuedDate::parse_iso("09.01.2025").is_err());
    }
}
