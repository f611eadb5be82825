//! Validation of raw `"<code> <date>"` lines served by the remote API.

use serde::Serialize;

use super::code::{CodeError, GiftCode};
use super::date::{DateError, IssuedDate};

/// Why a raw line was classified invalid.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    /// The line does not split into exactly two whitespace-separated tokens.
    #[error("expected 2 tokens, found {tokens}")]
    Malformed {
        /// Number of tokens found.
        tokens: usize,
    },
    /// The first token is not an alphanumeric code.
    #[error("bad code format: {0}")]
    BadCodeFormat(#[from] CodeError),
    /// The second token is not a `DD.MM.YYYY` date.
    #[error("bad date format: {0}")]
    BadDateFormat(#[from] DateError),
}

/// A well-formed line: a code and the date it was issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedLine {
    /// The gift code.
    pub code: GiftCode,
    /// The issue date.
    pub date: IssuedDate,
}

impl ParsedLine {
    /// Date in the ISO form used for storage.
    #[must_use]
    pub fn stored_date(&self) -> String {
        self.date.to_iso()
    }

    /// Date in the `DD.MM.YYYY` form used for remote pushes.
    #[must_use]
    pub fn remote_date(&self) -> String {
        self.date.to_dotted()
    }
}

/// Parse one raw remote line.
///
/// # Errors
///
/// Returns the [`InvalidReason`] the line fails on. There is no partial
/// recovery: a line is either fully valid or classified invalid.
///
/// # Examples
///
/// ```
/// use giftsync_core::{InvalidReason, parse_line};
///
/// let parsed = parse_line("ABC123 01.06.2024").unwrap();
/// assert_eq!(parsed.code.as_str(), "ABC123");
/// assert_eq!(parsed.stored_date(), "2024-06-01");
///
/// assert!(matches!(parse_line("bad line"), Err(InvalidReason::BadDateFormat(_))));
/// ```
pub fn parse_line(raw: &str) -> Result<ParsedLine, InvalidReason> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    let [code, date] = tokens.as_slice() else {
        return Err(InvalidReason::Malformed {
            tokens: tokens.len(),
        });
    };

    let code = GiftCode::parse(code)?;
    let date = IssuedDate::parse_dotted(date)?;

    Ok(ParsedLine { code, date })
}

/// The token a remote delete should target for an invalid line: the first
/// whitespace-delimited token, or the trimmed line itself when it has none.
#[must_use]
pub fn leading_token(raw: &str) -> &str {
    raw.split_whitespace().next().unwrap_or_else(|| raw.trim())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_line() {
        let parsed = parse_line("ABC123 01.06.2024").unwrap();
        assert_eq!(parsed.code.as_str(), "ABC123");
        assert_eq!(parsed.stored_date(), "2024-06-01");
        assert_eq!(parsed.remote_date(), "01.06.2024");
    }

    #[test]
    fn test_surrounding_and_inner_whitespace_is_tolerated() {
        let parsed = parse_line("  FREE50 \t 15.08.2025 \n").unwrap();
        assert_eq!(parsed.code.as_str(), "FREE50");
        assert_eq!(parsed.remote_date(), "15.08.2025");
    }

    #[test]
    fn test_token_count() {
        assert_eq!(parse_line(""), Err(InvalidReason::Malformed { tokens: 0 }));
        assert_eq!(
            parse_line("ONLYCODE"),
            Err(InvalidReason::Malformed { tokens: 1 })
        );
        assert_eq!(
            parse_line("A 01.01.2024 extra"),
            Err(InvalidReason::Malformed { tokens: 3 })
        );
    }

    #[test]
    fn test_bad_code() {
        assert!(matches!(
            parse_line("AB-12 01.06.2024"),
            Err(InvalidReason::BadCodeFormat(_))
        ));
    }

    #[test]
    fn test_bad_date() {
        assert!(matches!(
            parse_line("XY9 31.02.2024"),
            Err(InvalidReason::BadDateFormat(_))
        ));
        assert!(matches!(
            parse_line("bad line"),
            Err(InvalidReason::BadDateFormat(_))
        ));
    }

    #[test]
    fn test_code_is_checked_before_date() {
        assert!(matches!(
            parse_line("AB-12 not-a-date"),
            Err(InvalidReason::BadCodeFormat(_))
        ));
    }

    #[test]
    fn test_every_line_is_classified() {
        let lines = [
            "ABC123 01.06.2024",
            "bad line",
            "XY9 31.02.2024",
            "",
            "A_B 01.01.2024",
            "one two three",
        ];
        let (valid, invalid): (Vec<_>, Vec<_>) =
            lines.iter().map(|l| parse_line(l)).partition(Result::is_ok);
        assert_eq!(valid.len() + invalid.len(), lines.len());
        assert_eq!(valid.len(), 1);
    }

    #[test]
    fn test_leading_token() {
        assert_eq!(leading_token("bad line"), "bad");
        assert_eq!(leading_token("XY9 31.02.2024"), "XY9");
        assert_eq!(leading_token("  lonely  "), "lonely");
        assert_eq!(leading_token("   "), "");
    }
}
