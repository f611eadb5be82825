//! Outcome enums shared between the daemon and its collaborators.

use serde::{Deserialize, Serialize};

/// Result of asking the redemption engine to claim a code for a group.
///
/// Only the three named negative outcomes mean the code itself is dead;
/// everything else (including [`RedeemOutcome::Other`]) leaves it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedeemOutcome {
    /// The code was redeemed (or is redeemable).
    Ok,
    /// The code has expired.
    TimeError,
    /// The code does not exist.
    CdkNotFound,
    /// The code's usage limit is exhausted.
    UsageLimit,
    /// Any other status reported by the engine.
    #[serde(other)]
    Other,
}

impl RedeemOutcome {
    /// Whether this outcome proves the code can never be redeemed again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::TimeError | Self::CdkNotFound | Self::UsageLimit)
    }
}

impl std::fmt::Display for RedeemOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::TimeError => write!(f, "TIME_ERROR"),
            Self::CdkNotFound => write!(f, "CDK_NOT_FOUND"),
            Self::UsageLimit => write!(f, "USAGE_LIMIT"),
            Self::Other => write!(f, "OTHER"),
        }
    }
}

impl std::str::FromStr for RedeemOutcome {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "OK" | "SUCCESS" => Self::Ok,
            "TIME_ERROR" => Self::TimeError,
            "CDK_NOT_FOUND" => Self::CdkNotFound,
            "USAGE_LIMIT" => Self::UsageLimit,
            _ => Self::Other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_named_negatives_are_terminal() {
        assert!(RedeemOutcome::TimeError.is_terminal());
        assert!(RedeemOutcome::CdkNotFound.is_terminal());
        assert!(RedeemOutcome::UsageLimit.is_terminal());
        assert!(!RedeemOutcome::Ok.is_terminal());
        assert!(!RedeemOutcome::Other.is_terminal());
    }

    #[test]
    fn test_unknown_wire_status_is_other() {
        let outcome: RedeemOutcome =
            serde_json::from_str("\"RECEIVED\"").unwrap_or(RedeemOutcome::Ok);
        assert_eq!(outcome, RedeemOutcome::Other);
        assert_eq!("SAME TYPE EXCHANGE".parse(), Ok(RedeemOutcome::Other));
    }

    #[test]
    fn test_display_matches_wire_names() {
        for outcome in [
            RedeemOutcome::Ok,
            RedeemOutcome::TimeError,
            RedeemOutcome::CdkNotFound,
            RedeemOutcome::UsageLimit,
        ] {
            assert_eq!(outcome.to_string().parse(), Ok(outcome));
        }
    }
}
