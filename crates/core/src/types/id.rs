//! Newtype IDs for type-safe references to external principals.
//!
//! Groups, admins and users are identified by opaque IDs owned by the chat
//! platform. They are stored as text (legacy stores held them as integers, the
//! import casts them), and the `define_id!` macro keeps them from being mixed up.

use serde::{Deserialize, Serialize};

/// Macro to define a type-safe, string-backed ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Display` implementations
/// - a transparent `sqlx::Type` (with the `sqlite` feature)
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[cfg_attr(feature = "sqlite", derive(sqlx::Type), sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// A group (alliance) that can opt in to automatic redemption.
    GroupId
);
define_id!(
    /// An admin that may receive new-code notifications.
    AdminId
);
define_id!(
    /// A user that has claimed codes.
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_as_str_agree() {
        let id = GroupId::new("1234567890");
        assert_eq!(id.as_str(), "1234567890");
        assert_eq!(id.to_string(), "1234567890");
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = AdminId::from("42");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"42\"");
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let mut ids = vec![UserId::from("b"), UserId::from("a")];
        ids.sort();
        assert_eq!(ids, vec![UserId::from("a"), UserId::from("b")]);
    }
}
