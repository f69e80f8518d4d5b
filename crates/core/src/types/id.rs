//! Newtype IDs for type-safe record references.
//!
//! The catalog store assigns identifiers itself. Depending on the store they
//! arrive as JSON numbers (`1`) or strings (`"a1b2"`), so every ID wraps a
//! [`RecordKey`] that remembers which form it was read in and writes it back
//! the same way.

use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Error returned when parsing an ID from user input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("record id cannot be empty")]
pub struct EmptyRecordId;

/// A store-assigned record key: either numeric or free text.
///
/// Fractional numbers are read as text (`1.5` becomes `"1.5"`), so the key
/// still addresses the record in a URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum RecordKey {
    /// Integer key (json-server style auto-increment).
    Number(i64),
    /// Opaque string key.
    Text(String),
}

impl RecordKey {
    /// Numeric value of the key, if it has one.
    ///
    /// Text keys count as numeric when they parse as a number, so `"10"`
    /// sorts after `"9"`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // ids never approach 2^53
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n as f64),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }

    /// Compare two keys by numeric value.
    ///
    /// Keys that are not both numeric compare equal, so a stable sort keeps
    /// them in their original relative order.
    #[must_use]
    pub fn numeric_cmp(&self, other: &Self) -> Ordering {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        }
    }
}

impl<'de> Deserialize<'de> for RecordKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Integer(i64),
            Float(f64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Integer(n) => Self::Number(n),
            Raw::Float(n) => Self::Text(n.to_string()),
            Raw::Text(s) => Self::Text(s),
        })
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl FromStr for RecordKey {
    type Err = EmptyRecordId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(EmptyRecordId);
        }
        Ok(trimmed
            .parse::<i64>()
            .map_or_else(|_| Self::Text(trimmed.to_owned()), Self::Number))
    }
}

impl From<i32> for RecordKey {
    fn from(n: i32) -> Self {
        Self::Number(i64::from(n))
    }
}

impl From<i64> for RecordKey {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for RecordKey {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for RecordKey {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around [`RecordKey`] with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `Display`, `FromStr`
/// - `new()`, `key()` and `numeric_cmp()`
///
/// # Example
///
/// ```rust
/// # use emporium_core::define_id;
/// define_id!(ProductId);
/// define_id!(SessionId);
///
/// let product_id = ProductId::new(1);
/// let session_id = SessionId::new("abc");
///
/// // These are different types, so this won't compile:
/// // let _: ProductId = session_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name($crate::types::id::RecordKey);

        impl $name {
            /// Create a new ID from anything convertible into a record key.
            #[must_use]
            pub fn new(key: impl Into<$crate::types::id::RecordKey>) -> Self {
                Self(key.into())
            }

            /// Get the underlying record key.
            #[must_use]
            pub const fn key(&self) -> &$crate::types::id::RecordKey {
                &self.0
            }

            /// Compare by numeric value, see `RecordKey::numeric_cmp`.
            #[must_use]
            pub fn numeric_cmp(&self, other: &Self) -> ::core::cmp::Ordering {
                self.0.numeric_cmp(&other.0)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::EmptyRecordId;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }
    };
}

define_id!(ProductId);
define_id!(AdminId);
define_id!(SessionId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_number_and_string() {
        let numeric: ProductId = serde_json::from_str("7").unwrap();
        assert_eq!(numeric.key(), &RecordKey::Number(7));

        let text: ProductId = serde_json::from_str("\"c9f1\"").unwrap();
        assert_eq!(text.key(), &RecordKey::Text("c9f1".to_string()));
    }

    #[test]
    fn test_deserialize_fractional_number_as_text() {
        let id: ProductId = serde_json::from_str("2.5").unwrap();
        assert_eq!(id.key(), &RecordKey::Text("2.5".to_string()));
        assert_eq!(id.to_string(), "2.5");
        assert_eq!(id.key().as_number(), Some(2.5));
    }

    #[test]
    fn test_serialize_keeps_original_form() {
        assert_eq!(serde_json::to_string(&SessionId::new(3)).unwrap(), "3");
        assert_eq!(
            serde_json::to_string(&SessionId::new("3")).unwrap(),
            "\"3\""
        );
    }

    #[test]
    fn test_numeric_cmp_treats_numeric_text_as_number() {
        let nine = ProductId::new("9");
        let ten = ProductId::new(10);
        assert_eq!(nine.numeric_cmp(&ten), Ordering::Less);
    }

    #[test]
    fn test_numeric_cmp_non_numeric_is_equal() {
        let a = ProductId::new("abc");
        let b = ProductId::new(1);
        assert_eq!(a.numeric_cmp(&b), Ordering::Equal);
        assert_eq!(b.numeric_cmp(&a), Ordering::Equal);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("42".parse::<ProductId>().unwrap(), ProductId::new(42));
        assert_eq!(" x1 ".parse::<ProductId>().unwrap(), ProductId::new("x1"));
        assert_eq!("  ".parse::<ProductId>(), Err(EmptyRecordId));
    }

    #[test]
    fn test_display() {
        assert_eq!(ProductId::new(12).to_string(), "12");
        assert_eq!(AdminId::new("root").to_string(), "root");
    }
}
