//! Numeric identifiers for persisted entities.
//!
//! The numeric ID is the canonical key for every lookup, mutation and
//! ownership check. Slugs and usernames are display fields.

use std::{fmt, num::ParseIntError, str::FromStr};

use serde::{Deserialize, Serialize};

macro_rules! id_type {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(
      Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    )]
    #[serde(transparent)]
    pub struct $name(i64);

    impl $name {
      pub const fn new(raw: i64) -> Self { Self(raw) }

      pub const fn get(self) -> i64 { self.0 }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
      }
    }

    impl From<i64> for $name {
      fn from(raw: i64) -> Self { Self(raw) }
    }

    impl FromStr for $name {
      type Err = ParseIntError;

      fn from_str(s: &str) -> Result<Self, Self::Err> { s.parse().map(Self) }
    }
  };
}

id_type!(
  /// Identity of a registered user; also the subject of a session token.
  UserId
);
id_type!(ArticleId);
id_type!(CommentId);

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_and_displays() {
    let id: ArticleId = "42".parse().unwrap();
    assert_eq!(id, ArticleId::new(42));
    assert_eq!(id.to_string(), "42");
  }

  #[test]
  fn rejects_non_numeric() {
    assert!("forty-two".parse::<UserId>().is_err());
  }

  #[test]
  fn serialises_transparently() {
    let json = serde_json::to_string(&CommentId::new(7)).unwrap();
    assert_eq!(json, "7");
  }
}
