//! User accounts, credentials and public profiles.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// A registered account. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:    UserId,
  pub email:      String,
  pub username:   String,
  pub bio:        Option<String>,
  pub image:      Option<String>,
  pub created_at: DateTime<Utc>,
}

/// An Argon2 PHC string, e.g. `$argon2id$v=19$…`.
///
/// Deliberately not `Serialize`; `Debug` is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
  pub fn new(phc: impl Into<String>) -> Self { Self(phc.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Debug for PasswordHash {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("PasswordHash(..)")
  }
}

/// A user record together with its stored password hash, as returned by
/// credential lookups at login.
#[derive(Debug, Clone)]
pub struct Credential {
  pub user:          User,
  pub password_hash: PasswordHash,
}

/// Input to [`UserStore::create_user`](crate::store::UserStore::create_user).
#[derive(Debug, Clone)]
pub struct NewUser {
  pub email:         String,
  pub username:      String,
  pub password_hash: PasswordHash,
}

/// Partial profile update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
  pub email:         Option<String>,
  pub username:      Option<String>,
  pub bio:           Option<String>,
  pub image:         Option<String>,
  pub password_hash: Option<PasswordHash>,
}

/// Public view of a user. `following` is relative to whoever is looking and
/// is always `false` when read straight from a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub user_id:   UserId,
  pub username:  String,
  pub bio:       Option<String>,
  pub image:     Option<String>,
  pub following: bool,
}

impl From<&User> for Profile {
  fn from(user: &User) -> Self {
    Self {
      user_id:   user.user_id,
      username:  user.username.clone(),
      bio:       user.bio.clone(),
      image:     user.image.clone(),
      following: false,
    }
  }
}
