//! Error taxonomy shared by every Folio crate.
//!
//! Authentication failures ([`Error::Unauthenticated`]) and authorization
//! failures ([`Error::Unauthorized`]) are distinct variants even where a
//! transport maps both to the same status code.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Missing, malformed, forged or expired token; also a failed login.
  #[error("authentication required")]
  Unauthenticated,

  /// The caller is known but does not own the targeted resource.
  #[error("not permitted to modify this {0}")]
  Unauthorized(&'static str),

  #[error("{0} not found")]
  NotFound(String),

  #[error("{0} already exists")]
  AlreadyExists(String),

  #[error("{field} {message}")]
  Validation {
    field:   &'static str,
    message: String,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
    Self::Validation { field, message: message.into() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
