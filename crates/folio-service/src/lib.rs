//! Folio usecases.
//!
//! Each service wraps a store behind an `Arc` and reads the caller from
//! [`folio_auth::principal`]. Operations that need a signed-in caller fail
//! with [`folio_core::Error::Unauthenticated`] when run anonymously;
//! read operations personalise their results when a caller is present.

pub mod articles;
pub mod profiles;
pub mod users;

use folio_core::store::{ArticleStore, CommentStore, ProfileStore, UserStore};

pub use articles::{ArticleFilter, ArticleService};
pub use profiles::ProfileService;
pub use users::{AuthenticatedUser, Registration, UserChanges, UserService};

/// Every store trait at once; implemented for any backend that has them all.
pub trait Store: UserStore + ProfileStore + ArticleStore + CommentStore + 'static {}

impl<T> Store for T where T: UserStore + ProfileStore + ArticleStore + CommentStore + 'static {}

/// Lift a backend error into the shared taxonomy.
pub(crate) fn store_err<E: Into<folio_core::Error>>(e: E) -> folio_core::Error { e.into() }

/// Reject a blank value for a required field, returning it trimmed.
pub(crate) fn required<'a>(
  field: &'static str,
  value: &'a str,
) -> folio_core::Result<&'a str> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(folio_core::Error::validation(field, "can't be blank"));
  }
  Ok(trimmed)
}

#[cfg(test)]
mod tests;
