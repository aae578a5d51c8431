//! Author-only mutation checks for articles and comments.

use folio_core::{
  Error, UserId,
  article::{Article, Comment},
};

/// A resource with a single owning user.
pub trait Owned {
  /// Human-readable resource kind, used in error messages.
  const KIND: &'static str;

  fn owner_id(&self) -> UserId;
}

impl Owned for Article {
  const KIND: &'static str = "article";

  fn owner_id(&self) -> UserId { self.author_id() }
}

impl Owned for Comment {
  const KIND: &'static str = "comment";

  fn owner_id(&self) -> UserId { self.author_id() }
}

/// Fail with [`Error::Unauthorized`] unless `principal` owns the resource.
pub fn verify_owner(kind: &'static str, owner: UserId, principal: UserId) -> Result<(), Error> {
  if owner == principal {
    Ok(())
  } else {
    tracing::warn!(%owner, %principal, kind, "ownership check failed");
    Err(Error::Unauthorized(kind))
  }
}

/// [`verify_owner`] for any [`Owned`] resource.
pub fn ensure_owner<R: Owned>(resource: &R, principal: UserId) -> Result<(), Error> {
  verify_owner(R::KIND, resource.owner_id(), principal)
}
