//! Per-operation authentication policy.
//!
//! Most operations require a verified token. A fixed set is publicly
//! readable, but only while the caller presents no credential: a request
//! that carries an `Authorization` header on a public operation is verified
//! like any other, so an optional principal can personalise the result and a
//! bad token is still rejected.

use std::collections::HashSet;

/// Every operation the service exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
  Login,
  Register,
  GetCurrentUser,
  UpdateUser,
  GetProfile,
  FollowUser,
  UnfollowUser,
  ListArticles,
  FeedArticles,
  GetArticle,
  CreateArticle,
  UpdateArticle,
  DeleteArticle,
  FavoriteArticle,
  UnfavoriteArticle,
  ToggleFavorite,
  AddComment,
  GetComments,
  DeleteComment,
  GetTags,
}

impl Operation {
  pub const ALL: [Operation; 20] = [
    Operation::Login,
    Operation::Register,
    Operation::GetCurrentUser,
    Operation::UpdateUser,
    Operation::GetProfile,
    Operation::FollowUser,
    Operation::UnfollowUser,
    Operation::ListArticles,
    Operation::FeedArticles,
    Operation::GetArticle,
    Operation::CreateArticle,
    Operation::UpdateArticle,
    Operation::DeleteArticle,
    Operation::FavoriteArticle,
    Operation::UnfavoriteArticle,
    Operation::ToggleFavorite,
    Operation::AddComment,
    Operation::GetComments,
    Operation::DeleteComment,
    Operation::GetTags,
  ];
}

/// Operations readable without a token.
pub const PUBLIC_OPERATIONS: [Operation; 7] = [
  Operation::Login,
  Operation::Register,
  Operation::GetArticle,
  Operation::ListArticles,
  Operation::GetComments,
  Operation::GetTags,
  Operation::GetProfile,
];

/// What the transport must do before dispatching an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enforcement {
  /// Dispatch anonymously without looking for a token.
  Skip,
  /// Verify the token; reject the request if it is missing or invalid.
  Require,
}

/// Immutable classification of operations into public and protected.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
  public: HashSet<Operation>,
}

impl Default for RoutePolicy {
  fn default() -> Self { Self::new(PUBLIC_OPERATIONS) }
}

impl RoutePolicy {
  pub fn new(public: impl IntoIterator<Item = Operation>) -> Self {
    Self { public: public.into_iter().collect() }
  }

  pub fn is_public(&self, op: Operation) -> bool { self.public.contains(&op) }

  pub fn requires_auth(&self, op: Operation, has_authorization_header: bool) -> Enforcement {
    if self.is_public(op) && !has_authorization_header {
      Enforcement::Skip
    } else {
      Enforcement::Require
    }
  }
}
