//! Persistence boundary: the store traits and supporting query types.
//!
//! The traits are implemented by storage backends (e.g. `folio-store-sqlite`).
//! Higher layers (`folio-service`, `folio-api`) depend on these abstractions,
//! not on any concrete backend.
//!
//! Every backend error type converts into [`crate::Error`] so not-found and
//! uniqueness conflicts surface as typed outcomes.

use std::future::Future;

use crate::{
  article::{Article, ArticleUpdate, Comment, FavoriteState, NewArticle},
  id::{ArticleId, CommentId, UserId},
  user::{Credential, NewUser, Profile, User, UserUpdate},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Default page size for [`ArticleStore::list_articles`].
pub const DEFAULT_LIMIT: usize = 20;
/// Upper bound on the page size a caller may request.
pub const MAX_LIMIT: usize = 100;

/// Filter criteria for [`ArticleStore::list_articles`]. All set fields must
/// match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleQuery {
  /// Restrict to articles written by this user.
  pub author:       Option<UserId>,
  /// Restrict to articles carrying this tag.
  pub tag:          Option<String>,
  /// Restrict to articles this user has an active favorite on.
  pub favorited_by: Option<UserId>,
  /// Restrict to articles whose author this user follows.
  pub followed_by:  Option<UserId>,
  pub limit:        Option<usize>,
  pub offset:       Option<usize>,
}

impl ArticleQuery {
  /// The page size to apply, clamped to `1..=MAX_LIMIT`.
  pub fn effective_limit(&self) -> usize {
    self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
  }
}

/// One page of articles, newest first, plus the total number of matches.
#[derive(Debug, Clone, Default)]
pub struct ArticlePage {
  pub articles: Vec<Article>,
  pub total:    u64,
}

// ─── Users ───────────────────────────────────────────────────────────────────

/// Credential persistence.
///
/// Email and username uniqueness is enforced by the backend, which reports a
/// collision as [`crate::Error::AlreadyExists`] even when a racing insert
/// slipped past a caller's pre-check.
pub trait UserStore: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Look up a user and their password hash by email.
  fn find_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Credential>, Self::Error>> + Send + 'a;

  fn find_by_id(
    &self,
    id: UserId,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn find_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Apply a partial update. Fails with not-found if the user is gone.
  fn update_user(
    &self,
    id: UserId,
    update: UserUpdate,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;
}

// ─── Profiles & follows ──────────────────────────────────────────────────────

pub trait ProfileStore: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  /// Public profile by username, with `following == false`.
  fn get_profile<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + 'a;

  /// Make `follower` follow `followee`. Idempotent; returns `true` if the
  /// relationship was not active before.
  fn follow_user(
    &self,
    follower: UserId,
    followee: UserId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Remove the relationship. Idempotent; returns `true` if it was active.
  fn unfollow_user(
    &self,
    follower: UserId,
    followee: UserId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn is_following(
    &self,
    follower: UserId,
    followee: UserId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Batched [`is_following`](Self::is_following): one entry per element of
  /// `followees`, in the same order.
  fn following_status<'a>(
    &'a self,
    follower: UserId,
    followees: &'a [UserId],
  ) -> impl Future<Output = Result<Vec<bool>, Self::Error>> + Send + 'a;
}

// ─── Articles & favorites ────────────────────────────────────────────────────

/// Article persistence and the favorite relationship engine.
///
/// Every favorite operation reads the relationship and writes the row plus
/// the counter in one atomic unit, so concurrent calls for the same
/// `(user, article)` pair are linearizable and the counter never drifts from
/// the number of active rows.
pub trait ArticleStore: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  fn create_article(
    &self,
    author: UserId,
    input: NewArticle,
  ) -> impl Future<Output = Result<Article, Self::Error>> + Send + '_;

  fn get_article(
    &self,
    id: ArticleId,
  ) -> impl Future<Output = Result<Option<Article>, Self::Error>> + Send + '_;

  fn list_articles<'a>(
    &'a self,
    query: &'a ArticleQuery,
  ) -> impl Future<Output = Result<ArticlePage, Self::Error>> + Send + 'a;

  /// Update an article the caller has already fetched and ownership-checked.
  ///
  /// The write re-checks the author, so it fails with not-found if the row
  /// was deleted or changed hands in between.
  fn update_article<'a>(
    &'a self,
    article: &'a Article,
    update: ArticleUpdate,
  ) -> impl Future<Output = Result<Article, Self::Error>> + Send + 'a;

  /// Delete a fetched, ownership-checked article, with the same author
  /// re-check as [`update_article`](Self::update_article).
  fn delete_article<'a>(
    &'a self,
    article: &'a Article,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// All known tag names, alphabetically.
  fn list_tags(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Flip the favorite for `(user, article)`: create it and increment the
  /// counter if inactive, otherwise remove it and decrement.
  fn toggle_favorite(
    &self,
    user: UserId,
    article: ArticleId,
  ) -> impl Future<Output = Result<FavoriteState, Self::Error>> + Send + '_;

  /// Ensure the favorite is active; increments only on an actual change.
  fn favorite(
    &self,
    user: UserId,
    article: ArticleId,
  ) -> impl Future<Output = Result<FavoriteState, Self::Error>> + Send + '_;

  /// Ensure the favorite is inactive; a no-op (no decrement) if it was not
  /// active.
  fn unfavorite(
    &self,
    user: UserId,
    article: ArticleId,
  ) -> impl Future<Output = Result<FavoriteState, Self::Error>> + Send + '_;

  fn check_favorited(
    &self,
    user: UserId,
    article: ArticleId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Batched [`check_favorited`](Self::check_favorited) in a single lookup:
  /// one entry per element of `articles`, in the same order.
  fn favorites_status<'a>(
    &'a self,
    user: UserId,
    articles: &'a [ArticleId],
  ) -> impl Future<Output = Result<Vec<bool>, Self::Error>> + Send + 'a;
}

// ─── Comments ────────────────────────────────────────────────────────────────

pub trait CommentStore: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  /// Fails with not-found if the article does not exist.
  fn add_comment(
    &self,
    author: UserId,
    article: ArticleId,
    body: String,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  fn get_comment(
    &self,
    id: CommentId,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  /// Comments on an article, oldest first.
  fn list_comments(
    &self,
    article: ArticleId,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;

  /// Delete a fetched, ownership-checked comment; the write re-checks the
  /// author.
  fn delete_comment<'a>(
    &'a self,
    comment: &'a Comment,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
