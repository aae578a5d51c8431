//! Articles, comments and the favorite relationship.
//!
//! An article's `favorites_count` is a denormalised counter. Stores must keep
//! it equal to the number of active favorite rows for the article.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  id::{ArticleId, CommentId, UserId},
  user::Profile,
};

// ─── Articles ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
  pub article_id:      ArticleId,
  /// Derived from the title; a display field, not a key.
  pub slug:            String,
  pub title:           String,
  pub description:     String,
  pub body:            String,
  pub tags:            Vec<String>,
  pub author:          Profile,
  pub favorites_count: u32,
  /// Whether the viewing principal has favorited this article. Always
  /// `false` when read straight from a store.
  pub favorited:       bool,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

impl Article {
  pub fn author_id(&self) -> UserId { self.author.user_id }
}

/// Input to [`ArticleStore::create_article`](crate::store::ArticleStore::create_article).
#[derive(Debug, Clone, Default)]
pub struct NewArticle {
  pub title:       String,
  pub description: String,
  pub body:        String,
  pub tags:        Vec<String>,
}

/// Partial article update; `None` fields are left unchanged. Changing the
/// title re-derives the slug.
#[derive(Debug, Clone, Default)]
pub struct ArticleUpdate {
  pub title:       Option<String>,
  pub description: Option<String>,
  pub body:        Option<String>,
  pub tags:        Option<Vec<String>>,
}

/// Derive a URL-friendly slug: every character outside `[A-Za-z0-9_]`
/// becomes `-`, and the result is lowercased.
pub fn slugify(title: &str) -> String {
  title
    .chars()
    .map(|c| {
      if c.is_ascii_alphanumeric() || c == '_' {
        c.to_ascii_lowercase()
      } else {
        '-'
      }
    })
    .collect()
}

/// Trim tag names, drop empties and remove duplicates, keeping first-seen
/// order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let mut out: Vec<String> = Vec::new();
  for tag in tags {
    let tag = tag.as_ref().trim();
    if !tag.is_empty() && !out.iter().any(|t| t == tag) {
      out.push(tag.to_owned());
    }
  }
  out
}

// ─── Favorites ───────────────────────────────────────────────────────────────

/// The state of a `(user, article)` favorite after a relationship operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteState {
  pub favorited:       bool,
  pub favorites_count: u32,
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id: CommentId,
  pub article_id: ArticleId,
  pub body:       String,
  pub author:     Profile,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Comment {
  pub fn author_id(&self) -> UserId { self.author.user_id }
}
