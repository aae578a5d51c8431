//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings. Tag lists and batched id sets
//! are stored or bound as compact JSON.

use chrono::{DateTime, Utc};
use folio_core::{
  ArticleId, CommentId, UserId,
  article::{Article, Comment},
  user::{Credential, PasswordHash, Profile, User},
};
use rusqlite::Row;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(e.to_string()))
}

// ─── JSON columns & parameters ───────────────────────────────────────────────

pub fn encode_tags(tags: &[String]) -> Result<String> {
  Ok(serde_json::to_string(tags)?)
}

pub fn decode_tags(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

/// Encode ids as a JSON array, for use with `json_each(?)` in batched
/// lookups.
pub fn encode_id_set(ids: impl IntoIterator<Item = i64>) -> Result<String> {
  Ok(serde_json::to_string(&ids.into_iter().collect::<Vec<_>>())?)
}

pub fn decode_count(n: i64) -> Result<u32> {
  u32::try_from(n).map_err(|_| Error::Decode(format!("invalid favorites_count: {n}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Columns read by [`RawUser::from_row`], in order.
pub const USER_COLUMNS: &str =
  "u.user_id, u.email, u.username, u.bio, u.image, u.created_at, u.password_hash";

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:       i64,
  pub email:         String,
  pub username:      String,
  pub bio:           Option<String>,
  pub image:         Option<String>,
  pub created_at:    String,
  pub password_hash: String,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      email:         row.get(1)?,
      username:      row.get(2)?,
      bio:           row.get(3)?,
      image:         row.get(4)?,
      created_at:    row.get(5)?,
      password_hash: row.get(6)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:    UserId::new(self.user_id),
      email:      self.email,
      username:   self.username,
      bio:        self.bio,
      image:      self.image,
      created_at: decode_dt(&self.created_at)?,
    })
  }

  pub fn into_credential(self) -> Result<Credential> {
    let password_hash = PasswordHash::new(self.password_hash.clone());
    Ok(Credential { user: self.into_user()?, password_hash })
  }
}

/// Columns read by [`RawProfile::from_row`], in order.
pub const PROFILE_COLUMNS: &str = "u.user_id, u.username, u.bio, u.image";

pub struct RawProfile {
  pub user_id:  i64,
  pub username: String,
  pub bio:      Option<String>,
  pub image:    Option<String>,
}

impl RawProfile {
  /// Read the four profile columns starting at column `at`.
  pub fn from_row_at(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:  row.get(at)?,
      username: row.get(at + 1)?,
      bio:      row.get(at + 2)?,
      image:    row.get(at + 3)?,
    })
  }

  pub fn into_profile(self) -> Profile {
    Profile {
      user_id:   UserId::new(self.user_id),
      username:  self.username,
      bio:       self.bio,
      image:     self.image,
      following: false,
    }
  }
}

/// Columns read by [`RawArticle::from_row`]; expects `articles a` joined
/// with the author as `users u`.
pub const ARTICLE_COLUMNS: &str = "a.article_id, a.slug, a.title, a.description, a.body,
   a.tag_list, a.favorites_count, a.created_at, a.updated_at,
   u.user_id, u.username, u.bio, u.image";

pub struct RawArticle {
  pub article_id:      i64,
  pub slug:            String,
  pub title:           String,
  pub description:     String,
  pub body:            String,
  pub tag_list:        String,
  pub favorites_count: i64,
  pub created_at:      String,
  pub updated_at:      String,
  pub author:          RawProfile,
}

impl RawArticle {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      article_id:      row.get(0)?,
      slug:            row.get(1)?,
      title:           row.get(2)?,
      description:     row.get(3)?,
      body:            row.get(4)?,
      tag_list:        row.get(5)?,
      favorites_count: row.get(6)?,
      created_at:      row.get(7)?,
      updated_at:      row.get(8)?,
      author:          RawProfile::from_row_at(row, 9)?,
    })
  }

  pub fn into_article(self) -> Result<Article> {
    Ok(Article {
      article_id:      ArticleId::new(self.article_id),
      slug:            self.slug,
      title:           self.title,
      description:     self.description,
      body:            self.body,
      tags:            decode_tags(&self.tag_list)?,
      author:          self.author.into_profile(),
      favorites_count: decode_count(self.favorites_count)?,
      favorited:       false,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
    })
  }
}

/// Columns read by [`RawComment::from_row`]; expects `comments c` joined
/// with the author as `users u`.
pub const COMMENT_COLUMNS: &str = "c.comment_id, c.article_id, c.body, c.created_at, c.updated_at,
   u.user_id, u.username, u.bio, u.image";

pub struct RawComment {
  pub comment_id: i64,
  pub article_id: i64,
  pub body:       String,
  pub created_at: String,
  pub updated_at: String,
  pub author:     RawProfile,
}

impl RawComment {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      comment_id: row.get(0)?,
      article_id: row.get(1)?,
      body:       row.get(2)?,
      created_at: row.get(3)?,
      updated_at: row.get(4)?,
      author:     RawProfile::from_row_at(row, 5)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id: CommentId::new(self.comment_id),
      article_id: ArticleId::new(self.article_id),
      body:       self.body,
      author:     self.author.into_profile(),
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}
