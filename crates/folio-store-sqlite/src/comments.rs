//! [`CommentStore`] for [`SqliteStore`].

use chrono::Utc;
use folio_core::{
  ArticleId, CommentId, UserId,
  article::Comment,
  store::CommentStore,
};
use rusqlite::{Connection, OptionalExtension as _};

use crate::{
  Error, Result, SqliteStore,
  encode::{COMMENT_COLUMNS, RawComment, encode_dt},
};

fn read_comment(conn: &Connection, comment_id: i64) -> rusqlite::Result<Option<RawComment>> {
  conn
    .query_row(
      &format!(
        "SELECT {COMMENT_COLUMNS}
         FROM comments c JOIN users u ON u.user_id = c.author_id
         WHERE c.comment_id = ?1"
      ),
      [comment_id],
      RawComment::from_row,
    )
    .optional()
}

impl CommentStore for SqliteStore {
  type Error = Error;

  async fn add_comment(
    &self,
    author:  UserId,
    article: ArticleId,
    body:    String,
  ) -> Result<Comment> {
    let now_str             = encode_dt(Utc::now());
    let (author_id, raw_id) = (author.get(), article.get());

    // Inserts nothing when the article is missing.
    let raw = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO comments (article_id, author_id, body, created_at, updated_at)
           SELECT article_id, ?2, ?3, ?4, ?4 FROM articles WHERE article_id = ?1",
          rusqlite::params![raw_id, author_id, body, now_str],
        )?;
        if inserted == 0 {
          return Ok(None);
        }
        let comment_id = conn.last_insert_rowid();
        Ok(read_comment(conn, comment_id)?)
      })
      .await?;

    raw
      .ok_or_else(|| Error::NotFound(format!("article {article}")))?
      .into_comment()
  }

  async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>> {
    let raw_id = id.get();
    let raw = self
      .conn
      .call(move |conn| Ok(read_comment(conn, raw_id)?))
      .await?;
    raw.map(RawComment::into_comment).transpose()
  }

  async fn list_comments(&self, article: ArticleId) -> Result<Vec<Comment>> {
    let raw_id = article.get();
    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COMMENT_COLUMNS}
           FROM comments c JOIN users u ON u.user_id = c.author_id
           WHERE c.article_id = ?1
           ORDER BY c.comment_id"
        ))?;
        let rows = stmt
          .query_map([raw_id], RawComment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }

  async fn delete_comment(&self, comment: &Comment) -> Result<()> {
    let raw_id    = comment.comment_id.get();
    let author_id = comment.author_id().get();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM comments WHERE comment_id = ?1 AND author_id = ?2",
          [raw_id, author_id],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::NotFound(format!("comment {}", comment.comment_id)));
    }
    Ok(())
  }
}
