//! [`ArticleStore`] for [`SqliteStore`]: articles, tags and the favorite
//! relationship engine.

use std::collections::HashSet;

use chrono::Utc;
use folio_core::{
  ArticleId, UserId,
  article::{Article, ArticleUpdate, FavoriteState, NewArticle, normalize_tags, slugify},
  store::{ArticlePage, ArticleQuery, ArticleStore},
};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior};

use crate::{
  Error, Result, SqliteStore,
  encode::{ARTICLE_COLUMNS, RawArticle, decode_count, encode_dt, encode_id_set, encode_tags},
};

/// Shared filter for listing and counting. `?1` author, `?2` tag name,
/// `?3` favorited-by user, `?4` followed-by user; a NULL disables the clause.
const ARTICLE_FILTER: &str = "
  (?1 IS NULL OR a.author_id = ?1)
  AND (?2 IS NULL OR EXISTS (
    SELECT 1 FROM article_tags at JOIN tags t ON t.tag_id = at.tag_id
    WHERE at.article_id = a.article_id AND t.name = ?2))
  AND (?3 IS NULL OR EXISTS (
    SELECT 1 FROM favorites f
    WHERE f.article_id = a.article_id AND f.user_id = ?3 AND f.deleted_at IS NULL))
  AND (?4 IS NULL OR EXISTS (
    SELECT 1 FROM follows fo
    WHERE fo.followee_id = a.author_id AND fo.follower_id = ?4 AND fo.deleted_at IS NULL))";

fn read_article(conn: &Connection, article_id: i64) -> rusqlite::Result<Option<RawArticle>> {
  conn
    .query_row(
      &format!(
        "SELECT {ARTICLE_COLUMNS}
         FROM articles a JOIN users u ON u.user_id = a.author_id
         WHERE a.article_id = ?1"
      ),
      [article_id],
      RawArticle::from_row,
    )
    .optional()
}

/// Replace the `article_tags` links for an article, creating tags as needed.
fn link_tags(conn: &Connection, article_id: i64, tags: &[String]) -> rusqlite::Result<()> {
  conn.execute("DELETE FROM article_tags WHERE article_id = ?1", [article_id])?;
  for tag in tags {
    conn.execute(
      "INSERT INTO tags (name) VALUES (?1) ON CONFLICT (name) DO NOTHING",
      [tag],
    )?;
    conn.execute(
      "INSERT INTO article_tags (article_id, tag_id)
       SELECT ?1, tag_id FROM tags WHERE name = ?2",
      rusqlite::params![article_id, tag],
    )?;
  }
  Ok(())
}

// ─── Favorite engine ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FavoriteOp {
  Toggle,
  Set,
  Clear,
}

/// Outcome of one favorite operation, as read inside its transaction.
struct FavoriteOutcome {
  favorited: bool,
  count:     i64,
  changed:   bool,
}

/// Read the relationship, write the row and the counter, and re-read the
/// counter, all inside one `IMMEDIATE` transaction. Returns `None` if the
/// article does not exist.
fn apply_favorite(
  conn:    &mut Connection,
  user:    i64,
  article: i64,
  op:      FavoriteOp,
  at:      &str,
) -> rusqlite::Result<Option<FavoriteOutcome>> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

  let exists = tx
    .query_row("SELECT 1 FROM articles WHERE article_id = ?1", [article], |_| Ok(()))
    .optional()?
    .is_some();
  if !exists {
    return Ok(None);
  }

  let active = tx
    .query_row(
      "SELECT 1 FROM favorites
       WHERE user_id = ?1 AND article_id = ?2 AND deleted_at IS NULL",
      [user, article],
      |_| Ok(()),
    )
    .optional()?
    .is_some();

  let target = match op {
    FavoriteOp::Toggle => !active,
    FavoriteOp::Set => true,
    FavoriteOp::Clear => false,
  };

  if target && !active {
    tx.execute(
      "INSERT INTO favorites (user_id, article_id, created_at, deleted_at)
       VALUES (?1, ?2, ?3, NULL)
       ON CONFLICT (user_id, article_id) DO UPDATE
         SET created_at = excluded.created_at, deleted_at = NULL",
      rusqlite::params![user, article, at],
    )?;
    tx.execute(
      "UPDATE articles SET favorites_count = favorites_count + 1 WHERE article_id = ?1",
      [article],
    )?;
  } else if !target && active {
    tx.execute(
      "UPDATE favorites SET deleted_at = ?3
       WHERE user_id = ?1 AND article_id = ?2 AND deleted_at IS NULL",
      rusqlite::params![user, article, at],
    )?;
    tx.execute(
      "UPDATE articles SET favorites_count = favorites_count - 1
       WHERE article_id = ?1 AND favorites_count > 0",
      [article],
    )?;
  }

  let count: i64 = tx.query_row(
    "SELECT favorites_count FROM articles WHERE article_id = ?1",
    [article],
    |row| row.get(0),
  )?;

  tx.commit()?;
  Ok(Some(FavoriteOutcome { favorited: target, count, changed: target != active }))
}

impl SqliteStore {
  async fn run_favorite(
    &self,
    user:    UserId,
    article: ArticleId,
    op:      FavoriteOp,
  ) -> Result<FavoriteState> {
    let at_str            = encode_dt(Utc::now());
    let (user_id, raw_id) = (user.get(), article.get());

    let outcome = self
      .conn
      .call(move |conn| Ok(apply_favorite(conn, user_id, raw_id, op, &at_str)?))
      .await?
      .ok_or_else(|| Error::NotFound(format!("article {article}")))?;

    if outcome.changed {
      tracing::debug!(
        %user, %article, ?op,
        favorited = outcome.favorited,
        count = outcome.count,
        "favorite changed"
      );
    }

    Ok(FavoriteState {
      favorited:       outcome.favorited,
      favorites_count: decode_count(outcome.count)?,
    })
  }
}

// ─── ArticleStore impl ───────────────────────────────────────────────────────

impl ArticleStore for SqliteStore {
  type Error = Error;

  async fn create_article(&self, author: UserId, input: NewArticle) -> Result<Article> {
    let now_str   = encode_dt(Utc::now());
    let slug      = slugify(&input.title);
    let tags      = normalize_tags(&input.tags);
    let tag_list  = encode_tags(&tags)?;
    let author_id = author.get();

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
          "INSERT INTO articles (
             slug, title, description, body, tag_list, author_id,
             favorites_count, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?7)",
          rusqlite::params![
            slug,
            input.title,
            input.description,
            input.body,
            tag_list,
            author_id,
            now_str,
          ],
        )?;
        let article_id = tx.last_insert_rowid();
        link_tags(&tx, article_id, &tags)?;
        let raw = read_article(&tx, article_id)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    let article = raw
      .ok_or_else(|| Error::Decode("inserted article not readable".into()))?
      .into_article()?;
    tracing::debug!(article_id = %article.article_id, %author, "article created");
    Ok(article)
  }

  async fn get_article(&self, id: ArticleId) -> Result<Option<Article>> {
    let raw_id = id.get();
    let raw = self
      .conn
      .call(move |conn| Ok(read_article(conn, raw_id)?))
      .await?;
    raw.map(RawArticle::into_article).transpose()
  }

  async fn list_articles(&self, query: &ArticleQuery) -> Result<ArticlePage> {
    let author       = query.author.map(UserId::get);
    let tag          = query.tag.clone();
    let favorited_by = query.favorited_by.map(UserId::get);
    let followed_by  = query.followed_by.map(UserId::get);
    let limit_val    = i64::try_from(query.effective_limit()).unwrap_or(i64::MAX);
    let offset_val   = i64::try_from(query.offset.unwrap_or(0)).unwrap_or(i64::MAX);

    let (raws, total): (Vec<RawArticle>, i64) = self
      .conn
      .call(move |conn| {
        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM articles a WHERE {ARTICLE_FILTER}"),
          rusqlite::params![author, tag, favorited_by, followed_by],
          |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
          "SELECT {ARTICLE_COLUMNS}
           FROM articles a JOIN users u ON u.user_id = a.author_id
           WHERE {ARTICLE_FILTER}
           ORDER BY a.article_id DESC
           LIMIT ?5 OFFSET ?6"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![author, tag, favorited_by, followed_by, limit_val, offset_val],
            RawArticle::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((rows, total))
      })
      .await?;

    Ok(ArticlePage {
      articles: raws
        .into_iter()
        .map(RawArticle::into_article)
        .collect::<Result<_>>()?,
      total: u64::try_from(total).map_err(|_| Error::Decode(format!("invalid count: {total}")))?,
    })
  }

  async fn update_article(&self, article: &Article, update: ArticleUpdate) -> Result<Article> {
    let raw_id    = article.article_id.get();
    let author_id = article.author_id().get();
    let now_str   = encode_dt(Utc::now());
    let slug      = update.title.as_deref().map(slugify);
    let tags      = update.tags.map(normalize_tags);
    let tag_list  = tags.as_deref().map(encode_tags).transpose()?;
    let (title, description, body) = (update.title, update.description, update.body);

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
          "UPDATE articles SET
             title       = COALESCE(?3, title),
             slug        = COALESCE(?4, slug),
             description = COALESCE(?5, description),
             body        = COALESCE(?6, body),
             tag_list    = COALESCE(?7, tag_list),
             updated_at  = ?8
           WHERE article_id = ?1 AND author_id = ?2",
          rusqlite::params![
            raw_id,
            author_id,
            title,
            slug,
            description,
            body,
            tag_list,
            now_str,
          ],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        if let Some(tags) = &tags {
          link_tags(&tx, raw_id, tags)?;
        }
        let raw = read_article(&tx, raw_id)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw
      .ok_or_else(|| Error::NotFound(format!("article {}", article.article_id)))?
      .into_article()
  }

  async fn delete_article(&self, article: &Article) -> Result<()> {
    let raw_id    = article.article_id.get();
    let author_id = article.author_id().get();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM articles WHERE article_id = ?1 AND author_id = ?2",
          [raw_id, author_id],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::NotFound(format!("article {}", article.article_id)));
    }
    tracing::debug!(article_id = %article.article_id, "article deleted");
    Ok(())
  }

  async fn list_tags(&self) -> Result<Vec<String>> {
    let tags = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT t.name
           FROM tags t JOIN article_tags at ON at.tag_id = t.tag_id
           ORDER BY t.name",
        )?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(tags)
  }

  // ── Favorites ─────────────────────────────────────────────────────────────

  async fn toggle_favorite(&self, user: UserId, article: ArticleId) -> Result<FavoriteState> {
    self.run_favorite(user, article, FavoriteOp::Toggle).await
  }

  async fn favorite(&self, user: UserId, article: ArticleId) -> Result<FavoriteState> {
    self.run_favorite(user, article, FavoriteOp::Set).await
  }

  async fn unfavorite(&self, user: UserId, article: ArticleId) -> Result<FavoriteState> {
    self.run_favorite(user, article, FavoriteOp::Clear).await
  }

  async fn check_favorited(&self, user: UserId, article: ArticleId) -> Result<bool> {
    let (user_id, raw_id) = (user.get(), article.get());
    let found = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT 1 FROM favorites
             WHERE user_id = ?1 AND article_id = ?2 AND deleted_at IS NULL",
            [user_id, raw_id],
            |_| Ok(()),
          )
          .optional()?)
      })
      .await?;
    Ok(found.is_some())
  }

  async fn favorites_status(&self, user: UserId, articles: &[ArticleId]) -> Result<Vec<bool>> {
    if articles.is_empty() {
      return Ok(vec![]);
    }
    let ids     = encode_id_set(articles.iter().map(|id| id.get()))?;
    let user_id = user.get();

    let active: HashSet<i64> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT article_id FROM favorites
           WHERE user_id = ?1 AND deleted_at IS NULL
             AND article_id IN (SELECT value FROM json_each(?2))",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_id, ids], |row| row.get(0))?
          .collect::<rusqlite::Result<HashSet<i64>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(articles.iter().map(|id| active.contains(&id.get())).collect())
  }
}
