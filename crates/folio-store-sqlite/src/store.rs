//! The SQLite implementation of the Folio store traits, [`SqliteStore`].
//!
//! The trait impls live in sibling modules: `users` (credentials, profiles,
//! follows), `articles` (articles, tags, favorites) and `comments`.

use std::path::Path;

use crate::{Result, schema::SCHEMA};

/// A Folio store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls
/// are executed in order on the connection's thread; multi-statement writes
/// additionally run inside `IMMEDIATE` transactions so they stay atomic
/// against other processes sharing the file.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
