//! Error type for `folio-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("decode error: {0}")]
  Decode(String),

  #[error("{0} not found")]
  NotFound(String),

  /// A UNIQUE constraint rejected the write; carries the colliding field.
  #[error("{0} already exists")]
  Duplicate(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for folio_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::NotFound(what) => Self::NotFound(what),
      Error::Duplicate(what) => Self::AlreadyExists(what),
      other => Self::Store(Box::new(other)),
    }
  }
}

/// The column named by a UNIQUE violation, e.g. `email` for
/// `UNIQUE constraint failed: users.email`.
pub(crate) fn unique_violation(e: &tokio_rusqlite::Error) -> Option<String> {
  let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(failure, msg)) = e else {
    return None;
  };
  if failure.extended_code != rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
    return None;
  }
  let column = msg
    .as_deref()
    .and_then(|m| m.rsplit('.').next())
    .unwrap_or("record");
  Some(column.to_owned())
}

/// Map a write error, turning UNIQUE violations into [`Error::Duplicate`].
pub(crate) fn map_write_error(e: tokio_rusqlite::Error) -> Error {
  match unique_violation(&e) {
    Some(column) => Error::Duplicate(column),
    None => Error::Database(e),
  }
}
