//! SQLite backend for the Folio store traits.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod articles;
mod comments;
mod encode;
mod schema;
mod store;
mod users;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
