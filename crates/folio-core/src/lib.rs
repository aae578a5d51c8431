//! Core types and trait definitions for the Folio publishing backend.
//!
//! Free of HTTP and database dependencies; every other crate builds on it.

pub mod article;
pub mod error;
pub mod id;
pub mod store;
pub mod user;

pub use error::{Error, Result};
pub use id::{ArticleId, CommentId, UserId};
