//! Authentication and authorization for Folio.
//!
//! - [`token`]: stateless, signed, expiring session tokens.
//! - [`policy`]: which operations demand a verified token.
//! - [`principal`]: the per-request caller identity, scoped to the task.
//! - [`ownership`]: author-only mutation checks.
//! - [`password`]: Argon2 password hashing.

pub mod ownership;
pub mod password;
pub mod policy;
pub mod principal;
pub mod token;

pub use policy::{Enforcement, Operation, RoutePolicy};
pub use principal::Principal;
pub use token::TokenService;
