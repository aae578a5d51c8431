//! Argon2id password hashing.

use argon2::{
  Argon2, PasswordHash as PhcHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use folio_core::{Error, user::PasswordHash};
use rand_core::OsRng;

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<PasswordHash, Error> {
  let salt = SaltString::generate(&mut OsRng);
  let phc = Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map_err(|e| Error::Store(format!("argon2 error: {e}").into()))?
    .to_string();
  Ok(PasswordHash::new(phc))
}

/// Check `password` against a stored hash. An unparsable hash never
/// verifies.
pub fn verify_password(hash: &PasswordHash, password: &str) -> bool {
  let Ok(parsed) = PhcHash::new(hash.as_str()) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

/// [`hash_password`] on the blocking thread pool.
pub async fn hash_password_blocking(password: String) -> Result<PasswordHash, Error> {
  tokio::task::spawn_blocking(move || hash_password(&password))
    .await
    .map_err(|e| Error::Store(Box::new(e)))?
}

/// [`verify_password`] on the blocking thread pool. A panicked or cancelled
/// check never verifies.
pub async fn verify_password_blocking(hash: PasswordHash, password: String) -> bool {
  tokio::task::spawn_blocking(move || verify_password(&hash, &password))
    .await
    .unwrap_or(false)
}
