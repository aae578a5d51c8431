//! Stateless session tokens.
//!
//! A token is `base64url(payload) "." base64url(tag)` where the payload is
//! the ASCII text `"{subject}.{issued_at}.{expires_at}"` (Unix seconds) and
//! the tag is HMAC-SHA256 over the payload bytes under the server secret.
//!
//! Issuing is deterministic for a given subject and instant. Verification
//! compares tags in constant time and collapses every failure mode (bad
//! encoding, bad tag, expired, issued in the future) into `None`, so callers
//! cannot tell them apart.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD as B64};
use chrono::{DateTime, Duration, Utc};
use folio_core::{Error, UserId};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error as ThisError;

type HmacSha256 = Hmac<Sha256>;

/// Tolerated clock skew for tokens minted by another instance.
const ISSUED_AT_LEEWAY_SECS: i64 = 60;

/// Longest accepted token lifetime.
pub const MAX_LIFETIME: Duration = Duration::days(365);

/// Reasons a [`TokenService`] cannot be constructed.
#[derive(Debug, ThisError)]
pub enum TokenConfigError {
  #[error("token secret must not be empty")]
  EmptySecret,
  #[error("token lifetime must be positive")]
  NonPositiveLifetime,
  #[error("token lifetime must not exceed {} days", MAX_LIFETIME.num_days())]
  LifetimeTooLong,
  #[error("token secret rejected by HMAC")]
  InvalidKey,
}

/// Issues and verifies session tokens. Immutable after construction; share
/// it behind an `Arc`.
#[derive(Clone)]
pub struct TokenService {
  mac:      HmacSha256,
  lifetime: Duration,
}

impl fmt::Debug for TokenService {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TokenService")
      .field("lifetime", &self.lifetime)
      .finish_non_exhaustive()
  }
}

struct Claims {
  subject:    i64,
  issued_at:  i64,
  expires_at: i64,
}

impl Claims {
  fn encode(&self) -> String {
    format!("{}.{}.{}", self.subject, self.issued_at, self.expires_at)
  }

  fn decode(bytes: &[u8]) -> Option<Self> {
    let text = std::str::from_utf8(bytes).ok()?;
    let mut parts = text.split('.');
    let subject = parts.next()?.parse().ok()?;
    let issued_at = parts.next()?.parse().ok()?;
    let expires_at = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
      return None;
    }
    Some(Self { subject, issued_at, expires_at })
  }
}

impl TokenService {
  pub fn new(secret: &[u8], lifetime: Duration) -> Result<Self, TokenConfigError> {
    if secret.is_empty() {
      return Err(TokenConfigError::EmptySecret);
    }
    if lifetime <= Duration::zero() {
      return Err(TokenConfigError::NonPositiveLifetime);
    }
    if lifetime > MAX_LIFETIME {
      return Err(TokenConfigError::LifetimeTooLong);
    }
    let mac = HmacSha256::new_from_slice(secret)
      .map_err(|_| TokenConfigError::InvalidKey)?;
    Ok(Self { mac, lifetime })
  }

  pub fn lifetime(&self) -> Duration { self.lifetime }

  /// Issue a token for `subject`, valid from now.
  pub fn issue(&self, subject: UserId) -> String { self.issue_at(subject, Utc::now()) }

  /// Issue a token for `subject` as if the current time were `now`.
  pub fn issue_at(&self, subject: UserId, now: DateTime<Utc>) -> String {
    let expires_at = now
      .checked_add_signed(self.lifetime)
      .unwrap_or(DateTime::<Utc>::MAX_UTC);
    let claims = Claims {
      subject:    subject.get(),
      issued_at:  now.timestamp(),
      expires_at: expires_at.timestamp(),
    };
    let payload = claims.encode();
    let tag = self.sign(payload.as_bytes());
    format!("{}.{}", B64.encode(payload), B64.encode(tag))
  }

  /// Verify `token` against the current time.
  pub fn verify(&self, token: &str) -> Option<UserId> { self.verify_at(token, Utc::now()) }

  /// Verify `token` as if the current time were `now`. Returns the subject
  /// only if the tag matches and the token is within its lifetime.
  pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Option<UserId> {
    let (payload_b64, tag_b64) = token.split_once('.')?;
    let payload = B64.decode(payload_b64).ok()?;
    let tag = B64.decode(tag_b64).ok()?;

    let mut mac = self.mac.clone();
    mac.update(&payload);
    mac.verify_slice(&tag).ok()?;

    let claims = Claims::decode(&payload)?;
    let now = now.timestamp();
    if claims.expires_at <= now || claims.issued_at > now + ISSUED_AT_LEEWAY_SECS {
      return None;
    }
    Some(UserId::new(claims.subject))
  }

  /// [`verify`](Self::verify) mapped onto the error taxonomy.
  pub fn authenticate(&self, token: &str) -> Result<UserId, Error> {
    self.verify(token).ok_or(Error::Unauthenticated)
  }

  fn sign(&self, payload: &[u8]) -> Vec<u8> {
    let mut mac = self.mac.clone();
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
  }
}
