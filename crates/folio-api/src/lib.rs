//! JSON REST API for Folio.
//!
//! Exposes an axum [`Router`] backed by any [`folio_service::Store`]. Every
//! route passes through [`auth::authenticate`], which resolves the caller
//! according to the [`RoutePolicy`] and runs the handler inside the
//! principal scope.

pub mod articles;
pub mod auth;
pub mod comments;
pub mod error;
pub mod profiles;
pub mod users;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router, middleware,
  routing::{delete, get, post},
};
use folio_auth::{RoutePolicy, TokenService, token::TokenConfigError};
use folio_service::{ArticleService, ProfileService, Store, UserService};
use serde::Deserialize;
use thiserror::Error;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Default session token lifetime: seven days.
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Runtime server configuration, deserialised from `config.toml` and
/// `FOLIO_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:           String,
  #[serde(default = "default_port")]
  pub port:           u16,
  #[serde(default = "default_store_path")]
  pub store_path:     PathBuf,
  pub token_secret:   String,
  #[serde(default = "default_token_ttl_secs")]
  pub token_ttl_secs: u64,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8000 }
fn default_store_path() -> PathBuf { PathBuf::from("folio.db") }
fn default_token_ttl_secs() -> u64 { DEFAULT_TOKEN_TTL_SECS }

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error(transparent)]
  Token(#[from] TokenConfigError),
  #[error("token_ttl_secs out of range: {0}")]
  TokenTtl(u64),
}

impl ServerConfig {
  /// Build the token service from the configured secret and lifetime.
  pub fn token_service(&self) -> Result<TokenService, ConfigError> {
    let lifetime = i64::try_from(self.token_ttl_secs)
      .ok()
      .and_then(chrono::Duration::try_seconds)
      .ok_or(ConfigError::TokenTtl(self.token_ttl_secs))?;
    Ok(TokenService::new(self.token_secret.as_bytes(), lifetime)?)
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub users:    UserService<S>,
  pub profiles: ProfileService<S>,
  pub articles: ArticleService<S>,
  pub tokens:   Arc<TokenService>,
  pub policy:   Arc<RoutePolicy>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      users:    self.users.clone(),
      profiles: self.profiles.clone(),
      articles: self.articles.clone(),
      tokens:   self.tokens.clone(),
      policy:   self.policy.clone(),
    }
  }
}

impl<S: Store> AppState<S> {
  pub fn new(store: Arc<S>, tokens: Arc<TokenService>, policy: RoutePolicy) -> Self {
    Self {
      users: UserService::new(store.clone(), tokens.clone()),
      profiles: ProfileService::new(store.clone()),
      articles: ArticleService::new(store),
      tokens,
      policy: Arc::new(policy),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Route templates, shared by the router and [`auth::operation_for`].
pub mod routes {
  pub const LOGIN: &str = "/api/users/login";
  pub const USERS: &str = "/api/users";
  pub const USER: &str = "/api/user";
  pub const PROFILE: &str = "/api/profiles/{username}";
  pub const FOLLOW: &str = "/api/profiles/{username}/follow";
  pub const ARTICLES: &str = "/api/articles";
  pub const FEED: &str = "/api/articles/feed";
  pub const ARTICLE: &str = "/api/articles/{id}";
  pub const FAVORITE: &str = "/api/articles/{id}/favorite";
  pub const FAVORITE_TOGGLE: &str = "/api/articles/{id}/favorite/toggle";
  pub const COMMENTS: &str = "/api/articles/{id}/comments";
  pub const COMMENT: &str = "/api/articles/{id}/comments/{comment}";
  pub const TAGS: &str = "/api/tags";
}

/// Build the API router for `state`.
pub fn router<S: Store>(state: AppState<S>) -> Router {
  Router::new()
    // Users
    .route(routes::LOGIN,           post(users::login::<S>))
    .route(routes::USERS,           post(users::register::<S>))
    .route(routes::USER,            get(users::current::<S>).put(users::update::<S>))
    // Profiles
    .route(routes::PROFILE,         get(profiles::get_one::<S>))
    .route(routes::FOLLOW,          post(profiles::follow::<S>).delete(profiles::unfollow::<S>))
    // Articles
    .route(routes::ARTICLES,        get(articles::list::<S>).post(articles::create::<S>))
    .route(routes::FEED,            get(articles::feed::<S>))
    .route(
      routes::ARTICLE,
      get(articles::get_one::<S>)
        .put(articles::update::<S>)
        .delete(articles::delete_one::<S>),
    )
    .route(routes::FAVORITE,        post(articles::favorite::<S>).delete(articles::unfavorite::<S>))
    .route(routes::FAVORITE_TOGGLE, post(articles::toggle_favorite::<S>))
    // Comments
    .route(routes::COMMENTS,        get(comments::list::<S>).post(comments::create::<S>))
    .route(routes::COMMENT,         delete(comments::delete_one::<S>))
    // Tags
    .route(routes::TAGS,            get(articles::tags::<S>))
    .route_layer(middleware::from_fn_with_state(state.clone(), auth::authenticate::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod tests;
