//! Bearer-token authentication middleware.
//!
//! Accepts `Authorization: Token <t>` and `Authorization: Bearer <t>`.

use axum::{
  extract::{MatchedPath, Request, State},
  http::{HeaderValue, Method, header},
  middleware::Next,
  response::Response,
};
use folio_auth::{Enforcement, Operation, Principal, TokenService, principal};
use folio_core::UserId;
use folio_service::Store;

use crate::{AppState, error::ApiError, routes};

/// The operation served by a matched route template, if any.
pub fn operation_for(method: &Method, path: &str) -> Option<Operation> {
  let op = match (method.as_str(), path) {
    ("POST", routes::LOGIN) => Operation::Login,
    ("POST", routes::USERS) => Operation::Register,
    ("GET", routes::USER) => Operation::GetCurrentUser,
    ("PUT", routes::USER) => Operation::UpdateUser,
    ("GET", routes::PROFILE) => Operation::GetProfile,
    ("POST", routes::FOLLOW) => Operation::FollowUser,
    ("DELETE", routes::FOLLOW) => Operation::UnfollowUser,
    ("GET", routes::ARTICLES) => Operation::ListArticles,
    ("POST", routes::ARTICLES) => Operation::CreateArticle,
    ("GET", routes::FEED) => Operation::FeedArticles,
    ("GET", routes::ARTICLE) => Operation::GetArticle,
    ("PUT", routes::ARTICLE) => Operation::UpdateArticle,
    ("DELETE", routes::ARTICLE) => Operation::DeleteArticle,
    ("POST", routes::FAVORITE) => Operation::FavoriteArticle,
    ("DELETE", routes::FAVORITE) => Operation::UnfavoriteArticle,
    ("POST", routes::FAVORITE_TOGGLE) => Operation::ToggleFavorite,
    ("GET", routes::COMMENTS) => Operation::GetComments,
    ("POST", routes::COMMENTS) => Operation::AddComment,
    ("DELETE", routes::COMMENT) => Operation::DeleteComment,
    ("GET", routes::TAGS) => Operation::GetTags,
    _ => return None,
  };
  Some(op)
}

/// Extract the token from an `Authorization` header value.
pub fn bearer_token(value: &str) -> Option<&str> {
  let token = value
    .strip_prefix("Token ")
    .or_else(|| value.strip_prefix("Bearer "))?
    .trim();
  (!token.is_empty()).then_some(token)
}

fn verify_header(
  tokens: &TokenService,
  header: Option<&HeaderValue>,
  op:     Operation,
) -> Result<UserId, ApiError> {
  let Some(value) = header else {
    tracing::debug!(?op, "missing token");
    return Err(ApiError::Unauthenticated);
  };
  let subject = value
    .to_str()
    .ok()
    .and_then(bearer_token)
    .and_then(|token| tokens.verify(token));
  match subject {
    Some(user_id) => Ok(user_id),
    None => {
      tracing::warn!(?op, "rejected token");
      Err(ApiError::Unauthenticated)
    }
  }
}

/// Resolve the caller for the matched route and run the rest of the stack
/// inside its principal scope.
pub async fn authenticate<S: Store>(
  State(state): State<AppState<S>>,
  req:          Request,
  next:         Next,
) -> Result<Response, ApiError> {
  let op = req
    .extensions()
    .get::<MatchedPath>()
    .and_then(|path| operation_for(req.method(), path.as_str()));
  let header = req.headers().get(header::AUTHORIZATION);

  // Unmapped routes run anonymously, so usecases needing a caller refuse.
  let principal = match op {
    Some(op) => match state.policy.requires_auth(op, header.is_some()) {
      Enforcement::Skip => Principal::Anonymous,
      Enforcement::Require => Principal::User(verify_header(&state.tokens, header, op)?),
    },
    None => Principal::Anonymous,
  };

  Ok(principal::scope(principal, next.run(req)).await)
}
