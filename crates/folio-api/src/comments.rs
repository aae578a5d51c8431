//! Handlers for `/articles/{id}/comments` endpoints.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use folio_core::{ArticleId, CommentId, article::Comment};
use folio_service::Store;
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError, profiles::ProfileView};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
  pub id:         CommentId,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub body:       String,
  pub author:     ProfileView,
}

impl From<Comment> for CommentView {
  fn from(c: Comment) -> Self {
    CommentView {
      id:         c.comment_id,
      created_at: c.created_at,
      updated_at: c.updated_at,
      body:       c.body,
      author:     c.author.into(),
    }
  }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentEnvelope<T> {
  pub comment: T,
}

#[derive(Debug, Serialize)]
pub struct CommentList {
  pub comments: Vec<CommentView>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub body: String,
}

/// `GET /api/articles/{id}/comments`
pub async fn list<S: Store>(
  State(state): State<AppState<S>>,
  Path(id): Path<ArticleId>,
) -> Result<Json<CommentList>, ApiError> {
  let comments = state.articles.list_comments(id).await?;
  Ok(Json(CommentList {
    comments: comments.into_iter().map(CommentView::from).collect(),
  }))
}

/// `POST /api/articles/{id}/comments`
pub async fn create<S: Store>(
  State(state): State<AppState<S>>,
  Path(id): Path<ArticleId>,
  Json(body): Json<CommentEnvelope<CreateBody>>,
) -> Result<impl IntoResponse, ApiError> {
  let comment = state.articles.add_comment(id, &body.comment.body).await?;
  Ok((
    StatusCode::CREATED,
    Json(CommentEnvelope { comment: CommentView::from(comment) }),
  ))
}

/// `DELETE /api/articles/{id}/comments/{comment}`
pub async fn delete_one<S: Store>(
  State(state): State<AppState<S>>,
  Path((id, comment)): Path<(ArticleId, CommentId)>,
) -> Result<StatusCode, ApiError> {
  state.articles.delete_comment(id, comment).await?;
  Ok(StatusCode::NO_CONTENT)
}
