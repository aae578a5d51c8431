//! Handlers for `/articles` and `/tags` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/articles` | `?tag=&author=&favorited=&limit=&offset=` |
//! | `GET`  | `/api/articles/feed` | Followed authors; requires a token |
//! | `POST` | `/api/articles` | Body: `{"article":{"title","description","body","tagList"}}` |
//! | `GET`  | `/api/articles/{id}` | 404 if not found |
//! | `PUT`  | `/api/articles/{id}` | Author only |
//! | `DELETE` | `/api/articles/{id}` | Author only |
//! | `POST`/`DELETE` | `/api/articles/{id}/favorite` | Idempotent |
//! | `POST` | `/api/articles/{id}/favorite/toggle` | Flips the favorite |
//! | `GET`  | `/api/tags` | Tags in use |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use folio_core::{
  ArticleId,
  article::{Article, ArticleUpdate, NewArticle},
  store::ArticlePage,
};
use folio_service::{ArticleFilter, Store};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError, profiles::ProfileView};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleView {
  pub id:              ArticleId,
  pub slug:            String,
  pub title:           String,
  pub description:     String,
  pub body:            String,
  pub tag_list:        Vec<String>,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
  pub favorited:       bool,
  pub favorites_count: u32,
  pub author:          ProfileView,
}

impl From<Article> for ArticleView {
  fn from(a: Article) -> Self {
    ArticleView {
      id:              a.article_id,
      slug:            a.slug,
      title:           a.title,
      description:     a.description,
      body:            a.body,
      tag_list:        a.tags,
      created_at:      a.created_at,
      updated_at:      a.updated_at,
      favorited:       a.favorited,
      favorites_count: a.favorites_count,
      author:          a.author.into(),
    }
  }
}

/// `{"article": …}` request and response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ArticleEnvelope<T> {
  pub article: T,
}

impl From<Article> for ArticleEnvelope<ArticleView> {
  fn from(a: Article) -> Self { ArticleEnvelope { article: a.into() } }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleList {
  pub articles:       Vec<ArticleView>,
  pub articles_count: u64,
}

impl From<ArticlePage> for ArticleList {
  fn from(page: ArticlePage) -> Self {
    ArticleList {
      articles:       page.articles.into_iter().map(ArticleView::from).collect(),
      articles_count: page.total,
    }
  }
}

// ─── List & feed ──────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub tag:       Option<String>,
  pub author:    Option<String>,
  pub favorited: Option<String>,
  pub limit:     Option<usize>,
  pub offset:    Option<usize>,
}

/// `GET /api/articles`
pub async fn list<S: Store>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<ArticleList>, ApiError> {
  let ListParams { tag, author, favorited, limit, offset } = params;
  let page = state
    .articles
    .list(ArticleFilter { tag, author, favorited, limit, offset })
    .await?;
  Ok(Json(page.into()))
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedParams {
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// `GET /api/articles/feed`
pub async fn feed<S: Store>(
  State(state): State<AppState<S>>,
  Query(params): Query<FeedParams>,
) -> Result<Json<ArticleList>, ApiError> {
  let page = state.articles.feed(params.limit, params.offset).await?;
  Ok(Json(page.into()))
}

// ─── Single article ───────────────────────────────────────────────────────────

/// `GET /api/articles/{id}`
pub async fn get_one<S: Store>(
  State(state): State<AppState<S>>,
  Path(id): Path<ArticleId>,
) -> Result<Json<ArticleEnvelope<ArticleView>>, ApiError> {
  let article = state.articles.get(id).await?;
  Ok(Json(article.into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  pub title:       String,
  #[serde(default)]
  pub description: String,
  pub body:        String,
  #[serde(default)]
  pub tag_list:    Vec<String>,
}

/// `POST /api/articles`
pub async fn create<S: Store>(
  State(state): State<AppState<S>>,
  Json(body): Json<ArticleEnvelope<CreateBody>>,
) -> Result<impl IntoResponse, ApiError> {
  let CreateBody { title, description, body, tag_list } = body.article;
  let article = state
    .articles
    .create(NewArticle { title, description, body, tags: tag_list })
    .await?;
  Ok((StatusCode::CREATED, Json(ArticleEnvelope::from(article))))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBody {
  pub title:       Option<String>,
  pub description: Option<String>,
  pub body:        Option<String>,
  pub tag_list:    Option<Vec<String>>,
}

/// `PUT /api/articles/{id}`
pub async fn update<S: Store>(
  State(state): State<AppState<S>>,
  Path(id): Path<ArticleId>,
  Json(body): Json<ArticleEnvelope<UpdateBody>>,
) -> Result<Json<ArticleEnvelope<ArticleView>>, ApiError> {
  let UpdateBody { title, description, body, tag_list } = body.article;
  let article = state
    .articles
    .update(id, ArticleUpdate { title, description, body, tags: tag_list })
    .await?;
  Ok(Json(article.into()))
}

/// `DELETE /api/articles/{id}`
pub async fn delete_one<S: Store>(
  State(state): State<AppState<S>>,
  Path(id): Path<ArticleId>,
) -> Result<StatusCode, ApiError> {
  state.articles.delete(id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Favorites ────────────────────────────────────────────────────────────────

/// `POST /api/articles/{id}/favorite`
pub async fn favorite<S: Store>(
  State(state): State<AppState<S>>,
  Path(id): Path<ArticleId>,
) -> Result<Json<ArticleEnvelope<ArticleView>>, ApiError> {
  let article = state.articles.favorite(id).await?;
  Ok(Json(article.into()))
}

/// `DELETE /api/articles/{id}/favorite`
pub async fn unfavorite<S: Store>(
  State(state): State<AppState<S>>,
  Path(id): Path<ArticleId>,
) -> Result<Json<ArticleEnvelope<ArticleView>>, ApiError> {
  let article = state.articles.unfavorite(id).await?;
  Ok(Json(article.into()))
}

/// `POST /api/articles/{id}/favorite/toggle`
pub async fn toggle_favorite<S: Store>(
  State(state): State<AppState<S>>,
  Path(id): Path<ArticleId>,
) -> Result<Json<ArticleEnvelope<ArticleView>>, ApiError> {
  let article = state.articles.toggle_favorite(id).await?;
  Ok(Json(article.into()))
}

// ─── Tags ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TagList {
  pub tags: Vec<String>,
}

/// `GET /api/tags`
pub async fn tags<S: Store>(
  State(state): State<AppState<S>>,
) -> Result<Json<TagList>, ApiError> {
  let tags = state.articles.tags().await?;
  Ok(Json(TagList { tags }))
}
