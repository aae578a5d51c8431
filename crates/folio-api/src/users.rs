//! Handlers for `/users` and `/user` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/users/login` | Body: `{"user":{"email","password"}}` |
//! | `POST` | `/api/users` | Body: `{"user":{"username","email","password"}}` |
//! | `GET`  | `/api/user` | Requires a token |
//! | `PUT`  | `/api/user` | Any subset of `email`, `username`, `password`, `bio`, `image` |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use folio_service::{AuthenticatedUser, Registration, Store, UserChanges};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

/// `{"user": …}` request and response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserEnvelope<T> {
  pub user: T,
}

#[derive(Debug, Serialize)]
pub struct UserView {
  pub email:    String,
  pub token:    String,
  pub username: String,
  pub bio:      Option<String>,
  pub image:    Option<String>,
}

impl From<AuthenticatedUser> for UserEnvelope<UserView> {
  fn from(auth: AuthenticatedUser) -> Self {
    UserEnvelope {
      user: UserView {
        email:    auth.user.email,
        token:    auth.token,
        username: auth.user.username,
        bio:      auth.user.bio,
        image:    auth.user.image,
      },
    }
  }
}

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

/// `POST /api/users/login`
pub async fn login<S: Store>(
  State(state): State<AppState<S>>,
  Json(body): Json<UserEnvelope<LoginBody>>,
) -> Result<Json<UserEnvelope<UserView>>, ApiError> {
  let auth = state.users.login(&body.user.email, &body.user.password).await?;
  Ok(Json(auth.into()))
}

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub username: String,
  pub email:    String,
  pub password: String,
}

/// `POST /api/users`
pub async fn register<S: Store>(
  State(state): State<AppState<S>>,
  Json(body): Json<UserEnvelope<RegisterBody>>,
) -> Result<impl IntoResponse, ApiError> {
  let RegisterBody { username, email, password } = body.user;
  let auth = state
    .users
    .register(Registration { username, email, password })
    .await?;
  Ok((StatusCode::CREATED, Json(UserEnvelope::from(auth))))
}

// ─── Current user ─────────────────────────────────────────────────────────────

/// `GET /api/user`
pub async fn current<S: Store>(
  State(state): State<AppState<S>>,
) -> Result<Json<UserEnvelope<UserView>>, ApiError> {
  let auth = state.users.current_user().await?;
  Ok(Json(auth.into()))
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateBody {
  pub email:    Option<String>,
  pub username: Option<String>,
  pub password: Option<String>,
  pub bio:      Option<String>,
  pub image:    Option<String>,
}

/// `PUT /api/user`
pub async fn update<S: Store>(
  State(state): State<AppState<S>>,
  Json(body): Json<UserEnvelope<UpdateBody>>,
) -> Result<Json<UserEnvelope<UserView>>, ApiError> {
  let UpdateBody { email, username, password, bio, image } = body.user;
  let auth = state
    .users
    .update_user(UserChanges { email, username, password, bio, image })
    .await?;
  Ok(Json(auth.into()))
}
