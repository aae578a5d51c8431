//! Handlers for `/profiles` endpoints.

use axum::{
  Json,
  extract::{Path, State},
};
use folio_core::user::Profile;
use folio_service::Store;
use serde::Serialize;

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct ProfileView {
  pub username:  String,
  pub bio:       Option<String>,
  pub image:     Option<String>,
  pub following: bool,
}

impl From<Profile> for ProfileView {
  fn from(p: Profile) -> Self {
    ProfileView {
      username:  p.username,
      bio:       p.bio,
      image:     p.image,
      following: p.following,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct ProfileEnvelope {
  pub profile: ProfileView,
}

impl From<Profile> for ProfileEnvelope {
  fn from(p: Profile) -> Self { ProfileEnvelope { profile: p.into() } }
}

/// `GET /api/profiles/{username}`
pub async fn get_one<S: Store>(
  State(state): State<AppState<S>>,
  Path(username): Path<String>,
) -> Result<Json<ProfileEnvelope>, ApiError> {
  let profile = state.profiles.get_profile(&username).await?;
  Ok(Json(profile.into()))
}

/// `POST /api/profiles/{username}/follow`
pub async fn follow<S: Store>(
  State(state): State<AppState<S>>,
  Path(username): Path<String>,
) -> Result<Json<ProfileEnvelope>, ApiError> {
  let profile = state.profiles.follow(&username).await?;
  Ok(Json(profile.into()))
}

/// `DELETE /api/profiles/{username}/follow`
pub async fn unfollow<S: Store>(
  State(state): State<AppState<S>>,
  Path(username): Path<String>,
) -> Result<Json<ProfileEnvelope>, ApiError> {
  let profile = state.profiles.unfollow(&username).await?;
  Ok(Json(profile.into()))
}
