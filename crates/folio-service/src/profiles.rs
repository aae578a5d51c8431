//! Public profiles and the follow relationship.

use std::sync::Arc;

use folio_auth::principal;
use folio_core::{
  Error, Result, UserId,
  store::ProfileStore,
  user::Profile,
};

use crate::store_err;

pub struct ProfileService<S> {
  store: Arc<S>,
}

impl<S> Clone for ProfileService<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone() } }
}

impl<S: ProfileStore> ProfileService<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  async fn find(&self, username: &str) -> Result<Profile> {
    self
      .store
      .get_profile(username)
      .await
      .map_err(store_err)?
      .ok_or_else(|| Error::NotFound("profile".into()))
  }

  /// A profile as seen by the caller; `following` is always false for
  /// anonymous callers.
  pub async fn get_profile(&self, username: &str) -> Result<Profile> {
    let mut profile = self.find(username).await?;
    if let Some(viewer) = principal::current_or_anonymous().user_id() {
      profile.following = self
        .store
        .is_following(viewer, profile.user_id)
        .await
        .map_err(store_err)?;
    }
    Ok(profile)
  }

  pub async fn follow(&self, username: &str) -> Result<Profile> {
    let me = principal::current()?;
    let mut profile = self.find(username).await?;
    reject_self(me, &profile)?;

    let changed = self
      .store
      .follow_user(me, profile.user_id)
      .await
      .map_err(store_err)?;
    if changed {
      tracing::debug!(follower = %me, followee = %profile.user_id, "follow added");
    }
    profile.following = true;
    Ok(profile)
  }

  pub async fn unfollow(&self, username: &str) -> Result<Profile> {
    let me = principal::current()?;
    let mut profile = self.find(username).await?;
    reject_self(me, &profile)?;

    let changed = self
      .store
      .unfollow_user(me, profile.user_id)
      .await
      .map_err(store_err)?;
    if changed {
      tracing::debug!(follower = %me, followee = %profile.user_id, "follow removed");
    }
    profile.following = false;
    Ok(profile)
  }
}

fn reject_self(me: UserId, profile: &Profile) -> Result<()> {
  if profile.user_id == me {
    return Err(Error::validation("username", "cannot follow yourself"));
  }
  Ok(())
}
