//! Registration, login and the caller's own account.

use std::sync::Arc;

use folio_auth::{
  TokenService,
  password::{hash_password_blocking, verify_password_blocking},
  principal,
};
use folio_core::{
  Error, Result,
  store::UserStore,
  user::{NewUser, User, UserUpdate},
};

use crate::{required, store_err};

#[derive(Debug, Clone)]
pub struct Registration {
  pub username: String,
  pub email:    String,
  pub password: String,
}

/// Requested account changes; `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
  pub email:    Option<String>,
  pub username: Option<String>,
  pub password: Option<String>,
  pub bio:      Option<String>,
  pub image:    Option<String>,
}

/// A user together with a freshly issued session token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
  pub user:  User,
  pub token: String,
}

pub struct UserService<S> {
  store:  Arc<S>,
  tokens: Arc<TokenService>,
}

impl<S> Clone for UserService<S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), tokens: self.tokens.clone() }
  }
}

fn check_email(email: &str) -> Result<&str> {
  let email = required("email", email)?;
  if !email.contains('@') {
    return Err(Error::validation("email", "is invalid"));
  }
  Ok(email)
}

impl<S: UserStore> UserService<S> {
  pub fn new(store: Arc<S>, tokens: Arc<TokenService>) -> Self { Self { store, tokens } }

  fn authenticated(&self, user: User) -> AuthenticatedUser {
    let token = self.tokens.issue(user.user_id);
    AuthenticatedUser { user, token }
  }

  pub async fn register(&self, input: Registration) -> Result<AuthenticatedUser> {
    let username = required("username", &input.username)?;
    let email = check_email(&input.email)?;
    if input.password.is_empty() {
      return Err(Error::validation("password", "can't be blank"));
    }

    // Fast path only; the UNIQUE constraints decide races.
    if self.store.find_by_email(email).await.map_err(store_err)?.is_some() {
      return Err(Error::AlreadyExists("email".into()));
    }
    if self.store.find_by_username(username).await.map_err(store_err)?.is_some() {
      return Err(Error::AlreadyExists("username".into()));
    }

    let password_hash = hash_password_blocking(input.password.clone()).await?;
    let user = self
      .store
      .create_user(NewUser {
        email: email.to_owned(),
        username: username.to_owned(),
        password_hash,
      })
      .await
      .map_err(store_err)?;

    tracing::info!(user_id = %user.user_id, username = %user.username, "user registered");
    Ok(self.authenticated(user))
  }

  /// Unknown email and wrong password fail the same way.
  pub async fn login(&self, email: &str, password: &str) -> Result<AuthenticatedUser> {
    let email = required("email", email)?;
    if password.is_empty() {
      return Err(Error::validation("password", "can't be blank"));
    }

    let Some(credential) = self.store.find_by_email(email).await.map_err(store_err)? else {
      tracing::debug!("login for unknown email");
      return Err(Error::Unauthenticated);
    };
    let verified =
      verify_password_blocking(credential.password_hash.clone(), password.to_owned()).await;
    if !verified {
      tracing::debug!(user_id = %credential.user.user_id, "login with wrong password");
      return Err(Error::Unauthenticated);
    }

    tracing::info!(user_id = %credential.user.user_id, "user logged in");
    Ok(self.authenticated(credential.user))
  }

  /// The signed-in caller's account. A valid token for a user that no
  /// longer exists counts as unauthenticated.
  pub async fn current_user(&self) -> Result<AuthenticatedUser> {
    let me = principal::current()?;
    let user = self
      .store
      .find_by_id(me)
      .await
      .map_err(store_err)?
      .ok_or(Error::Unauthenticated)?;
    Ok(self.authenticated(user))
  }

  pub async fn update_user(&self, changes: UserChanges) -> Result<AuthenticatedUser> {
    let me = principal::current()?;

    let email = changes.email.as_deref().map(check_email).transpose()?.map(str::to_owned);
    let username = changes
      .username
      .as_deref()
      .map(|u| required("username", u))
      .transpose()?
      .map(str::to_owned);
    let password_hash = match changes.password {
      Some(password) if password.is_empty() => {
        return Err(Error::validation("password", "can't be blank"));
      }
      Some(password) => Some(hash_password_blocking(password).await?),
      None => None,
    };

    let user = self
      .store
      .update_user(me, UserUpdate {
        email,
        username,
        bio: changes.bio,
        image: changes.image,
        password_hash,
      })
      .await
      .map_err(store_err)?;

    tracing::info!(user_id = %me, "user updated");
    Ok(self.authenticated(user))
  }
}
