//! The caller identity for the request being processed.
//!
//! The transport resolves the principal once and runs the handler inside
//! [`scope`]. Usecases read it back with [`current`] or
//! [`current_or_anonymous`]. The value lives in task-local storage, so it is
//! immutable for the request and invisible to every other request.

use std::future::Future;

use folio_core::{Error, UserId};

/// Who is making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
  Anonymous,
  User(UserId),
}

impl Principal {
  pub fn user_id(self) -> Option<UserId> {
    match self {
      Self::Anonymous => None,
      Self::User(id) => Some(id),
    }
  }

  pub fn is_authenticated(self) -> bool { matches!(self, Self::User(_)) }
}

tokio::task_local! {
  static PRINCIPAL: Principal;
}

/// Run `fut` with `principal` as the current caller.
pub async fn scope<F: Future>(principal: Principal, fut: F) -> F::Output {
  PRINCIPAL.scope(principal, fut).await
}

/// The caller, or [`Principal::Anonymous`] outside any scope.
pub fn current_or_anonymous() -> Principal {
  PRINCIPAL.try_with(|p| *p).unwrap_or(Principal::Anonymous)
}

/// The authenticated caller. Fails with [`Error::Unauthenticated`] when the
/// request is anonymous.
pub fn current() -> Result<UserId, Error> {
  current_or_anonymous().user_id().ok_or(Error::Unauthenticated)
}
