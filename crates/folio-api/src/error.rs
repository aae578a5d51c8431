//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error body has the shape `{"errors": {"<field>": ["<message>"]}}`.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("authentication required")]
  Unauthenticated,

  #[error("not permitted to modify this {0}")]
  Forbidden(&'static str),

  #[error("{0} not found")]
  NotFound(String),

  #[error("{0} already exists")]
  Conflict(String),

  #[error("{field} {message}")]
  Validation {
    field:   &'static str,
    message: String,
  },

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<folio_core::Error> for ApiError {
  fn from(e: folio_core::Error) -> Self {
    use folio_core::Error as E;
    match e {
      E::Unauthenticated => Self::Unauthenticated,
      E::Unauthorized(kind) => Self::Forbidden(kind),
      E::NotFound(what) => Self::NotFound(what),
      E::AlreadyExists(what) => Self::Conflict(what),
      E::Validation { field, message } => Self::Validation { field, message },
      E::Store(source) => Self::Internal(source),
    }
  }
}

fn body(field: &str, message: String) -> Json<serde_json::Value> {
  Json(json!({ "errors": { field: [message] } }))
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::Unauthenticated => {
        let mut res =
          (StatusCode::UNAUTHORIZED, body("token", self.to_string())).into_response();
        res
          .headers_mut()
          .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Token"));
        res
      }
      ApiError::Forbidden(kind) => {
        (StatusCode::FORBIDDEN, body(kind, "not permitted".into())).into_response()
      }
      ApiError::NotFound(ref what) => {
        (StatusCode::NOT_FOUND, body(what, "not found".into())).into_response()
      }
      ApiError::Conflict(ref what) => {
        (StatusCode::CONFLICT, body(what, "has already been taken".into())).into_response()
      }
      ApiError::Validation { field, message } => {
        (StatusCode::UNPROCESSABLE_ENTITY, body(field, message)).into_response()
      }
      ApiError::Internal(e) => {
        tracing::error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, body("body", "internal server error".into()))
          .into_response()
      }
    }
  }
}
