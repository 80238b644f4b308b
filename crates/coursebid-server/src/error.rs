//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Redirect, Response},
};
use coursebid_core::{
  policy::Denial,
  store::StoreError,
  validation::{self, ValidationErrors},
};
use serde_json::json;
use thiserror::Error;

use crate::views::CourseView;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("access denied")]
  Forbidden,

  /// Silently sent home.
  #[error("redirected home")]
  Redirect,

  /// Quarter parameters disagree with the course; carries the canonical path.
  #[error("stale quarter, see {0}")]
  StaleQuarter(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("validation failed: {0}")]
  Validation(ValidationErrors),

  #[error("course could not be deleted")]
  DestroyFailed(Box<CourseView>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  /// Uniqueness and publication guards become field errors; anything else is
  /// a 500.
  pub fn store<E: StoreError>(err: E) -> Self {
    if let Some(field) = err.duplicate_field() {
      return Error::Validation(ValidationErrors::single(field, validation::TAKEN));
    }
    match err.publication_conflict() {
      Some(conflict) => Error::Validation(ValidationErrors::single("published", conflict.message())),
      None => Error::Store(Box::new(err)),
    }
  }
}

impl From<Denial> for Error {
  fn from(denial: Denial) -> Self {
    match denial {
      Denial::Redirect => Error::Redirect,
      Denial::Forbidden => Error::Forbidden,
    }
  }
}

impl From<ValidationErrors> for Error {
  fn from(errors: ValidationErrors) -> Self { Error::Validation(errors) }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthorized => {
        let mut res = (
          StatusCode::UNAUTHORIZED,
          Json(json!({ "error": "Unauthorized" })),
        )
          .into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"coursebid\""),
        );
        res
      }
      Error::NotFound(msg) => {
        (StatusCode::NOT_FOUND, Json(json!({ "error": msg }))).into_response()
      }
      Error::Forbidden => (
        StatusCode::FORBIDDEN,
        Json(json!({ "error": "Access denied", "alert": "danger" })),
      )
        .into_response(),
      Error::Redirect => Redirect::to("/").into_response(),
      Error::StaleQuarter(path) => Redirect::to(&path).into_response(),
      Error::BadRequest(msg) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
      }
      Error::Validation(fields) => (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "error": "validation failed", "fields": fields })),
      )
        .into_response(),
      Error::DestroyFailed(view) => (
        StatusCode::CONFLICT,
        Json(json!({ "error": "Course could not be deleted.", "course": view })),
      )
        .into_response(),
      Error::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({ "error": e.to_string() })),
        )
          .into_response()
      }
    }
  }
}
