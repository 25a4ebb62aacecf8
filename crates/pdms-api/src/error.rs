//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use pdms_core::{Classify, ErrorClass};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a store error onto a response class via [`Classify`].
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Classify + Send + Sync + 'static,
  {
    match e.class() {
      ErrorClass::Invalid => ApiError::BadRequest(e.to_string()),
      ErrorClass::Conflict => ApiError::Conflict(e.to_string()),
      ErrorClass::Storage => ApiError::Store(Box::new(e)),
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<PathRejection> for ApiError {
  fn from(e: PathRejection) -> Self { ApiError::BadRequest(e.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(e: QueryRejection) -> Self { ApiError::BadRequest(e.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match &self {
      ApiError::NotFound(m)
      | ApiError::BadRequest(m)
      | ApiError::Unauthorized(m)
      | ApiError::Forbidden(m)
      | ApiError::Conflict(m) => m.clone(),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        e.to_string()
      }
    };
    (status, Json(json!({ "success": false, "message": message }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn store_errors_map_by_class() {
    let invalid = pdms_core::Error::Validation("schemeYear is required".into());
    assert_eq!(ApiError::store(invalid).status(), StatusCode::BAD_REQUEST);

    let conflict = pdms_core::Error::DuplicateVersion {
      program_code: "BTECH-CSE".into(),
      scheme_year:  "2024".into(),
      pd_version:   "1.0.1".into(),
    };
    let err = ApiError::store(conflict);
    assert_eq!(err.status(), StatusCode::CONFLICT);
    assert!(err.to_string().contains("1.0.1"));
  }
}
