//! Error type for authentication and token handling.

use pdms_api::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("password hashing failed: {0}")]
  Hash(String),

  #[error("token expired")]
  TokenExpired,

  #[error("invalid token")]
  InvalidToken,

  #[error("token encoding failed: {0}")]
  Encode(#[source] jsonwebtoken::errors::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for ApiError {
  fn from(e: Error) -> Self {
    match e {
      Error::TokenExpired => ApiError::Unauthorized("Session expired. Login Again".into()),
      Error::InvalidToken => ApiError::Unauthorized("Not Authorized. Login Again".into()),
      Error::Hash(_) | Error::Encode(_) => ApiError::Store(Box::new(e)),
    }
  }
}
