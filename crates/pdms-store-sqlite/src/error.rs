//! Error type for `pdms-store-sqlite`.

use pdms_core::{Classify, ErrorClass};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] pdms_core::Error),

  #[error("database error: {0}")]
  Database(#[source] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A stored column held a value the domain types cannot represent.
  #[error("decode error: {0}")]
  Decode(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<tokio_rusqlite::Error> for Error {
  /// Unwrap errors raised inside a `Connection::call` closure via [`abort`].
  fn from(e: tokio_rusqlite::Error) -> Self {
    match e {
      tokio_rusqlite::Error::Other(inner) => match inner.downcast::<Error>() {
        Ok(own) => *own,
        Err(inner) => match inner.downcast::<pdms_core::Error>() {
          Ok(core) => Error::Core(*core),
          Err(inner) => Error::Database(tokio_rusqlite::Error::Other(inner)),
        },
      },
      other => Error::Database(other),
    }
  }
}

impl Classify for Error {
  fn class(&self) -> ErrorClass {
    match self {
      Error::Core(e) => e.class(),
      Error::Database(_) | Error::Json(_) | Error::Uuid(_) | Error::Decode(_) => {
        ErrorClass::Storage
      }
    }
  }
}

/// Raise a domain error from inside a `Connection::call` closure. The
/// closure's transaction is rolled back when it returns.
pub(crate) fn abort(e: impl Into<Error>) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e.into()))
}

/// Translate a UNIQUE constraint failure into `conflict`; pass anything else
/// through.
pub(crate) fn on_unique(
  e: rusqlite::Error,
  conflict: impl FnOnce() -> pdms_core::Error,
) -> tokio_rusqlite::Error {
  match &e {
    rusqlite::Error::SqliteFailure(f, _)
      if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
    {
      abort(conflict())
    }
    _ => e.into(),
  }
}
