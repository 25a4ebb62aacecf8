//! Error types for `pdms-core`.

use thiserror::Error;

use crate::section::SectionKind;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid document: {0}")]
  Validation(String),

  #[error(
    "version {pd_version} of {program_code} (scheme {scheme_year}) already exists"
  )]
  DuplicateVersion {
    program_code: String,
    scheme_year:  String,
    pd_version:   String,
  },

  #[error("{kind} section version {version} of {program_id} already exists")]
  DuplicateSection {
    kind:       SectionKind,
    program_id: String,
    version:    String,
  },

  #[error("an account with email {0} already exists")]
  DuplicateEmail(String),

  #[error("unknown section: {0:?}")]
  UnknownSection(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse category of a failure, used by outer layers to pick a response
/// without knowing which backend produced the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
  /// The caller sent something unusable; resubmitting unchanged won't help.
  Invalid,
  /// A uniqueness constraint rejected the write (lost race or stale input).
  Conflict,
  /// Anything else: I/O, corruption, driver failures.
  Storage,
}

/// Implemented by every error a store backend can return.
pub trait Classify {
  fn class(&self) -> ErrorClass;
}

impl Classify for Error {
  fn class(&self) -> ErrorClass {
    match self {
      Self::Validation(_) | Self::UnknownSection(_) => ErrorClass::Invalid,
      Self::DuplicateVersion { .. }
      | Self::DuplicateSection { .. }
      | Self::DuplicateEmail(_) => ErrorClass::Conflict,
      Self::Serialization(_) => ErrorClass::Storage,
    }
  }
}
