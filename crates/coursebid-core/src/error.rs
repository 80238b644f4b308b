//! Error types for `coursebid-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown season: {0:?}")]
  UnknownSeason(String),

  #[error("invalid academic year: {0:?}")]
  InvalidYearSlug(String),

  #[error("unknown role: {0:?}")]
  UnknownRole(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
