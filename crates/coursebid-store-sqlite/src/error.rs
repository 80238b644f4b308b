//! Error type for `coursebid-store-sqlite`.

use coursebid_core::store::{PublicationConflict, StoreError};
use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] coursebid_core::Error),

  #[error("database error: {0}")]
  Database(tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A uniqueness constraint rejected the write.
  #[error("{table}.{column} has already been taken")]
  Duplicate { table: String, column: String },

  /// A publication guard rejected the write.
  #[error("published {0}")]
  Publication(PublicationConflict),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

const UNIQUE_PREFIX: &str = "UNIQUE constraint failed: ";

impl From<tokio_rusqlite::Error> for Error {
  fn from(err: tokio_rusqlite::Error) -> Self {
    match unique_violation(&err) {
      Some((table, column)) => Error::Duplicate { table, column },
      None => Error::Database(err),
    }
  }
}

/// `(table, column)` of a failed UNIQUE constraint. Composite keys such as
/// `(quarter_id, number)` report their last column.
fn unique_violation(err: &tokio_rusqlite::Error) -> Option<(String, String)> {
  let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, Some(msg))) = err
  else {
    return None;
  };
  if e.code != ErrorCode::ConstraintViolation {
    return None;
  }
  let last = msg.strip_prefix(UNIQUE_PREFIX)?.rsplit(", ").next()?;
  let (table, column) = last.split_once('.')?;
  Some((table.to_owned(), column.to_owned()))
}

impl StoreError for Error {
  fn duplicate_field(&self) -> Option<&str> {
    match self {
      Error::Duplicate { column, .. } => Some(column),
      _ => None,
    }
  }

  fn publication_conflict(&self) -> Option<PublicationConflict> {
    match self {
      Error::Publication(conflict) => Some(*conflict),
      _ => None,
    }
  }
}
