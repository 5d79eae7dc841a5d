//! Error type for `midst-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] midst_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored column held a value the domain types cannot represent.
  #[error("malformed {column} column: {value:?}")]
  Malformed { column: &'static str, value: String },
}

impl From<Error> for midst_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(core) => core,
      other => midst_core::Error::store(other),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
