//! Error type for `dossier-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored column could not be decoded into its domain type.
  #[error("corrupt ledger value: {0}")]
  Decode(String),

  #[error("subject not found: {0}")]
  SubjectNotFound(uuid::Uuid),

  #[error("email already registered: {0}")]
  EmailTaken(String),
}

impl dossier_core::store::StoreError for Error {
  fn is_email_taken(&self) -> bool { matches!(self, Error::EmailTaken(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
