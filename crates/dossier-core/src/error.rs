//! Error types for `dossier-core`.

use thiserror::Error;

use crate::document::Slot;

/// A submission was rejected before anything touched storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("invalid profile image")]
  InvalidProfileImage,

  #[error("no files uploaded")]
  NoFilesUploaded,

  #[error("invalid path")]
  InvalidPath,

  #[error("duplicate path: {0}")]
  DuplicatePath(String),

  #[error("submission of {size} bytes exceeds the {limit} byte limit")]
  TooLarge { size: u64, limit: u64 },

  #[error("expected a single file for {0}")]
  ExpectedSingleFile(Slot),

  #[error("missing document type")]
  MissingDocumentType,

  #[error("unknown document type: {0:?}")]
  UnknownDocumentType(String),

  #[error("unknown submission type: {0:?}")]
  UnknownSubmissionType(String),

  #[error("unknown id document kind: {0:?}")]
  UnknownIdDocumentKind(String),
}

pub type Result<T, E = ValidationError> = std::result::Result<T, E>;
