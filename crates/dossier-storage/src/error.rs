//! Error type for `dossier-storage`.

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to write {}: {source}", path.display())]
  Write {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to delete {}: {source}", path.display())]
  Delete {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to read {}: {source}", path.display())]
  Read {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("invalid storage path: {0}")]
  InvalidPath(#[from] dossier_core::ValidationError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
