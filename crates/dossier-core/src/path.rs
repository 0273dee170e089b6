//! Path types for stored files.
//!
//! A [`RelativePath`] is a client-supplied path that has been checked to stay
//! inside whatever directory it is later joined onto. A [`StoredPath`] is the
//! opaque reference the ledger keeps: a relative path under the storage root,
//! either subject-scoped (`<subject-id>/...`) or under the shared
//! [`PROFILE_IMAGES_DIR`].

use std::{fmt, path::PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Result, ValidationError};

/// Shared directory (directly under the storage root) for profile images.
pub const PROFILE_IMAGES_DIR: &str = "profile-images";

/// Zero-byte file written into an intentionally empty folder submission.
pub const EMPTY_FOLDER_MARKER: &str = ".emptyfolder";

/// Folder name used when a folder submission does not name itself.
pub const DEFAULT_FOLDER_NAME: &str = "untitled";

// ─── RelativePath ────────────────────────────────────────────────────────────

/// A normalised, `/`-separated relative path.
///
/// Never empty, never absolute, and never contains `.` or `..` segments, so
/// joining it onto a directory cannot escape that directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelativePath(String);

impl RelativePath {
  /// Parse a client-supplied path.
  ///
  /// Backslashes are treated as separators and empty or `.` segments are
  /// dropped. Absolute paths, drive prefixes, NUL bytes and any `..` segment
  /// are rejected with [`ValidationError::InvalidPath`].
  pub fn parse(raw: &str) -> Result<Self> {
    let unified = raw.replace('\\', "/");
    if unified.starts_with('/') || unified.contains('\0') {
      return Err(ValidationError::InvalidPath);
    }

    let mut segments = Vec::new();
    for segment in unified.split('/') {
      match segment {
        "" | "." => continue,
        ".." => return Err(ValidationError::InvalidPath),
        s if segments.is_empty() && is_drive_prefix(s) => {
          return Err(ValidationError::InvalidPath);
        }
        s => segments.push(s),
      }
    }

    if segments.is_empty() {
      return Err(ValidationError::InvalidPath);
    }
    Ok(Self(segments.join("/")))
  }

  pub fn as_str(&self) -> &str { &self.0 }

  /// The final segment.
  pub fn file_name(&self) -> &str {
    self.0.rsplit('/').next().unwrap_or(&self.0)
  }

  /// `true` if `prefix` equals this path or is one of its ancestors.
  pub fn starts_with(&self, prefix: &RelativePath) -> bool {
    self.0 == prefix.0
      || self
        .0
        .strip_prefix(prefix.as_str())
        .is_some_and(|rest| rest.starts_with('/'))
  }

  /// Append `other` below this path.
  pub fn join(&self, other: &RelativePath) -> RelativePath {
    RelativePath(format!("{}/{}", self.0, other.0))
  }

  /// The platform path made of the same segments.
  pub fn to_path_buf(&self) -> PathBuf { self.0.split('/').collect() }
}

fn is_drive_prefix(segment: &str) -> bool {
  let bytes = segment.as_bytes();
  bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

impl TryFrom<String> for RelativePath {
  type Error = ValidationError;

  fn try_from(value: String) -> Result<Self> { Self::parse(&value) }
}

impl From<RelativePath> for String {
  fn from(value: RelativePath) -> Self { value.0 }
}

impl fmt::Display for RelativePath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── StoredPath ──────────────────────────────────────────────────────────────

/// Reference to a stored file, relative to the storage root.
///
/// Serialised as the bare path string, e.g.
/// `"6f1c…/witnesses/statement.pdf"` or `"profile-images/4ab2….png"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredPath(RelativePath);

impl StoredPath {
  /// Parse a stored reference read back from the ledger.
  pub fn parse(raw: &str) -> Result<Self> { RelativePath::parse(raw).map(Self) }

  /// `<subject-id>/<relative>`.
  pub fn for_subject(subject_id: Uuid, relative: &RelativePath) -> Self {
    Self(RelativePath(format!("{}/{}", subject_id.hyphenated(), relative)))
  }

  /// `profile-images/<file_name>`. `file_name` must be a single segment.
  pub fn for_profile_image(file_name: &str) -> Result<Self> {
    let name = RelativePath::parse(file_name)?;
    if name.as_str().contains('/') {
      return Err(ValidationError::InvalidPath);
    }
    Ok(Self(RelativePath(format!("{PROFILE_IMAGES_DIR}/{name}"))))
  }

  pub fn as_str(&self) -> &str { self.0.as_str() }

  pub fn as_relative(&self) -> &RelativePath { &self.0 }

  /// `true` if this reference lives inside `<subject-id>/<folder>`.
  pub fn is_within(&self, subject_id: Uuid, folder: &RelativePath) -> bool {
    self.0.starts_with(&StoredPath::for_subject(subject_id, folder).0)
  }

  /// Resolve against the public base URL the storage root is served under.
  pub fn public_url(&self, base_url: &str) -> String {
    format!("{}/uploads/{}", base_url.trim_end_matches('/'), self.0)
  }
}

impl fmt::Display for StoredPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}
