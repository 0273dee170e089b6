//! [`StorageLayout`] maps stored references onto the filesystem.

use std::{
  io,
  path::{Path, PathBuf},
};

use bytes::Bytes;
use dossier_core::path::{EMPTY_FOLDER_MARKER, PROFILE_IMAGES_DIR, RelativePath, StoredPath};
use tokio::fs;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Root ────────────────────────────────────────────────────────────────────

/// Base directory under which everything is stored.
///
/// Owned by process bootstrap and handed to [`StorageLayout::init`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRoot(PathBuf);

impl StorageRoot {
  pub fn new(path: impl Into<PathBuf>) -> Self { Self(path.into()) }

  pub fn path(&self) -> &Path { &self.0 }
}

// ─── Placement ───────────────────────────────────────────────────────────────

/// The outcome of [`StorageLayout::place_all`] that has not been settled yet.
#[derive(Debug, Default)]
#[must_use = "a placement must be committed or rolled back"]
pub struct Placement {
  created:   Vec<StoredPath>,
  displaced: Vec<Displaced>,
}

impl Placement {
  /// References that did not exist before this placement.
  pub fn created(&self) -> &[StoredPath] { &self.created }

  /// How many existing files this placement replaced.
  pub fn replaced(&self) -> usize { self.displaced.len() }
}

/// Previous content of a replaced file, parked next to it.
#[derive(Debug)]
struct Displaced {
  target: PathBuf,
  backup: PathBuf,
}

impl Displaced {
  async fn discard(self) {
    if let Err(e) = fs::remove_file(&self.backup).await {
      tracing::warn!(path = %self.backup.display(), error = %e, "failed to drop replaced file");
    }
  }
}

// ─── Layout ──────────────────────────────────────────────────────────────────

/// Deterministic placement of subject documents and profile images.
///
/// Cloning is cheap; the layout holds only the root path.
#[derive(Debug, Clone)]
pub struct StorageLayout {
  root: StorageRoot,
}

impl StorageLayout {
  /// Provision the root and the shared profile-image directory.
  ///
  /// Idempotent.
  pub async fn init(root: StorageRoot) -> Result<Self> {
    let layout = Self { root };
    layout.ensure_dir(&layout.profile_images_dir()).await?;
    Ok(layout)
  }

  pub fn root(&self) -> &Path { self.root.path() }

  pub fn profile_images_dir(&self) -> PathBuf { self.root().join(PROFILE_IMAGES_DIR) }

  pub fn subject_dir(&self, subject_id: Uuid) -> PathBuf {
    self.root().join(subject_id.hyphenated().to_string())
  }

  /// Absolute location of a stored reference.
  pub fn resolve(&self, stored: &StoredPath) -> PathBuf {
    self.root().join(stored.as_relative().to_path_buf())
  }

  /// A fresh, unique profile image reference.
  pub fn new_profile_image_path(extension: Option<&str>) -> Result<StoredPath> {
    let stem = Uuid::new_v4().simple().to_string();
    let name = match extension {
      Some(ext) => format!("{stem}.{ext}"),
      None => stem,
    };
    Ok(StoredPath::for_profile_image(&name)?)
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// Create `path` and any missing ancestors. Succeeds if it already exists.
  pub async fn ensure_dir(&self, path: &Path) -> Result<()> {
    fs::create_dir_all(path).await.map_err(|source| Error::Write {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Write `bytes` to `dest`, creating parent directories as needed.
  ///
  /// The bytes land in a sibling temporary file first and are renamed into
  /// place, so a failed write never leaves a truncated file at `dest`.
  pub async fn place(&self, dest: &StoredPath, bytes: &[u8]) -> Result<()> {
    if let Some(displaced) = self.swap_in(dest, bytes).await? {
      displaced.discard().await;
    }
    Ok(())
  }

  /// Place every file or none of them.
  ///
  /// Files that already existed are set aside rather than overwritten. If any
  /// write fails, the files placed so far are removed and the set-aside ones
  /// restored before the error is returned. On success the caller settles the
  /// returned [`Placement`] with [`commit`](Self::commit) or
  /// [`roll_back`](Self::roll_back).
  pub async fn place_all(&self, files: &[(StoredPath, Bytes)]) -> Result<Placement> {
    let mut placement = Placement::default();

    for (dest, bytes) in files {
      match self.swap_in(dest, bytes).await {
        Ok(Some(displaced)) => placement.displaced.push(displaced),
        Ok(None) => placement.created.push(dest.clone()),
        Err(e) => {
          tracing::warn!(path = %dest, error = %e, "placement failed; rolling back");
          self.roll_back(placement).await;
          return Err(e);
        }
      }
    }
    Ok(placement)
  }

  /// Create `<subject>/<folder>/` holding a zero-byte marker so an
  /// intentionally empty submission is distinguishable from none at all.
  pub async fn mark_empty_folder(
    &self,
    subject_id: Uuid,
    folder: &RelativePath,
  ) -> Result<Placement> {
    let marker = empty_marker(subject_id, folder)?;
    self.place_all(&[(marker, Bytes::new())]).await
  }

  /// Keep a placement: drop the content it displaced.
  pub async fn commit(&self, placement: Placement) {
    for displaced in placement.displaced {
      displaced.discard().await;
    }
  }

  /// Undo a placement: remove the files it created and put displaced content
  /// back. Failures are logged; the remaining steps still run.
  pub async fn roll_back(&self, placement: Placement) {
    for path in &placement.created {
      if let Err(e) = self.remove_file(path).await {
        tracing::error!(path = %path, error = %e, "rollback failed to remove file");
      }
    }
    for displaced in placement.displaced.into_iter().rev() {
      if let Err(e) = fs::rename(&displaced.backup, &displaced.target).await {
        tracing::error!(
          path = %displaced.target.display(),
          error = %e,
          "rollback failed to restore file"
        );
      }
    }
  }

  /// Stage `bytes` next to `dest` and rename it into place, moving any file
  /// already there aside first.
  async fn swap_in(&self, dest: &StoredPath, bytes: &[u8]) -> Result<Option<Displaced>> {
    let target = self.resolve(dest);
    if let Some(parent) = target.parent() {
      self.ensure_dir(parent).await?;
    }
    let write_err = |source| Error::Write { path: target.clone(), source };

    let staging = sibling(&target, "partial");
    if let Err(e) = fs::write(&staging, bytes).await {
      let _ = fs::remove_file(&staging).await;
      return Err(write_err(e));
    }

    let displaced = match fs::symlink_metadata(&target).await {
      Ok(meta) if meta.is_dir() => {
        let _ = fs::remove_file(&staging).await;
        return Err(write_err(io::Error::new(
          io::ErrorKind::IsADirectory,
          "a directory occupies the destination",
        )));
      }
      Ok(_) => {
        let backup = sibling(&target, "bak");
        if let Err(e) = fs::rename(&target, &backup).await {
          let _ = fs::remove_file(&staging).await;
          return Err(write_err(e));
        }
        Some(Displaced { target: target.clone(), backup })
      }
      Err(e) if e.kind() == io::ErrorKind::NotFound => None,
      Err(e) => {
        let _ = fs::remove_file(&staging).await;
        return Err(write_err(e));
      }
    };

    if let Err(e) = fs::rename(&staging, &target).await {
      let _ = fs::remove_file(&staging).await;
      if let Some(d) = &displaced {
        let _ = fs::rename(&d.backup, &d.target).await;
      }
      return Err(write_err(e));
    }

    tracing::debug!(path = %dest, bytes = bytes.len(), replaced = displaced.is_some(), "placed file");
    Ok(displaced)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub async fn exists(&self, stored: &StoredPath) -> Result<bool> {
    let path = self.resolve(stored);
    fs::try_exists(&path)
      .await
      .map_err(|source| Error::Read { path, source })
  }

  /// Names of the entries directly inside `<subject>/<folder>` (or the
  /// subject directory itself), sorted. A missing directory has no children.
  pub async fn list_children(
    &self,
    subject_id: Uuid,
    folder: Option<&RelativePath>,
  ) -> Result<Vec<String>> {
    let mut dir = self.subject_dir(subject_id);
    if let Some(folder) = folder {
      dir.push(folder.to_path_buf());
    }

    let mut entries = match fs::read_dir(&dir).await {
      Ok(entries) => entries,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(source) => return Err(Error::Read { path: dir, source }),
    };

    let mut names = Vec::new();
    loop {
      match entries.next_entry().await {
        Ok(Some(entry)) => names.push(entry.file_name().to_string_lossy().into_owned()),
        Ok(None) => break,
        Err(source) => return Err(Error::Read { path: dir, source }),
      }
    }
    names.sort();
    Ok(names)
  }

  // ── Deletes ───────────────────────────────────────────────────────────────

  /// Delete a single stored file. Returns `false` if it was already absent.
  pub async fn remove_file(&self, stored: &StoredPath) -> Result<bool> {
    let path = self.resolve(stored);
    match fs::remove_file(&path).await {
      Ok(()) => Ok(true),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
      Err(source) => Err(Error::Delete { path, source }),
    }
  }

  /// Drop the empty-folder marker from `<subject>/<folder>` once real files
  /// live there. Returns `false` if there was none.
  pub async fn remove_empty_marker(&self, subject_id: Uuid, folder: &RelativePath) -> Result<bool> {
    self.remove_file(&empty_marker(subject_id, folder)?).await
  }

  /// Delete `<subject>/<folder>` and everything below it. Returns `false` if
  /// it was already absent.
  pub async fn remove_tree(&self, subject_id: Uuid, folder: &RelativePath) -> Result<bool> {
    let path = self.subject_dir(subject_id).join(folder.to_path_buf());
    match fs::remove_dir_all(&path).await {
      Ok(()) => Ok(true),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
      Err(source) => Err(Error::Delete { path, source }),
    }
  }
}

fn empty_marker(subject_id: Uuid, folder: &RelativePath) -> Result<StoredPath> {
  let name = RelativePath::parse(EMPTY_FOLDER_MARKER)?;
  Ok(StoredPath::for_subject(subject_id, &folder.join(&name)))
}

/// A hidden, uniquely named neighbour of `target`.
fn sibling(target: &Path, suffix: &str) -> PathBuf {
  let name = target
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_default();
  target.with_file_name(format!(".{name}.{}.{suffix}", Uuid::new_v4().simple()))
}
