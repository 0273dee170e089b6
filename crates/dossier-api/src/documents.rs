//! Handlers for `/upload` and `/delete-document`, and the placement and
//! cleanup sequencing behind them.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/upload` | multipart; returns `{success, filePaths}` |
//! | `POST` | `/delete-document` | Body: `{"documentType":"..."}` |
//!
//! Uploads write storage first, then the ledger, then remove whatever the new
//! ledger entry superseded. Deletions remove storage first and only then
//! retract the ledger entry; a failed delete leaves the ledger untouched.

use axum::{
  Json,
  extract::{
    Multipart, State,
    multipart::MultipartRejection,
    rejection::JsonRejection,
  },
};
use bytes::Bytes;
use chrono::Utc;
use dossier_core::{
  document::{self, DocumentRequirements, Slot},
  intake::{self, DocumentUpload, ProfileImage, ValidatedFile, ValidatedSubmission},
  path::{RelativePath, StoredPath},
  store::LedgerStore,
};
use dossier_storage::StorageLayout;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, auth::AuthSubject, error::ApiError, form};

// ─── Upload ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
  pub success:    bool,
  /// Public URLs of the files recorded by this submission.
  pub file_paths: Vec<String>,
}

/// `POST /upload`
pub async fn upload<S>(
  State(state): State<AppState<S>>,
  auth: AuthSubject,
  multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  let submission = form::read_submission(multipart?, &state.config.limits).await?;
  let validated  = intake::validate(submission, &state.config.limits)?;

  let _guard = state.locks.lock(auth.subject_id).await;
  let recorded = match validated {
    ValidatedSubmission::ProfileImage(image) => {
      vec![store_profile_image(&state, auth.subject_id, image).await?]
    }
    ValidatedSubmission::Document(upload) => {
      store_document(&state, auth.subject_id, upload).await?
    }
  };

  Ok(Json(UploadResponse {
    success:    true,
    file_paths: recorded.iter().map(|p| state.config.url(p)).collect(),
  }))
}

/// Place a new profile image, point the subject at it, then drop the old one.
pub async fn store_profile_image<S>(
  state: &AppState<S>,
  subject_id: Uuid,
  image: ProfileImage,
) -> Result<StoredPath, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  let dest      = StorageLayout::new_profile_image_path(image.extension.as_deref())?;
  let placement = state.layout.place_all(&[(dest.clone(), image.bytes)]).await?;

  let previous = match state.store.set_profile_image(subject_id, dest.clone()).await {
    Ok(previous) => previous,
    Err(e) => {
      state.layout.roll_back(placement).await;
      return Err(ApiError::store(e));
    }
  };
  state.layout.commit(placement).await;

  tracing::info!(subject = %subject_id, path = %dest, "profile image stored");
  if let Some(old) = previous.filter(|old| *old != dest) {
    remove_stale(&state.layout, &old).await;
  }
  Ok(dest)
}

/// Place a document submission and record it in its slot.
///
/// Returns the references now recorded for this submission, in submission
/// order. An intentional empty folder records none.
pub async fn store_document<S>(
  state: &AppState<S>,
  subject_id: Uuid,
  upload: DocumentUpload,
) -> Result<Vec<StoredPath>, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  let previous = state
    .store
    .documents(subject_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("subject {subject_id} not found")))?;

  let stored = |f: &ValidatedFile| StoredPath::for_subject(subject_id, &f.path);
  let recorded: Vec<StoredPath> = upload.files().iter().map(stored).collect();

  let placement = match &upload {
    DocumentUpload::FolderUpload { folder_name, files } if files.is_empty() => {
      state.layout.mark_empty_folder(subject_id, folder_name).await?
    }
    _ => {
      let batch: Vec<(StoredPath, Bytes)> = upload
        .files()
        .iter()
        .map(|f| (stored(f), f.bytes.clone()))
        .collect();
      state.layout.place_all(&batch).await?
    }
  };

  if let Err(e) = record(&*state.store, subject_id, &upload, &recorded).await {
    state.layout.roll_back(placement).await;
    return Err(ApiError::store(e));
  }
  state.layout.commit(placement).await;

  let slot = upload.slot();
  tracing::info!(
    subject = %subject_id,
    slot = %slot,
    files = recorded.len(),
    empty_folder = upload.is_empty_folder(),
    "documents recorded"
  );

  remove_superseded(&state.layout, subject_id, &previous, &upload, &recorded).await;
  Ok(recorded)
}

async fn record<S: LedgerStore>(
  store: &S,
  subject_id: Uuid,
  upload: &DocumentUpload,
  recorded: &[StoredPath],
) -> Result<(), S::Error> {
  match upload {
    DocumentUpload::PoliticalDeclaration(file) => {
      store
        .record_political_declaration(subject_id, StoredPath::for_subject(subject_id, &file.path))
        .await
    }
    DocumentUpload::WitnessTestimonies(_) => {
      store.append_witness_testimonies(subject_id, recorded.to_vec()).await
    }
    DocumentUpload::IdDocument { kind, file } => {
      store
        .record_id_document(subject_id, *kind, StoredPath::for_subject(subject_id, &file.path))
        .await
    }
    DocumentUpload::FolderUpload { folder_name, files } => {
      let folder = document::FolderUpload {
        folder_name:     folder_name.clone(),
        files:           recorded.to_vec(),
        uploaded_at:     Utc::now(),
        is_empty_folder: files.is_empty(),
      };
      store.record_folder_upload(subject_id, folder).await
    }
  }
}

/// Best-effort removal of files the ledger no longer references after
/// `upload` replaced the `previous` entry of its slot.
///
/// Files another slot still points at are never removed.
async fn remove_superseded(
  layout: &StorageLayout,
  subject_id: Uuid,
  previous: &DocumentRequirements,
  upload: &DocumentUpload,
  recorded: &[StoredPath],
) {
  let slot = upload.slot();
  if slot == Slot::WitnessTestimonies {
    return;
  }

  if let DocumentUpload::FolderUpload { folder_name, files } = upload {
    if !files.is_empty() {
      remove_marker(layout, subject_id, folder_name).await;
    }

    if let Some(old) = &previous.folder_upload {
      if old.is_empty_folder && old.folder_name != *folder_name {
        remove_marker(layout, subject_id, &old.folder_name).await;
      }

      let disjoint = !old.folder_name.starts_with(folder_name)
        && !folder_name.starts_with(&old.folder_name);
      if disjoint && !previous.is_folder_referenced_elsewhere(slot, subject_id, &old.folder_name) {
        match layout.remove_tree(subject_id, &old.folder_name).await {
          Ok(_) => {
            tracing::debug!(subject = %subject_id, folder = %old.folder_name, "removed superseded folder")
          }
          Err(e) => {
            tracing::warn!(subject = %subject_id, error = %e, "failed to remove superseded folder")
          }
        }
        return;
      }
    }
  }

  for old in previous.referenced_paths(slot) {
    if recorded.contains(old) || previous.is_referenced_elsewhere(slot, old) {
      continue;
    }
    remove_stale(layout, old).await;
  }
}

async fn remove_marker(layout: &StorageLayout, subject_id: Uuid, folder: &RelativePath) {
  if let Err(e) = layout.remove_empty_marker(subject_id, folder).await {
    tracing::warn!(subject = %subject_id, folder = %folder, error = %e, "failed to remove empty-folder marker");
  }
}

async fn remove_stale(layout: &StorageLayout, path: &StoredPath) {
  match layout.remove_file(path).await {
    Ok(true) => tracing::debug!(path = %path, "removed superseded file"),
    Ok(false) => {}
    Err(e) => tracing::warn!(path = %path, error = %e, "failed to remove superseded file"),
  }
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBody {
  pub document_type: String,
}

#[derive(Debug, Serialize)]
pub struct Ack {
  pub success: bool,
}

/// `POST /delete-document`, body: `{"documentType":"witnessTestimonies"}`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  auth: AuthSubject,
  body: Result<Json<DeleteBody>, JsonRejection>,
) -> Result<Json<Ack>, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  let Json(body) = body?;
  let slot = form::parse_slot(&body.document_type)?;

  let _guard = state.locks.lock(auth.subject_id).await;
  delete_slot(&state, auth.subject_id, slot).await?;
  Ok(Json(Ack { success: true }))
}

/// Remove a slot's files, then retract its ledger entry.
///
/// Deleting an already-empty slot succeeds.
pub async fn delete_slot<S>(
  state: &AppState<S>,
  subject_id: Uuid,
  slot: Slot,
) -> Result<(), ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  let docs = state
    .store
    .documents(subject_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("subject {subject_id} not found")))?;

  match (slot, &docs.folder_upload) {
    (Slot::FolderUpload, Some(folder)) => {
      state
        .layout
        .remove_tree(subject_id, &folder.folder_name)
        .await
        .map_err(ApiError::StorageDelete)?;
    }
    (Slot::FolderUpload, None) => {}
    _ => {
      for path in docs.referenced_paths(slot) {
        if docs.is_referenced_elsewhere(slot, path) {
          tracing::debug!(path = %path, slot = %slot, "file shared with another slot; kept");
          continue;
        }
        state
          .layout
          .remove_file(path)
          .await
          .map_err(ApiError::StorageDelete)?;
      }
    }
  }

  state
    .store
    .clear_slot(subject_id, slot)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(subject = %subject_id, slot = %slot, "slot deleted");
  Ok(())
}
