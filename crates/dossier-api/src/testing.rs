//! Shared fixtures for the crate's tests.

use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use dossier_core::{
  document::{DocumentRequirements, FolderUpload, IdDocumentKind, Slot},
  intake::UploadLimits,
  path::StoredPath,
  store::LedgerStore,
  subject::{Credentials, NewSubject, Subject, SubjectUpdate},
};
use dossier_storage::{StorageLayout, StorageRoot};
use dossier_store_sqlite::{Error as StoreError, SqliteStore};
use tempfile::TempDir;
use uuid::Uuid;

use crate::{ApiConfig, AppState, locks::SubjectLocks};

pub const BASE_URL: &str = "http://files.test";

pub async fn test_state() -> (TempDir, AppState<SqliteStore>) {
  test_state_with(UploadLimits::default()).await
}

/// State over an in-memory store and a fresh temporary storage root. Keep the
/// returned `TempDir` alive for as long as the state is used.
pub async fn test_state_with(limits: UploadLimits) -> (TempDir, AppState<SqliteStore>) {
  let store = SqliteStore::open_in_memory().await.unwrap();
  state_over(store, limits).await
}

/// Like [`test_state`], over a store whose ledger writes can be switched off.
pub async fn refusing_state() -> (TempDir, AppState<RefusingStore>) {
  let store = RefusingStore {
    inner:  SqliteStore::open_in_memory().await.unwrap(),
    refuse: Arc::new(AtomicBool::new(false)),
  };
  state_over(store, UploadLimits::default()).await
}

async fn state_over<S: LedgerStore>(store: S, limits: UploadLimits) -> (TempDir, AppState<S>) {
  let dir    = TempDir::new().unwrap();
  let layout = StorageLayout::init(StorageRoot::new(dir.path())).await.unwrap();

  let state = AppState {
    store:  Arc::new(store),
    layout: Arc::new(layout),
    config: Arc::new(ApiConfig { base_url: BASE_URL.to_owned(), limits }),
    locks:  SubjectLocks::new(),
  };
  (dir, state)
}

pub fn basic(email: &str, password: &str) -> String {
  format!("Basic {}", B64.encode(format!("{email}:{password}")))
}

/// Hand-assembled `multipart/form-data` body.
pub struct MultipartBody {
  bytes: Vec<u8>,
}

impl MultipartBody {
  const BOUNDARY: &'static str = "dossier-test-boundary-7MA4YWxkTrZu0gW";

  pub fn new() -> Self { Self { bytes: Vec::new() } }

  pub fn field(mut self, name: &str, value: &str) -> Self {
    self.bytes.extend_from_slice(
      format!(
        "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
        Self::BOUNDARY
      )
      .as_bytes(),
    );
    self
  }

  pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
    self.bytes.extend_from_slice(
      format!(
        "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
         Content-Type: {content_type}\r\n\r\n",
        Self::BOUNDARY
      )
      .as_bytes(),
    );
    self.bytes.extend_from_slice(data);
    self.bytes.extend_from_slice(b"\r\n");
    self
  }

  /// The `Content-Type` header value and the finished body.
  pub fn finish(mut self) -> (String, Vec<u8>) {
    self.bytes.extend_from_slice(format!("--{}--\r\n", Self::BOUNDARY).as_bytes());
    (format!("multipart/form-data; boundary={}", Self::BOUNDARY), self.bytes)
  }
}

// ─── Refusing store ──────────────────────────────────────────────────────────

/// A [`SqliteStore`] whose slot and profile-image writes fail while
/// [`refuse`](Self::refuse) is on. Reads and account operations pass through.
#[derive(Clone)]
pub struct RefusingStore {
  inner:  SqliteStore,
  refuse: Arc<AtomicBool>,
}

impl RefusingStore {
  pub fn refuse(&self, on: bool) { self.refuse.store(on, Ordering::SeqCst); }

  fn check(&self, id: Uuid) -> Result<(), StoreError> {
    if self.refuse.load(Ordering::SeqCst) {
      return Err(StoreError::Decode(format!("ledger write for {id} refused")));
    }
    Ok(())
  }
}

impl LedgerStore for RefusingStore {
  type Error = StoreError;

  async fn add_subject(&self, input: NewSubject) -> Result<Subject, StoreError> {
    self.inner.add_subject(input).await
  }

  async fn get_subject(&self, id: Uuid) -> Result<Option<Subject>, StoreError> {
    self.inner.get_subject(id).await
  }

  async fn list_subjects(&self) -> Result<Vec<Subject>, StoreError> {
    self.inner.list_subjects().await
  }

  async fn find_credentials(&self, email: &str) -> Result<Option<Credentials>, StoreError> {
    self.inner.find_credentials(email).await
  }

  async fn update_subject(&self, id: Uuid, update: SubjectUpdate) -> Result<Subject, StoreError> {
    self.inner.update_subject(id, update).await
  }

  async fn set_password_hash(&self, id: Uuid, hash: String) -> Result<(), StoreError> {
    self.inner.set_password_hash(id, hash).await
  }

  async fn set_profile_image(
    &self,
    id: Uuid,
    path: StoredPath,
  ) -> Result<Option<StoredPath>, StoreError> {
    self.check(id)?;
    self.inner.set_profile_image(id, path).await
  }

  async fn record_political_declaration(&self, id: Uuid, path: StoredPath) -> Result<(), StoreError> {
    self.check(id)?;
    self.inner.record_political_declaration(id, path).await
  }

  async fn append_witness_testimonies(
    &self,
    id: Uuid,
    paths: Vec<StoredPath>,
  ) -> Result<(), StoreError> {
    self.check(id)?;
    self.inner.append_witness_testimonies(id, paths).await
  }

  async fn record_id_document(
    &self,
    id: Uuid,
    kind: Option<IdDocumentKind>,
    path: StoredPath,
  ) -> Result<(), StoreError> {
    self.check(id)?;
    self.inner.record_id_document(id, kind, path).await
  }

  async fn record_folder_upload(&self, id: Uuid, upload: FolderUpload) -> Result<(), StoreError> {
    self.check(id)?;
    self.inner.record_folder_upload(id, upload).await
  }

  async fn clear_slot(&self, id: Uuid, slot: Slot) -> Result<(), StoreError> {
    self.check(id)?;
    self.inner.clear_slot(id, slot).await
  }

  async fn documents(&self, id: Uuid) -> Result<Option<DocumentRequirements>, StoreError> {
    self.inner.documents(id).await
  }

  async fn is_complete(&self, id: Uuid) -> Result<bool, StoreError> {
    self.inner.is_complete(id).await
  }
}
