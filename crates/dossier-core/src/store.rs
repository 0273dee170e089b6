//! The `LedgerStore` trait.
//!
//! Implemented by persistence backends (e.g. `dossier-store-sqlite`). The API
//! layer depends on this abstraction, not on any concrete backend.
//!
//! Slot mutations are last-write-wins at slot granularity. The store knows
//! nothing about the files behind a [`StoredPath`]; keeping the ledger and the
//! storage layout in step is the caller's job.

use std::future::Future;

use uuid::Uuid;

use crate::{
  document::{DocumentRequirements, FolderUpload, IdDocumentKind, Slot},
  path::StoredPath,
  subject::{Credentials, NewSubject, Subject, SubjectUpdate},
};

/// Backend failures callers react to differently from an outage.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// The email address already belongs to another subject.
  fn is_email_taken(&self) -> bool;
}

/// Abstraction over the persisted subject ledger.
///
/// Every mutation addressed at an unknown subject fails; it never creates one.
pub trait LedgerStore: Send + Sync {
  type Error: StoreError;

  // ── Subjects ──────────────────────────────────────────────────────────

  /// Persist a new subject together with an empty document ledger.
  ///
  /// Fails with an error whose [`StoreError::is_email_taken`] holds if the
  /// email is registered already.
  fn add_subject(
    &self,
    input: NewSubject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  /// Retrieve a subject by UUID. Returns `None` if not found.
  fn get_subject(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// All subjects, oldest first.
  fn list_subjects(
    &self,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  /// Look up login material by (already normalised) email.
  fn find_credentials<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Credentials>, Self::Error>> + Send + 'a;

  /// Apply the fields set in `update` and return the updated subject.
  ///
  /// Moving to an email another subject holds fails like
  /// [`add_subject`](Self::add_subject) does.
  fn update_subject(
    &self,
    id: Uuid,
    update: SubjectUpdate,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  /// Replace the subject's login password hash.
  fn set_password_hash(
    &self,
    id: Uuid,
    password_hash: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Point the subject's profile image at `path`, returning the previous one.
  fn set_profile_image(
    &self,
    id: Uuid,
    path: StoredPath,
  ) -> impl Future<Output = Result<Option<StoredPath>, Self::Error>> + Send + '_;

  // ── Document slots ────────────────────────────────────────────────────

  /// Overwrite the `politicalDeclaration` slot.
  fn record_political_declaration(
    &self,
    id: Uuid,
    path: StoredPath,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Append to `witnessTestimonies` in the given order. No deduplication.
  fn append_witness_testimonies(
    &self,
    id: Uuid,
    paths: Vec<StoredPath>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Overwrite `idDocumentFile` and its associated kind.
  fn record_id_document(
    &self,
    id: Uuid,
    kind: Option<IdDocumentKind>,
    path: StoredPath,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Replace the `folderUpload` composite wholesale.
  fn record_folder_upload(
    &self,
    id: Uuid,
    upload: FolderUpload,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Retract a slot: single values become `None`, sequences become empty.
  fn clear_slot(
    &self,
    id: Uuid,
    slot: Slot,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// The subject's ledger, or `None` if the subject does not exist.
  fn documents(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<DocumentRequirements>, Self::Error>> + Send + '_;

  /// Completion gate over the persisted ledger. Fails for unknown subjects.
  fn is_complete(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
