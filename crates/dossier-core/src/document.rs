//! Document requirements (the per-subject ledger of submitted files) and the
//! completion gate derived from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator as _;
use uuid::Uuid;

use crate::path::{RelativePath, StoredPath};

/// Number of slots that gate completion (`folderUpload` is informational).
pub const REQUIRED_SLOTS: u8 = 3;

// ─── Slots ───────────────────────────────────────────────────────────────────

/// One named document requirement.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Slot {
  PoliticalDeclaration,
  WitnessTestimonies,
  #[serde(alias = "idDocumentFile")]
  #[strum(to_string = "idDocument", serialize = "idDocumentFile")]
  IdDocument,
  FolderUpload,
}

/// The closed set of identification document kinds.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
pub enum IdDocumentKind {
  DriverLicense,
  Passport,
  #[serde(rename = "NationalID")]
  #[strum(serialize = "NationalID")]
  NationalId,
}

// ─── Ledger record ───────────────────────────────────────────────────────────

/// The composite `folderUpload` slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderUpload {
  pub folder_name:     RelativePath,
  /// Stored files in submission order. Empty when `is_empty_folder`.
  pub files:           Vec<StoredPath>,
  pub uploaded_at:     DateTime<Utc>,
  /// The subject deliberately submitted a folder with no files in it.
  pub is_empty_folder: bool,
}

/// Which slots are filled and with what stored references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRequirements {
  pub political_declaration: Option<StoredPath>,
  pub witness_testimonies:   Vec<StoredPath>,
  pub id_document:           Option<IdDocumentKind>,
  pub id_document_file:      Option<StoredPath>,
  pub folder_upload:         Option<FolderUpload>,
}

impl DocumentRequirements {
  /// The completion gate: all three required slots are filled.
  pub fn is_complete(&self) -> bool {
    self.political_declaration.is_some()
      && !self.witness_testimonies.is_empty()
      && self.id_document_file.is_some()
  }

  /// How many of the [`REQUIRED_SLOTS`] are filled.
  pub fn completed_slots(&self) -> u8 {
    [
      self.political_declaration.is_some(),
      !self.witness_testimonies.is_empty(),
      self.id_document_file.is_some(),
    ]
    .into_iter()
    .map(u8::from)
    .sum()
  }

  pub fn is_filled(&self, slot: Slot) -> bool {
    match slot {
      Slot::PoliticalDeclaration => self.political_declaration.is_some(),
      Slot::WitnessTestimonies => !self.witness_testimonies.is_empty(),
      Slot::IdDocument => self.id_document_file.is_some(),
      Slot::FolderUpload => self.folder_upload.is_some(),
    }
  }

  /// Every stored reference held by `slot`, in ledger order.
  pub fn referenced_paths(&self, slot: Slot) -> Vec<&StoredPath> {
    match slot {
      Slot::PoliticalDeclaration => self.political_declaration.iter().collect(),
      Slot::WitnessTestimonies => self.witness_testimonies.iter().collect(),
      Slot::IdDocument => self.id_document_file.iter().collect(),
      Slot::FolderUpload => self
        .folder_upload
        .iter()
        .flat_map(|f| f.files.iter())
        .collect(),
    }
  }

  /// Whether a slot other than `slot` also points at `path`.
  pub fn is_referenced_elsewhere(&self, slot: Slot, path: &StoredPath) -> bool {
    Slot::iter()
      .filter(|other| *other != slot)
      .any(|other| self.referenced_paths(other).contains(&path))
  }

  /// Whether a slot other than `slot` points at anything inside
  /// `<subject>/<folder>`.
  pub fn is_folder_referenced_elsewhere(
    &self,
    slot: Slot,
    subject_id: Uuid,
    folder: &RelativePath,
  ) -> bool {
    Slot::iter()
      .filter(|other| *other != slot)
      .flat_map(|other| self.referenced_paths(other))
      .any(|path| path.is_within(subject_id, folder))
  }

  pub fn presence(&self) -> DocumentPresence {
    DocumentPresence {
      political_declaration: self.political_declaration.is_some(),
      witness_testimonies:   self.witness_testimonies.len(),
      id_document:           self.id_document_file.is_some(),
      folder_upload:         self.folder_upload.is_some(),
    }
  }
}

/// Non-sensitive view of which slots are filled; safe for public listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPresence {
  pub political_declaration: bool,
  /// Number of witness testimonies on file.
  pub witness_testimonies:   usize,
  pub id_document:           bool,
  pub folder_upload:         bool,
}
