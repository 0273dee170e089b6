//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings, and
//! stored paths their `/`-separated relative form.

use chrono::{DateTime, Utc};
use dossier_core::{
  document::{DocumentRequirements, FolderUpload, IdDocumentKind},
  path::{RelativePath, StoredPath},
  subject::Subject,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── IdDocumentKind ───────────────────────────────────────────────────────────

pub fn encode_id_kind(kind: IdDocumentKind) -> String { kind.to_string() }

pub fn decode_id_kind(s: &str) -> Result<IdDocumentKind> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown id document kind: {s:?}")))
}

// ─── Paths ────────────────────────────────────────────────────────────────────

pub fn decode_stored_path(s: &str) -> Result<StoredPath> {
  StoredPath::parse(s).map_err(|_| Error::Decode(format!("invalid stored path: {s:?}")))
}

fn decode_relative_path(s: &str) -> Result<RelativePath> {
  RelativePath::parse(s).map_err(|_| Error::Decode(format!("invalid folder name: {s:?}")))
}

fn decode_opt<T>(s: Option<String>, f: impl Fn(&str) -> Result<T>) -> Result<Option<T>> {
  s.as_deref().map(f).transpose()
}

// ─── Raw row types ────────────────────────────────────────────────────────────

/// A subject row joined with its document row and both path sequences.
pub struct RawSubject {
  pub subject_id:            String,
  pub created_at:            String,
  pub full_names:            String,
  pub family_name:           String,
  pub email:                 String,
  pub profile_image:         Option<String>,
  pub political_declaration: Option<String>,
  pub id_document:           Option<String>,
  pub id_document_file:      Option<String>,
  pub folder_name:           Option<String>,
  pub folder_uploaded_at:    Option<String>,
  pub folder_is_empty:       bool,
  pub witness_testimonies:   Vec<String>,
  pub folder_files:          Vec<String>,
}

impl RawSubject {
  pub fn into_subject(self) -> Result<Subject> {
    let folder_upload = match (self.folder_name, self.folder_uploaded_at) {
      (Some(name), Some(at)) => Some(FolderUpload {
        folder_name:     decode_relative_path(&name)?,
        files:           self
          .folder_files
          .iter()
          .map(|p| decode_stored_path(p))
          .collect::<Result<_>>()?,
        uploaded_at:     decode_dt(&at)?,
        is_empty_folder: self.folder_is_empty,
      }),
      (None, _) => None,
      (Some(name), None) => {
        return Err(Error::Decode(format!("folder {name:?} has no upload time")));
      }
    };

    let documents = DocumentRequirements {
      political_declaration: decode_opt(self.political_declaration, decode_stored_path)?,
      witness_testimonies:   self
        .witness_testimonies
        .iter()
        .map(|p| decode_stored_path(p))
        .collect::<Result<_>>()?,
      id_document:           decode_opt(self.id_document, decode_id_kind)?,
      id_document_file:      decode_opt(self.id_document_file, decode_stored_path)?,
      folder_upload,
    };

    Ok(Subject {
      subject_id:    decode_uuid(&self.subject_id)?,
      created_at:    decode_dt(&self.created_at)?,
      full_names:    self.full_names,
      family_name:   self.family_name,
      email:         self.email,
      profile_image: decode_opt(self.profile_image, decode_stored_path)?,
      documents,
    })
  }
}
