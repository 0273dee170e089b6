//! Reading a multipart upload into a [`Submission`].
//!
//! Recognised parts: `type`, `documentType`, `folderName`, `emptyFolder`,
//! `idDocumentKind`, and any number of files under `file` or `files` whose
//! filename carries the client-side relative path. Unknown parts are ignored.

use std::str::FromStr as _;

use axum::extract::{Multipart, multipart::MultipartError};
use bytes::BytesMut;
use dossier_core::{
  ValidationError,
  document::{IdDocumentKind, Slot},
  intake::{IncomingFile, Submission, SubmissionType, UploadLimits},
};

use crate::error::ApiError;

#[derive(Default)]
struct Fields {
  submission_type:  Option<String>,
  document_type:    Option<String>,
  folder_name:      Option<String>,
  empty_folder:     Option<String>,
  id_document_kind: Option<String>,
}

fn malformed(e: MultipartError) -> ApiError { ApiError::BadRequest(e.body_text()) }

/// Drain `multipart`, buffering every file part.
///
/// Stops with [`ValidationError::TooLarge`] as soon as the file parts together
/// pass `limits.submission_bytes`; the per-kind ceilings are left to intake.
pub async fn read_submission(
  mut multipart: Multipart,
  limits: &UploadLimits,
) -> Result<Submission, ApiError> {
  let mut fields = Fields::default();
  let mut files  = Vec::new();
  let mut total  = 0_u64;

  while let Some(mut field) = multipart.next_field().await.map_err(malformed)? {
    let name = field.name().unwrap_or_default().to_owned();
    match name.as_str() {
      "file" | "files" => {
        let relative_path = field.file_name().unwrap_or_default().to_owned();
        let content_type  = field.content_type().map(str::to_owned);

        let mut buf = BytesMut::new();
        while let Some(chunk) = field.chunk().await.map_err(malformed)? {
          total += chunk.len() as u64;
          if total > limits.submission_bytes {
            return Err(
              ValidationError::TooLarge { size: total, limit: limits.submission_bytes }.into(),
            );
          }
          buf.extend_from_slice(&chunk);
        }
        let bytes = buf.freeze();
        // Browsers send an unnamed, empty part when nothing was picked.
        if relative_path.is_empty() && bytes.is_empty() {
          continue;
        }
        files.push(IncomingFile { relative_path, content_type, bytes });
      }
      "type" => fields.submission_type = Some(field.text().await.map_err(malformed)?),
      "documentType" => fields.document_type = Some(field.text().await.map_err(malformed)?),
      "folderName" => fields.folder_name = Some(field.text().await.map_err(malformed)?),
      "emptyFolder" => fields.empty_folder = Some(field.text().await.map_err(malformed)?),
      "idDocumentKind" => {
        fields.id_document_kind = Some(field.text().await.map_err(malformed)?)
      }
      other => tracing::debug!(field = other, "ignoring multipart field"),
    }
  }

  Ok(Submission {
    submission_type:  SubmissionType::parse(fields.submission_type.as_deref())?,
    document_type:    non_blank(fields.document_type.as_deref())
      .map(parse_slot)
      .transpose()?,
    folder_name:      fields.folder_name,
    empty_folder:     fields
      .empty_folder
      .as_deref()
      .is_some_and(|v| v.trim().eq_ignore_ascii_case("true")),
    id_document_kind: non_blank(fields.id_document_kind.as_deref())
      .map(|raw| {
        IdDocumentKind::from_str(raw)
          .map_err(|_| ValidationError::UnknownIdDocumentKind(raw.to_owned()))
      })
      .transpose()?,
    files,
  })
}

/// Parse a `documentType` value into its slot.
pub fn parse_slot(raw: &str) -> Result<Slot, ValidationError> {
  Slot::from_str(raw.trim()).map_err(|_| ValidationError::UnknownDocumentType(raw.to_owned()))
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
  raw.map(str::trim).filter(|s| !s.is_empty())
}
