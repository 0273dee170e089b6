//! Upload intake: classify and validate a submission before any write.
//!
//! Nothing here performs I/O. [`validate`] either rejects a [`Submission`]
//! outright or turns it into a [`ValidatedSubmission`] whose every path has
//! already been proven to stay inside the subject's directory.

use std::collections::HashSet;

use bytes::Bytes;

use crate::{
  Result, ValidationError,
  document::{IdDocumentKind, Slot},
  path::{DEFAULT_FOLDER_NAME, RelativePath},
};

/// 2 MiB.
pub const PROFILE_IMAGE_MAX_BYTES: u64 = 2 * 1024 * 1024;

/// 1 GiB.
pub const SUBMISSION_MAX_BYTES: u64 = 1024 * 1024 * 1024;

/// Size ceilings enforced at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
  pub profile_image_bytes: u64,
  /// Total across all files of one document submission.
  pub submission_bytes:    u64,
}

impl Default for UploadLimits {
  fn default() -> Self {
    Self {
      profile_image_bytes: PROFILE_IMAGE_MAX_BYTES,
      submission_bytes:    SUBMISSION_MAX_BYTES,
    }
  }
}

// ─── Raw submission ──────────────────────────────────────────────────────────

/// The `type` discriminator of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionType {
  ProfileImage,
  Document,
}

impl SubmissionType {
  /// `profileImage` → profile image; absent or `document` → document upload.
  pub fn parse(raw: Option<&str>) -> Result<Self> {
    match raw.map(str::trim) {
      Some("profileImage") => Ok(Self::ProfileImage),
      None | Some("") | Some("document") => Ok(Self::Document),
      Some(other) => Err(ValidationError::UnknownSubmissionType(other.to_owned())),
    }
  }
}

/// One attached file as received.
#[derive(Debug, Clone)]
pub struct IncomingFile {
  /// The relative path the client declared (browser `webkitRelativePath`).
  pub relative_path: String,
  pub content_type:  Option<String>,
  pub bytes:         Bytes,
}

impl IncomingFile {
  pub fn size(&self) -> u64 { self.bytes.len() as u64 }
}

/// An unvalidated submission envelope.
#[derive(Debug, Clone)]
pub struct Submission {
  pub submission_type:  SubmissionType,
  pub document_type:    Option<Slot>,
  pub folder_name:      Option<String>,
  /// Caller explicitly flagged a zero-file submission as intentional.
  pub empty_folder:     bool,
  pub id_document_kind: Option<IdDocumentKind>,
  pub files:            Vec<IncomingFile>,
}

// ─── Validated submission ────────────────────────────────────────────────────

/// A file whose destination has been checked.
#[derive(Debug, Clone)]
pub struct ValidatedFile {
  /// Destination relative to the subject's directory.
  pub path:         RelativePath,
  pub content_type: Option<String>,
  pub bytes:        Bytes,
}

/// A profile image ready to be stored under a generated name.
#[derive(Debug, Clone)]
pub struct ProfileImage {
  /// Lower-case extension for the generated file name, if one can be derived.
  pub extension: Option<String>,
  pub bytes:     Bytes,
}

/// A document submission, one variant per slot.
#[derive(Debug, Clone)]
pub enum DocumentUpload {
  PoliticalDeclaration(ValidatedFile),
  WitnessTestimonies(Vec<ValidatedFile>),
  IdDocument {
    kind: Option<IdDocumentKind>,
    file: ValidatedFile,
  },
  /// Every file path is rooted at `folder_name`. `files` is empty only for an
  /// intentional empty-folder submission.
  FolderUpload {
    folder_name: RelativePath,
    files:       Vec<ValidatedFile>,
  },
}

impl DocumentUpload {
  pub fn slot(&self) -> Slot {
    match self {
      Self::PoliticalDeclaration(_) => Slot::PoliticalDeclaration,
      Self::WitnessTestimonies(_) => Slot::WitnessTestimonies,
      Self::IdDocument { .. } => Slot::IdDocument,
      Self::FolderUpload { .. } => Slot::FolderUpload,
    }
  }

  pub fn files(&self) -> &[ValidatedFile] {
    match self {
      Self::PoliticalDeclaration(file) | Self::IdDocument { file, .. } => {
        std::slice::from_ref(file)
      }
      Self::WitnessTestimonies(files) | Self::FolderUpload { files, .. } => files,
    }
  }

  pub fn is_empty_folder(&self) -> bool {
    matches!(self, Self::FolderUpload { files, .. } if files.is_empty())
  }
}

#[derive(Debug, Clone)]
pub enum ValidatedSubmission {
  ProfileImage(ProfileImage),
  Document(DocumentUpload),
}

// ─── Validation ──────────────────────────────────────────────────────────────

/// Classify and validate `submission` against `limits`.
///
/// The whole submission is rejected if any single file is invalid.
pub fn validate(
  submission: Submission,
  limits: &UploadLimits,
) -> Result<ValidatedSubmission> {
  match submission.submission_type {
    SubmissionType::ProfileImage => {
      validate_profile_image(submission.files, limits).map(ValidatedSubmission::ProfileImage)
    }
    SubmissionType::Document => validate_document(submission, limits).map(ValidatedSubmission::Document),
  }
}

fn validate_profile_image(
  mut files: Vec<IncomingFile>,
  limits: &UploadLimits,
) -> Result<ProfileImage> {
  if files.len() != 1 {
    return Err(ValidationError::InvalidProfileImage);
  }
  let file = files.remove(0);

  let content_type = file
    .content_type
    .as_deref()
    .map(str::to_ascii_lowercase)
    .filter(|ct| ct.starts_with("image/"))
    .ok_or(ValidationError::InvalidProfileImage)?;

  if file.size() > limits.profile_image_bytes {
    return Err(ValidationError::InvalidProfileImage);
  }

  let extension = extension_from_name(&file.relative_path)
    .or_else(|| extension_from_content_type(&content_type));

  Ok(ProfileImage { extension, bytes: file.bytes })
}

fn validate_document(
  submission: Submission,
  limits: &UploadLimits,
) -> Result<DocumentUpload> {
  let total: u64 = submission.files.iter().map(IncomingFile::size).sum();
  if total > limits.submission_bytes {
    return Err(ValidationError::TooLarge {
      size:  total,
      limit: limits.submission_bytes,
    });
  }

  if submission.files.is_empty() {
    if !submission.empty_folder {
      return Err(ValidationError::NoFilesUploaded);
    }
    return Ok(DocumentUpload::FolderUpload {
      folder_name: folder_name(submission.folder_name.as_deref())?,
      files:       Vec::new(),
    });
  }

  let slot = submission
    .document_type
    .ok_or(ValidationError::MissingDocumentType)?;

  let mut files = submission
    .files
    .into_iter()
    .map(|f| {
      Ok(ValidatedFile {
        path:         RelativePath::parse(&f.relative_path)?,
        content_type: f.content_type,
        bytes:        f.bytes,
      })
    })
    .collect::<Result<Vec<_>>>()?;

  match slot {
    Slot::PoliticalDeclaration => Ok(DocumentUpload::PoliticalDeclaration(single(slot, files)?)),
    Slot::IdDocument => Ok(DocumentUpload::IdDocument {
      kind: submission.id_document_kind,
      file: single(slot, files)?,
    }),
    Slot::WitnessTestimonies => {
      reject_duplicates(&files)?;
      Ok(DocumentUpload::WitnessTestimonies(files))
    }
    Slot::FolderUpload => {
      let folder_name = folder_name(submission.folder_name.as_deref())?;
      for file in &mut files {
        if !file.path.starts_with(&folder_name) || file.path == folder_name {
          file.path = folder_name.join(&file.path);
        }
      }
      reject_duplicates(&files)?;
      Ok(DocumentUpload::FolderUpload { folder_name, files })
    }
  }
}

fn single(slot: Slot, mut files: Vec<ValidatedFile>) -> Result<ValidatedFile> {
  if files.len() != 1 {
    return Err(ValidationError::ExpectedSingleFile(slot));
  }
  Ok(files.remove(0))
}

fn reject_duplicates(files: &[ValidatedFile]) -> Result<()> {
  let mut seen = HashSet::with_capacity(files.len());
  for file in files {
    if !seen.insert(&file.path) {
      return Err(ValidationError::DuplicatePath(file.path.to_string()));
    }
  }
  Ok(())
}

fn folder_name(raw: Option<&str>) -> Result<RelativePath> {
  match raw.map(str::trim).filter(|s| !s.is_empty()) {
    Some(name) => RelativePath::parse(name),
    None => RelativePath::parse(DEFAULT_FOLDER_NAME),
  }
}

fn extension_from_name(name: &str) -> Option<String> {
  let file_name = name.rsplit(['/', '\\']).next()?;
  let (stem, ext) = file_name.rsplit_once('.')?;
  let valid = !stem.is_empty()
    && (1..=8).contains(&ext.len())
    && ext.chars().all(|c| c.is_ascii_alphanumeric());
  valid.then(|| ext.to_ascii_lowercase())
}

fn extension_from_content_type(content_type: &str) -> Option<String> {
  let subtype = content_type.strip_prefix("image/")?;
  let ext = match subtype.split(';').next()?.trim() {
    "jpeg" | "pjpeg" => "jpg",
    "png" => "png",
    "gif" => "gif",
    "webp" => "webp",
    "svg+xml" => "svg",
    "bmp" => "bmp",
    "avif" => "avif",
    _ => return None,
  };
  Some(ext.to_owned())
}
