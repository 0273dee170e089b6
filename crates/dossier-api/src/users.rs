//! Handlers for registration and the caller's own record.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/register` | Body: [`RegisterBody`]; returns 201 |
//! | `GET`  | `/me` | Full ledger with resolved URLs |
//! | `PUT`  | `/update` | Body: [`UpdateBody`]; blank fields are left alone |
//! | `PUT`  | `/change-password` | Body: [`ChangePasswordBody`] |
//! | `GET`  | `/certificate` | 403 until every required slot is filled |

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use dossier_core::{
  document::{DocumentPresence, DocumentRequirements, IdDocumentKind, REQUIRED_SLOTS},
  path::StoredPath,
  store::LedgerStore,
  subject::{NewSubject, Subject, SubjectUpdate},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  ApiConfig, AppState,
  auth::{AuthSubject, hash_secret, normalize_email, verify_secret},
  documents::Ack,
  error::ApiError,
};

const MIN_PASSWORD_CHARS: usize = 8;
const GFG_NUMBER_DIGITS: usize = 14;

// ─── Register ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody {
  pub full_names:  String,
  pub family_name: String,
  pub email:       String,
  pub password:    String,
  pub gfg_number:  String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
  pub success:     bool,
  pub subject_id:  Uuid,
  pub full_names:  String,
  pub family_name: String,
  pub email:       String,
}

/// `POST /register`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  body: Result<Json<RegisterBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  let Json(body) = body?;

  let full_names  = required("fullNames", &body.full_names)?;
  let family_name = required("familyName", &body.family_name)?;
  let email       = normalize_email(&body.email);
  if !looks_like_email(&email) {
    return Err(ApiError::BadRequest("a valid email is required".into()));
  }
  check_password(&body.password)?;
  let gfg_number = body.gfg_number.trim();
  if gfg_number.len() != GFG_NUMBER_DIGITS || !gfg_number.bytes().all(|b| b.is_ascii_digit()) {
    return Err(ApiError::BadRequest(format!(
      "gfgNumber must be exactly {GFG_NUMBER_DIGITS} digits"
    )));
  }

  let taken = state
    .store
    .find_credentials(&email)
    .await
    .map_err(ApiError::store)?
    .is_some();
  if taken {
    return Err(ApiError::Conflict(format!("{email} is already registered")));
  }

  let subject = state
    .store
    .add_subject(NewSubject {
      full_names,
      family_name,
      email,
      password_hash: hash_secret(&body.password)?,
      gfg_number_hash: hash_secret(gfg_number)?,
    })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(subject = %subject.subject_id, "subject registered");
  Ok((
    StatusCode::CREATED,
    Json(RegisterResponse {
      success:     true,
      subject_id:  subject.subject_id,
      full_names:  subject.full_names,
      family_name: subject.family_name,
      email:       subject.email,
    }),
  ))
}

fn required(field: &str, value: &str) -> Result<String, ApiError> {
  let value = value.trim();
  if value.is_empty() {
    return Err(ApiError::BadRequest(format!("{field} is required")));
  }
  Ok(value.to_owned())
}

fn check_password(password: &str) -> Result<(), ApiError> {
  if password.chars().count() < MIN_PASSWORD_CHARS {
    return Err(ApiError::BadRequest(format!(
      "password must be at least {MIN_PASSWORD_CHARS} characters"
    )));
  }
  Ok(())
}

fn looks_like_email(email: &str) -> bool {
  let Some((local, domain)) = email.split_once('@') else { return false };
  let Some((host, tld)) = domain.rsplit_once('.') else { return false };
  !local.is_empty()
    && !host.is_empty()
    && !tld.is_empty()
    && !domain.contains('@')
    && !email.chars().any(char::is_whitespace)
}

// ─── Own record ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderView {
  pub folder_name:     String,
  pub files:           Vec<String>,
  pub uploaded_at:     DateTime<Utc>,
  pub is_empty_folder: bool,
}

/// The ledger with every stored reference resolved to a public URL.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerView {
  pub political_declaration: Option<String>,
  pub witness_testimonies:   Vec<String>,
  pub id_document:           Option<IdDocumentKind>,
  pub id_document_file:      Option<String>,
  pub folder_upload:         Option<FolderView>,
}

impl LedgerView {
  fn resolve(docs: &DocumentRequirements, config: &ApiConfig) -> Self {
    let url = |p: &StoredPath| config.url(p);
    Self {
      political_declaration: docs.political_declaration.as_ref().map(url),
      witness_testimonies:   docs.witness_testimonies.iter().map(url).collect(),
      id_document:           docs.id_document,
      id_document_file:      docs.id_document_file.as_ref().map(url),
      folder_upload:         docs.folder_upload.as_ref().map(|f| FolderView {
        folder_name:     f.folder_name.to_string(),
        files:           f.files.iter().map(url).collect(),
        uploaded_at:     f.uploaded_at,
        is_empty_folder: f.is_empty_folder,
      }),
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
  pub success:         bool,
  pub subject_id:      Uuid,
  pub full_names:      String,
  pub family_name:     String,
  pub email:           String,
  pub profile_image:   Option<String>,
  pub created_at:      DateTime<Utc>,
  pub documents:       LedgerView,
  pub completed_slots: u8,
  pub required_slots:  u8,
  pub is_complete:     bool,
}

/// `GET /me`
pub async fn me<S>(
  State(state): State<AppState<S>>,
  auth: AuthSubject,
) -> Result<Json<MeResponse>, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  let subject = load(&state, auth.subject_id).await?;
  Ok(Json(MeResponse {
    success:         true,
    subject_id:      subject.subject_id,
    profile_image:   subject.profile_image.as_ref().map(|p| state.config.url(p)),
    created_at:      subject.created_at,
    documents:       LedgerView::resolve(&subject.documents, &state.config),
    completed_slots: subject.documents.completed_slots(),
    required_slots:  REQUIRED_SLOTS,
    is_complete:     subject.documents.is_complete(),
    full_names:      subject.full_names,
    family_name:     subject.family_name,
    email:           subject.email,
  }))
}

// ─── Profile updates ─────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateBody {
  pub full_names:  Option<String>,
  pub family_name: Option<String>,
  pub email:       Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
  pub success:       bool,
  pub subject_id:    Uuid,
  pub full_names:    String,
  pub family_name:   String,
  pub email:         String,
  pub profile_image: Option<String>,
}

/// `PUT /update`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  auth: AuthSubject,
  body: Result<Json<UpdateBody>, JsonRejection>,
) -> Result<Json<UpdateResponse>, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  let Json(body) = body?;

  let email = non_blank(body.email.as_deref()).map(normalize_email);
  if let Some(email) = &email
    && !looks_like_email(email)
  {
    return Err(ApiError::BadRequest("a valid email is required".into()));
  }

  let subject = state
    .store
    .update_subject(auth.subject_id, SubjectUpdate {
      full_names: non_blank(body.full_names.as_deref()).map(str::to_owned),
      family_name: non_blank(body.family_name.as_deref()).map(str::to_owned),
      email,
    })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(subject = %subject.subject_id, "subject updated");
  Ok(Json(UpdateResponse {
    success:       true,
    subject_id:    subject.subject_id,
    profile_image: subject.profile_image.as_ref().map(|p| state.config.url(p)),
    full_names:    subject.full_names,
    family_name:   subject.family_name,
    email:         subject.email,
  }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordBody {
  pub current_password: String,
  pub new_password:     String,
}

/// `PUT /change-password`
pub async fn change_password<S>(
  State(state): State<AppState<S>>,
  auth: AuthSubject,
  body: Result<Json<ChangePasswordBody>, JsonRejection>,
) -> Result<Json<Ack>, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  let Json(body) = body?;
  if body.current_password.is_empty() || body.new_password.is_empty() {
    return Err(ApiError::BadRequest(
      "both current and new password are required".into(),
    ));
  }
  check_password(&body.new_password)?;

  let subject = load(&state, auth.subject_id).await?;
  let creds = state
    .store
    .find_credentials(&subject.email)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("subject {} not found", auth.subject_id)))?;
  verify_secret(&body.current_password, &creds.password_hash)
    .map_err(|_| ApiError::Forbidden("current password is incorrect".into()))?;

  state
    .store
    .set_password_hash(auth.subject_id, hash_secret(&body.new_password)?)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(subject = %auth.subject_id, "password changed");
  Ok(Json(Ack { success: true }))
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
  raw.map(str::trim).filter(|s| !s.is_empty())
}

// ─── Certificate ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateResponse {
  pub success:       bool,
  pub full_names:    String,
  pub family_name:   String,
  pub profile_image: Option<String>,
  pub documents:     DocumentPresence,
  pub issued_at:     DateTime<Utc>,
}

/// `GET /certificate`
pub async fn certificate<S>(
  State(state): State<AppState<S>>,
  auth: AuthSubject,
) -> Result<Json<CertificateResponse>, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  let subject = load(&state, auth.subject_id).await?;
  if !subject.documents.is_complete() {
    return Err(ApiError::Forbidden("documents incomplete".into()));
  }

  Ok(Json(CertificateResponse {
    success:       true,
    profile_image: subject.profile_image.as_ref().map(|p| state.config.url(p)),
    documents:     subject.documents.presence(),
    issued_at:     Utc::now(),
    full_names:    subject.full_names,
    family_name:   subject.family_name,
  }))
}

async fn load<S>(state: &AppState<S>, id: Uuid) -> Result<Subject, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  state
    .store
    .get_subject(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("subject {id} not found")))
}
