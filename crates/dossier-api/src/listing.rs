//! Handler for `GET /public-view`.
//!
//! Lists only subjects that pass the completion gate, and only their
//! non-sensitive fields: names, profile image URL, and presence flags.

use axum::{Json, extract::State};
use dossier_core::{document::DocumentPresence, store::LedgerStore};
use serde::Serialize;

use crate::{AppState, auth::AuthSubject, error::ApiError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSubject {
  pub full_names:    String,
  pub family_name:   String,
  pub profile_image: Option<String>,
  pub documents:     DocumentPresence,
}

#[derive(Debug, Serialize)]
pub struct PublicView {
  pub success: bool,
  pub users:   Vec<PublicSubject>,
}

/// `GET /public-view`
pub async fn public_view<S>(
  State(state): State<AppState<S>>,
  _auth: AuthSubject,
) -> Result<Json<PublicView>, ApiError>
where
  S: LedgerStore + Clone + 'static,
{
  let users = state
    .store
    .list_subjects()
    .await
    .map_err(ApiError::store)?
    .into_iter()
    .filter(|s| s.documents.is_complete())
    .map(|s| PublicSubject {
      profile_image: s.profile_image.as_ref().map(|p| state.config.url(p)),
      documents:     s.documents.presence(),
      full_names:    s.full_names,
      family_name:   s.family_name,
    })
    .collect();

  Ok(Json(PublicView { success: true, users }))
}
