//! JSON and multipart HTTP API for document submission.
//!
//! Exposes an axum [`Router`] backed by any [`LedgerStore`] and a
//! [`StorageLayout`]. Serving the stored files themselves, TLS, and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = dossier_api::router(state)
//!   .nest_service("/uploads", ServeDir::new(storage_root));
//! ```

pub mod auth;
pub mod documents;
pub mod error;
pub mod form;
pub mod listing;
pub mod locks;
pub mod users;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post, put},
};
use dossier_core::{intake::UploadLimits, path::StoredPath, store::LedgerStore};
use dossier_storage::StorageLayout;

pub use error::ApiError;
pub use locks::SubjectLocks;

/// Allowance on top of the submission ceiling for multipart framing and the
/// non-file fields.
pub const MULTIPART_ENVELOPE_BYTES: usize = 1024 * 1024;

// ─── Configuration ────────────────────────────────────────────────────────────

/// The part of the server configuration handlers need.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  /// Public origin under which `/uploads/` is served, without trailing slash.
  pub base_url: String,
  pub limits:   UploadLimits,
}

impl ApiConfig {
  /// Public URL of a stored reference.
  pub fn url(&self, stored: &StoredPath) -> String { stored.public_url(&self.base_url) }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: LedgerStore> {
  pub store:  Arc<S>,
  pub layout: Arc<StorageLayout>,
  pub config: Arc<ApiConfig>,
  pub locks:  SubjectLocks,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: LedgerStore + Clone + 'static,
{
  let upload_limit = usize::try_from(state.config.limits.submission_bytes)
    .unwrap_or(usize::MAX)
    .saturating_add(MULTIPART_ENVELOPE_BYTES);

  Router::new()
    .route("/register", post(users::register::<S>))
    .route(
      "/upload",
      post(documents::upload::<S>).layer(DefaultBodyLimit::max(upload_limit)),
    )
    .route("/delete-document", post(documents::delete::<S>))
    .route("/public-view", get(listing::public_view::<S>))
    .route("/me", get(users::me::<S>))
    .route("/update", put(users::update::<S>))
    .route("/change-password", put(users::change_password::<S>))
    .route("/certificate", get(users::certificate::<S>))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::path::Path;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use dossier_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use super::*;
  use crate::testing::{BASE_URL, MultipartBody, basic, test_state, test_state_with};

  const PASSWORD: &str = "open sesame";

  struct Client {
    state: AppState<SqliteStore>,
    auth:  String,
    id:    Uuid,
  }

  impl Client {
    async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
      let res = router(self.state.clone()).oneshot(req).await.unwrap();
      json_of(res).await
    }

    async fn upload(&self, body: MultipartBody) -> (StatusCode, Value) {
      let (content_type, bytes) = body.finish();
      let req = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::AUTHORIZATION, &self.auth)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(bytes))
        .unwrap();
      self.send(req).await
    }

    async fn delete(&self, document_type: &str) -> (StatusCode, Value) {
      let req = Request::builder()
        .method("POST")
        .uri("/delete-document")
        .header(header::AUTHORIZATION, &self.auth)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "documentType": document_type }).to_string()))
        .unwrap();
      self.send(req).await
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
      let req = Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, &self.auth)
        .body(Body::empty())
        .unwrap();
      self.send(req).await
    }

    fn subject_dir(&self, root: &Path) -> std::path::PathBuf { root.join(self.id.to_string()) }
  }

  async fn json_of(res: Response) -> (StatusCode, Value) {
    let status = res.status();
    let bytes  = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let value  = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
  }

  async fn register(state: &AppState<SqliteStore>, email: &str) -> (StatusCode, Value) {
    let body = json!({
      "fullNames":  "Ada Augusta",
      "familyName": "Lovelace",
      "email":      email,
      "password":   PASSWORD,
      "gfgNumber":  "12345678901234",
    });
    let req = Request::builder()
      .method("POST")
      .uri("/register")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap();
    json_of(router(state.clone()).oneshot(req).await.unwrap()).await
  }

  async fn client(state: &AppState<SqliteStore>, email: &str) -> Client {
    let (status, body) = register(state, email).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let id = body["subjectId"].as_str().unwrap().parse().unwrap();
    Client { state: state.clone(), auth: basic(email, PASSWORD), id }
  }

  fn pdf(slot: &str, names: &[&str]) -> MultipartBody {
    names.iter().fold(MultipartBody::new().field("documentType", slot), |body, name| {
      body.file("files", name, "application/pdf", b"%PDF-1.7")
    })
  }

  fn count_files(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else { return 0 };
    entries
      .map(|e| e.unwrap().path())
      .map(|p| if p.is_dir() { count_files(&p) } else { 1 })
      .sum()
  }

  // ── Registration ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn register_hides_secrets_and_rejects_duplicates() {
    let (_dir, state) = test_state().await;

    let (status, body) = register(&state, "Ada@Example.com").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "ada@example.com");
    assert!(body.get("password").is_none());
    assert!(body.get("gfgNumber").is_none());

    let (status, body) = register(&state, "ada@example.com").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
  }

  #[tokio::test]
  async fn register_validates_gfg_number() {
    let (_dir, state) = test_state().await;
    let req = Request::builder()
      .method("POST")
      .uri("/register")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(
        json!({
          "fullNames": "A", "familyName": "B", "email": "a@b.co",
          "password": PASSWORD, "gfgNumber": "1234",
        })
        .to_string(),
      ))
      .unwrap();
    let (status, body) = json_of(router(state).oneshot(req).await.unwrap()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");
  }

  #[tokio::test]
  async fn update_changes_profile_fields() {
    let (_dir, state) = test_state().await;
    let ada = client(&state, "ada@example.com").await;
    client(&state, "grace@example.com").await;

    let put = |auth: &str, body: Value| {
      Request::builder()
        .method("PUT")
        .uri("/update")
        .header(header::AUTHORIZATION, auth)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
    };

    let (status, body) = ada.send(put(&ada.auth, json!({ "email": "Grace@Example.com" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, body) = ada
      .send(put(&ada.auth, json!({ "familyName": "King", "fullNames": "  ", "email": "countess@example.com" })))
      .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["familyName"], "King");
    assert_eq!(body["fullNames"], "Ada Augusta");
    assert_eq!(body["email"], "countess@example.com");

    // The old login no longer resolves.
    let (status, _) = ada.get("/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let renamed = Client { auth: basic("countess@example.com", PASSWORD), ..ada };
    let (status, me) = renamed.get("/me").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["familyName"], "King");
  }

  #[tokio::test]
  async fn change_password_requires_current_one() {
    let (_dir, state) = test_state().await;
    let ada = client(&state, "ada@example.com").await;

    let change = |current: &str, new: &str| {
      Request::builder()
        .method("PUT")
        .uri("/change-password")
        .header(header::AUTHORIZATION, &ada.auth)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "currentPassword": current, "newPassword": new }).to_string()))
        .unwrap()
    };

    let (status, body) = ada.send(change("not it at all", "brand new secret")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "current password is incorrect");

    let (status, _) = ada.send(change(PASSWORD, "short")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = ada.send(change(PASSWORD, "brand new secret")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body, json!({ "success": true }));

    let (status, _) = ada.get("/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let moved = Client { auth: basic("ada@example.com", "brand new secret"), ..ada };
    assert_eq!(moved.get("/me").await.0, StatusCode::OK);
  }

  #[tokio::test]
  async fn me_starts_empty() {
    let (_dir, state) = test_state().await;
    let ada = client(&state, "ada@example.com").await;

    let (status, body) = ada.get("/me").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completedSlots"], 0);
    assert_eq!(body["requiredSlots"], 3);
    assert_eq!(body["isComplete"], false);
    assert_eq!(body["documents"]["witnessTestimonies"], json!([]));
  }

  // ── Auth ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn upload_requires_credentials() {
    let (_dir, state) = test_state().await;
    let (content_type, bytes) = pdf("politicalDeclaration", &["pd.pdf"]).finish();
    let req = Request::builder()
      .method("POST")
      .uri("/upload")
      .header(header::CONTENT_TYPE, content_type)
      .body(Body::from(bytes))
      .unwrap();
    let res = router(state).oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  // ── Upload ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn folder_upload_mirrors_tree_in_order() {
    let (dir, state) = test_state().await;
    let ada = client(&state, "ada@example.com").await;

    let body = MultipartBody::new()
      .field("documentType", "folderUpload")
      .field("folderName", "evidence")
      .file("files", "evidence/b.txt", "text/plain", b"b")
      .file("files", "evidence/sub/a.txt", "text/plain", b"a")
      .file("files", "loose.txt", "text/plain", b"l");
    let (status, body) = ada.upload(body).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let id = ada.id;
    let expected = [
      format!("{BASE_URL}/uploads/{id}/evidence/b.txt"),
      format!("{BASE_URL}/uploads/{id}/evidence/sub/a.txt"),
      format!("{BASE_URL}/uploads/{id}/evidence/loose.txt"),
    ];
    assert_eq!(body["filePaths"], json!(expected));

    let root = ada.subject_dir(dir.path()).join("evidence");
    assert_eq!(std::fs::read(root.join("sub/a.txt")).unwrap(), b"a");
    assert!(root.join("loose.txt").is_file());

    let (_, me) = ada.get("/me").await;
    assert_eq!(me["documents"]["folderUpload"]["files"], json!(expected));
    assert_eq!(me["documents"]["folderUpload"]["folderName"], "evidence");
  }

  #[tokio::test]
  async fn empty_folder_writes_marker() {
    let (dir, state) = test_state().await;
    let ada = client(&state, "ada@example.com").await;

    let (status, body) = ada
      .upload(MultipartBody::new().field("emptyFolder", "true").field("folderName", "pending"))
      .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["filePaths"], json!([]));

    let marker = ada.subject_dir(dir.path()).join("pending/.emptyfolder");
    assert_eq!(std::fs::metadata(&marker).unwrap().len(), 0);

    let (_, me) = ada.get("/me").await;
    assert_eq!(me["documents"]["folderUpload"]["isEmptyFolder"], true);

    // Real files replace the marker.
    ada
      .upload(
        MultipartBody::new()
          .field("documentType", "folderUpload")
          .field("folderName", "pending")
          .file("files", "pending/x.txt", "text/plain", b"x"),
      )
      .await;
    assert!(!marker.exists());
  }

  #[tokio::test]
  async fn nested_folder_clears_old_empty_marker() {
    let (dir, state) = test_state().await;
    let ada = client(&state, "ada@example.com").await;

    ada.upload(MultipartBody::new().field("emptyFolder", "true").field("folderName", "a")).await;
    let marker = ada.subject_dir(dir.path()).join("a/.emptyfolder");
    assert!(marker.is_file());

    let (status, body) = ada
      .upload(
        MultipartBody::new()
          .field("documentType", "folderUpload")
          .field("folderName", "a/b")
          .file("files", "a/b/x.txt", "text/plain", b"x"),
      )
      .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(!marker.exists());
    assert!(ada.subject_dir(dir.path()).join("a/b/x.txt").is_file());
  }

  #[tokio::test]
  async fn superseded_folder_keeps_files_other_slots_use() {
    let (dir, state) = test_state().await;
    let ada = client(&state, "ada@example.com").await;
    let subject = ada.subject_dir(dir.path());

    ada.upload(pdf("witnessTestimonies", &["old/w.pdf"])).await;
    let folder = |name: &str, file: &str| {
      MultipartBody::new()
        .field("documentType", "folderUpload")
        .field("folderName", name)
        .file("files", file, "text/plain", b"f")
    };
    ada.upload(folder("old", "old/a.txt")).await;
    let (status, _) = ada.upload(folder("new", "new/b.txt")).await;
    assert_eq!(status, StatusCode::OK);

    assert!(subject.join("old/w.pdf").is_file());
    assert!(!subject.join("old/a.txt").exists());
    assert!(subject.join("new/b.txt").is_file());

    let (_, me) = ada.get("/me").await;
    assert_eq!(me["documents"]["witnessTestimonies"].as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn zero_files_without_flag_is_rejected() {
    let (_dir, state) = test_state().await;
    let ada = client(&state, "ada@example.com").await;
    let (status, body) = ada.upload(MultipartBody::new().field("documentType", "folderUpload")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "no files uploaded");
  }

  #[tokio::test]
  async fn traversal_rejects_whole_submission() {
    let (dir, state) = test_state().await;
    let ada = client(&state, "ada@example.com").await;

    let (status, body) = ada.upload(pdf("witnessTestimonies", &["ok.pdf", "../escape.pdf"])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid path");
    assert_eq!(count_files(&ada.subject_dir(dir.path())), 0);
    assert!(!dir.path().join("escape.pdf").exists());
  }

  #[tokio::test]
  async fn oversize_profile_image_writes_nothing() {
    let limits = UploadLimits { profile_image_bytes: 16, submission_bytes: 1024 };
    let (dir, state) = test_state_with(limits).await;
    let ada = client(&state, "ada@example.com").await;

    let body = MultipartBody::new()
      .field("type", "profileImage")
      .file("file", "me.png", "image/png", &[0u8; 17]);
    let (status, body) = ada.upload(body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid profile image");
    assert_eq!(count_files(&dir.path().join("profile-images")), 0);
  }

  #[tokio::test]
  async fn oversize_submission_writes_nothing() {
    let limits = UploadLimits { profile_image_bytes: 16, submission_bytes: 1024 };
    let (dir, state) = test_state_with(limits).await;
    let ada = client(&state, "ada@example.com").await;

    let body = MultipartBody::new()
      .field("documentType", "witnessTestimonies")
      .file("files", "a.bin", "application/octet-stream", &[0u8; 600])
      .file("files", "b.bin", "application/octet-stream", &[0u8; 600]);
    let (status, body) = ada.upload(body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");
    assert_eq!(count_files(&ada.subject_dir(dir.path())), 0);
  }

  #[tokio::test]
  async fn profile_image_replacement_removes_old_file() {
    let (dir, state) = test_state().await;
    let ada = client(&state, "ada@example.com").await;
    let image = || {
      MultipartBody::new()
        .field("type", "profileImage")
        .file("file", "me.PNG", "image/png", b"\x89PNG")
    };

    let (status, first) = ada.upload(image()).await;
    assert_eq!(status, StatusCode::OK, "{first}");
    let first_url = first["filePaths"][0].as_str().unwrap().to_owned();
    assert!(first_url.starts_with(&format!("{BASE_URL}/uploads/profile-images/")));
    assert!(first_url.ends_with(".png"));

    let (_, second) = ada.upload(image()).await;
    assert_ne!(second["filePaths"][0], first["filePaths"][0]);
    assert_eq!(count_files(&dir.path().join("profile-images")), 1);

    let (_, me) = ada.get("/me").await;
    assert_eq!(me["profileImage"], second["filePaths"][0]);
  }

  #[tokio::test]
  async fn single_slot_takes_one_file_and_supersedes() {
    let (dir, state) = test_state().await;
    let ada = client(&state, "ada@example.com").await;
    let subject = ada.subject_dir(dir.path());

    let (status, _) = ada.upload(pdf("politicalDeclaration", &["a.pdf", "b.pdf"])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    ada.upload(pdf("politicalDeclaration", &["v1.pdf"])).await;
    ada.upload(pdf("politicalDeclaration", &["v2.pdf"])).await;
    assert!(!subject.join("v1.pdf").exists());
    assert!(subject.join("v2.pdf").is_file());
  }

  #[tokio::test]
  async fn id_document_records_kind() {
    let (_dir, state) = test_state().await;
    let ada = client(&state, "ada@example.com").await;

    let body = pdf("idDocument", &["passport.pdf"]).field("idDocumentKind", "Passport");
    let (status, _) = ada.upload(body).await;
    assert_eq!(status, StatusCode::OK);

    let (_, me) = ada.get("/me").await;
    assert_eq!(me["documents"]["idDocument"], "Passport");

    ada.delete("idDocumentFile").await;
    let (_, me) = ada.get("/me").await;
    assert_eq!(me["documents"]["idDocument"], Value::Null);
    assert_eq!(me["documents"]["idDocumentFile"], Value::Null);
  }

  // ── Delete ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn folder_delete_removes_tree_and_is_idempotent() {
    let (dir, state) = test_state().await;
    let ada = client(&state, "ada@example.com").await;

    ada
      .upload(
        MultipartBody::new()
          .field("documentType", "folderUpload")
          .field("folderName", "box")
          .file("files", "box/a/b/c.txt", "text/plain", b"c")
          .file("files", "box/d.txt", "text/plain", b"d"),
      )
      .await;
    let folder = ada.subject_dir(dir.path()).join("box");
    assert!(folder.is_dir());

    let (status, body) = ada.delete("folderUpload").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));
    assert!(!folder.exists());

    let (_, me) = ada.get("/me").await;
    assert_eq!(me["documents"]["folderUpload"], Value::Null);

    let (status, _) = ada.delete("folderUpload").await;
    assert_eq!(status, StatusCode::OK);
  }

  #[tokio::test]
  async fn failed_storage_delete_leaves_ledger_alone() {
    let (dir, state) = test_state().await;
    let ada = client(&state, "ada@example.com").await;
    ada.upload(pdf("politicalDeclaration", &["pd.pdf"])).await;

    // A directory where the file was makes the removal fail for a reason
    // other than absence.
    let on_disk = ada.subject_dir(dir.path()).join("pd.pdf");
    std::fs::remove_file(&on_disk).unwrap();
    std::fs::create_dir(&on_disk).unwrap();
    std::fs::write(on_disk.join("inner"), b"x").unwrap();

    let (status, body) = ada.delete("politicalDeclaration").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "storage_delete");

    let (_, me) = ada.get("/me").await;
    let expected = format!("{BASE_URL}/uploads/{}/pd.pdf", ada.id);
    assert_eq!(me["documents"]["politicalDeclaration"], json!(expected));
  }

  #[tokio::test]
  async fn delete_unknown_slot_is_validation() {
    let (_dir, state) = test_state().await;
    let ada = client(&state, "ada@example.com").await;
    let (status, body) = ada.delete("utilityBill").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");
  }

  // ── Completion ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn certificate_is_forbidden_until_complete() {
    let (_dir, state) = test_state().await;
    let ada = client(&state, "ada@example.com").await;
    let (status, body) = ada.get("/certificate").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "documents incomplete");
  }

  #[tokio::test]
  async fn witness_cycle_then_completion_and_listing() {
    let (dir, state) = test_state().await;
    let ada   = client(&state, "ada@example.com").await;
    let grace = client(&state, "grace@example.com").await;
    let witness_dir = ada.subject_dir(dir.path()).join("witness");

    let (status, _) = ada
      .upload(pdf("witnessTestimonies", &["witness/1.pdf", "witness/2.pdf", "witness/3.pdf"]))
      .await;
    assert_eq!(status, StatusCode::OK);
    let (_, me) = ada.get("/me").await;
    assert_eq!(me["documents"]["witnessTestimonies"].as_array().unwrap().len(), 3);

    ada.delete("witnessTestimonies").await;
    assert_eq!(count_files(&witness_dir), 0);
    let (_, me) = ada.get("/me").await;
    assert_eq!(me["documents"]["witnessTestimonies"], json!([]));

    ada.upload(pdf("politicalDeclaration", &["pd.pdf"])).await;
    ada.upload(pdf("witnessTestimonies", &["witness/4.pdf", "witness/5.pdf"])).await;
    ada.upload(pdf("idDocument", &["id.pdf"])).await;

    let (_, me) = ada.get("/me").await;
    assert_eq!(me["isComplete"], true);
    assert_eq!(me["completedSlots"], 3);

    let (status, view) = grace.get("/public-view").await;
    assert_eq!(status, StatusCode::OK);
    let users = view["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["familyName"], "Lovelace");
    assert_eq!(users[0]["documents"]["witnessTestimonies"], 2);
    assert!(users[0].get("email").is_none());

    let (status, cert) = ada.get("/certificate").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cert["documents"]["idDocument"], true);

    // Dropping any required slot takes the subject out of the listing.
    ada.delete("politicalDeclaration").await;
    let (_, view) = grace.get("/public-view").await;
    assert_eq!(view["users"], json!([]));
  }
}
