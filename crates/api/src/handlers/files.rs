//! Handlers for compliance document uploads.
//!
//! Blobs are stored under
//! `users/<partner_id>/submissions/<id>/<category>/<field_id>/<name>`,
//! where `name` is `<field_id>-<n>.<ext>` and `n` is one past the number of
//! files already uploaded for that field. The submission row records the
//! metadata; removal deletes the backing blob first and then drops the
//! entry.

use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use onboard_core::error::CoreError;
use onboard_core::section::Section;
use onboard_core::submission::SubmissionFile;
use onboard_core::types::EntityId;
use onboard_db::repositories::SubmissionRepo;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

use super::submission::{load_for_viewer, own_submission};

/// Path-safe slug of a section name, e.g. `"Company Information"` ->
/// `"company-information"`.
fn section_slug(section: Section) -> String {
    section.as_str().to_lowercase().replace(' ', "-")
}

/// Field ids come from the client; they become path components, so only a
/// conservative character set is accepted.
fn validate_field_id(field_id: &str) -> AppResult<()> {
    let ok = !field_id.is_empty()
        && field_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !ok {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Invalid document field id '{field_id}'"
        ))));
    }
    Ok(())
}

/// Lowercased extension of the original filename, if it has one.
fn file_extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// POST /api/v1/submissions/me/files (multipart)
///
/// Expects `category` and `field_id` text parts followed by a `file` part.
pub async fn upload_file(
    auth: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut category: Option<Section> = None;
    let mut field_id: Option<String> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        let part_name = part.name().map(str::to_string);
        match part_name.as_deref() {
            Some("category") => {
                let value = part
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?;
                category = Some(Section::parse(&value)?);
            }
            Some("field_id") => {
                let value = part
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?;
                validate_field_id(&value)?;
                field_id = Some(value);
            }
            Some("file") => {
                let filename = part.file_name().unwrap_or("upload").to_string();
                let bytes = part
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?;
                file = Some((filename, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let category = category
        .ok_or_else(|| AppError::BadRequest("Missing 'category' part".into()))?;
    let field_id =
        field_id.ok_or_else(|| AppError::BadRequest("Missing 'field_id' part".into()))?;
    let (filename, bytes) =
        file.ok_or_else(|| AppError::BadRequest("Missing 'file' part".into()))?;
    if bytes.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".into()));
    }

    let row = own_submission(&state, &auth).await?;

    // Per-field sequence number: one past the count of entries already
    // recorded for this field.
    let sequence = row
        .files
        .0
        .iter()
        .filter(|f| f.field_id == field_id)
        .count()
        + 1;
    let name = match file_extension(&filename) {
        Some(ext) => format!("{field_id}-{sequence}.{ext}"),
        None => format!("{field_id}-{sequence}"),
    };
    let storage_path = format!(
        "users/{}/submissions/{}/{}/{}/{}",
        row.partner_id,
        row.id,
        section_slug(category),
        field_id,
        name
    );

    state.storage.put(&storage_path, &bytes).await?;

    let file_id = Uuid::new_v4();
    let entry = SubmissionFile {
        id: file_id,
        name,
        url: format!("/api/v1/submissions/{}/files/{}/download", row.id, file_id),
        storage_path,
        category,
        field_id,
        uploaded_at: Utc::now(),
        size: Some(bytes.len() as i64),
    };
    SubmissionRepo::append_file(&state.pool, row.id, &entry).await?;

    tracing::info!(
        submission_id = %row.id,
        file_id = %entry.id,
        field = %entry.field_id,
        bytes = bytes.len(),
        "Document uploaded"
    );
    Ok((StatusCode::CREATED, Json(entry)))
}

/// DELETE /api/v1/submissions/me/files/{file_id}
///
/// The backing blob is deleted first; only then is the metadata entry
/// dropped, so a failed blob delete never leaves a dangling entry.
pub async fn delete_file(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(file_id): Path<EntityId>,
) -> AppResult<impl IntoResponse> {
    let row = own_submission(&state, &auth).await?;

    let target = row
        .files
        .0
        .iter()
        .find(|f| f.id == file_id)
        .cloned()
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "File",
            id: file_id,
        }))?;

    state.storage.delete(&target.storage_path).await?;

    let remaining: Vec<_> = row
        .files
        .0
        .iter()
        .filter(|f| f.id != file_id)
        .cloned()
        .collect();
    SubmissionRepo::replace_files(&state.pool, row.id, &remaining).await?;

    tracing::info!(submission_id = %row.id, file_id = %file_id, "Document removed");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/submissions/{id}/files/{file_id}/download
pub async fn download_file(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, file_id)): Path<(EntityId, EntityId)>,
) -> AppResult<impl IntoResponse> {
    let row = load_for_viewer(&state, &auth, id).await?;

    let target = row
        .files
        .0
        .iter()
        .find(|f| f.id == file_id)
        .cloned()
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "File",
            id: file_id,
        }))?;

    let bytes = state.storage.get(&target.storage_path).await?;
    let headers = [
        (
            header::CONTENT_TYPE,
            "application/octet-stream".to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", target.name),
        ),
    ];
    Ok((headers, bytes))
}
