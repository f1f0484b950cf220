//! Upload endpoint

use crate::server::error::{ApiError, ApiResult};
use crate::server::state::AppState;
use axum::{
    extract::{multipart::Field, Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::{debug, info};
use vox_core::{Document, ExtractionError, MediaKind};
use vox_ingest::IngestError;

/// Response for an accepted upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub document_id: String,
    pub job_id: String,
    pub status_url: String,
    /// Other stored documents with the same content hash.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub duplicates: Vec<String>,
}

impl UploadResponse {
    pub fn new(document_id: impl Into<String>, job_id: impl Into<String>) -> Self {
        let job_id = job_id.into();
        Self {
            document_id: document_id.into(),
            status_url: format!("/status/{}", job_id),
            job_id,
            duplicates: Vec::new(),
        }
    }
}

/// POST /upload - Store a file and queue it for ingestion
///
/// Multipart fields: `file` (required), `kind` (document, audio or video;
/// defaults to the file extension) and `document_id` (replace a stored document).
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    if state.pipeline().is_shut_down() {
        return Err(IngestError::ShuttingDown.into());
    }

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut kind: Option<String> = None;
    let mut document_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "upload".to_string());
                let data = field.bytes().await.map_err(|e| {
                    ApiError::bad_request(format!("Failed to read file {}: {}", filename, e))
                })?;
                file = Some((filename, data.to_vec()));
            }
            "kind" => kind = Some(text_field(field).await?),
            "document_id" => document_id = Some(text_field(field).await?),
            other => debug!("Ignoring multipart field '{}'", other),
        }
    }

    let (filename, payload) = file.ok_or_else(|| ApiError::bad_request("Missing 'file' field"))?;
    let kind = resolve_kind(kind.as_deref(), &filename)?;

    let mut document = Document::new(filename, kind, payload);
    if let Some(id) = document_id.filter(|id| !id.trim().is_empty()) {
        if !state.pipeline().documents().contains(&id) {
            return Err(IngestError::DocumentNotFound(id).into());
        }
        document = document.with_id(id);
    }

    info!(
        "Upload {} ({}, {} bytes) as document {}",
        document.filename,
        document.kind,
        document.size(),
        document.id
    );

    let duplicates: Vec<String> = state
        .pipeline()
        .documents()
        .find_by_hash(&document.content_hash)
        .into_iter()
        .filter(|summary| summary.id != document.id)
        .map(|summary| summary.id)
        .collect();
    if !duplicates.is_empty() {
        debug!("{} has the same content as {:?}", document.filename, duplicates);
    }

    let document_id = document.id.clone();
    let job_id = state.pipeline().submit(document);

    let mut response = UploadResponse::new(document_id, job_id);
    response.duplicates = duplicates;
    Ok((StatusCode::ACCEPTED, Json(response)))
}

async fn text_field(field: Field<'_>) -> ApiResult<String> {
    field
        .text()
        .await
        .map(|s| s.trim().to_string())
        .map_err(|e| ApiError::bad_request(format!("Failed to read multipart field: {}", e)))
}

/// An explicit kind wins; otherwise the extension decides.
fn resolve_kind(kind: Option<&str>, filename: &str) -> ApiResult<MediaKind> {
    let unsupported = |what: &str| -> ApiError {
        IngestError::from(ExtractionError::UnsupportedKind(what.to_string())).into()
    };

    match kind.filter(|k| !k.is_empty()) {
        Some(k) => MediaKind::from_str(k).ok_or_else(|| unsupported(k)),
        None => MediaKind::from_filename(filename).ok_or_else(|| unsupported(filename)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_kind() {
        assert_eq!(resolve_kind(None, "call.MP3").unwrap(), MediaKind::Audio);
        assert_eq!(resolve_kind(Some("video"), "call.bin").unwrap(), MediaKind::Video);
        assert_eq!(resolve_kind(Some(""), "notes.md").unwrap(), MediaKind::Document);
        assert!(resolve_kind(None, "image.png").is_err());
        assert!(resolve_kind(Some("spreadsheet"), "notes.md").is_err());
    }

    #[test]
    fn test_status_url() {
        let response = UploadResponse::new("doc1", "job1");
        assert_eq!(response.status_url, "/status/job1");
    }
}
