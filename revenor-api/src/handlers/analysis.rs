use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::jobs::analysis_manager::{AnalysisManager, Submission, SubmittedFile};
use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse};
use futures_util::TryStreamExt;
use shared_types::{AnalysisAccepted, SessionStatus};
use std::sync::Arc;
use tracing::info;

/// POST /api/analysis: multipart with repeatable `files`, optional
/// `comment`, `metadata` (JSON) and `sessionId`. Returns 202 with the
/// provisional status; the pipeline runs in the background.
pub async fn submit_analysis(
    mut payload: Multipart,
    manager: web::Data<Arc<AnalysisManager>>,
    config: web::Data<ApiConfig>,
) -> Result<HttpResponse, ApiError> {
    let max_file_size = config.max_file_size();

    let mut files: Vec<SubmittedFile> = Vec::new();
    let mut comment: Option<String> = None;
    let mut metadata: Option<serde_json::Value> = None;
    let mut session_id: Option<String> = None;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart payload: {e}")))?
    {
        let (field_name, filename) = {
            let disposition = field.content_disposition();
            (
                disposition.get_name().unwrap_or("").to_string(),
                disposition.get_filename().map(str::to_string),
            )
        };

        if let Some(filename) = filename {
            let mime = field
                .content_type()
                .map(|m| m.to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let bytes = read_file_field(&mut field, &filename, max_file_size).await?;
            files.push(SubmittedFile {
                name: filename,
                mime,
                bytes,
            });
            continue;
        }

        let text = read_text_field(&mut field).await?;
        match field_name.as_str() {
            "comment" => {
                if text.len() > 10 * 1024 {
                    return Err(ApiError::BadRequest(
                        "comment must not exceed 10 KB".to_string(),
                    ));
                }
                comment = Some(text).filter(|t| !t.trim().is_empty());
            }
            "metadata" => {
                if !text.trim().is_empty() {
                    metadata = Some(serde_json::from_str(&text).map_err(|_| {
                        ApiError::BadRequest("metadata must be valid JSON".to_string())
                    })?);
                }
            }
            "sessionId" => session_id = Some(text).filter(|t| !t.trim().is_empty()),
            _ => {}
        }
    }

    if files.is_empty() {
        return Err(ApiError::FilesRequired);
    }

    info!(
        "Submission accepted: {} files, session {}",
        files.len(),
        session_id.as_deref().unwrap_or("<generated>")
    );

    let session_id = manager
        .start_analysis(Submission {
            session_id,
            comment,
            metadata,
            files,
        })
        .await?;

    Ok(HttpResponse::Accepted().json(AnalysisAccepted {
        session_id,
        status: SessionStatus::Generating,
    }))
}

async fn read_file_field(
    field: &mut Field,
    filename: &str,
    max_file_size: u64,
) -> Result<Vec<u8>, ApiError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field
        .try_next()
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read file {filename}: {e}")))?
    {
        bytes.extend_from_slice(&chunk);
        if bytes.len() as u64 > max_file_size {
            return Err(ApiError::FileTooLarge(filename.to_string()));
        }
    }
    Ok(bytes)
}

async fn read_text_field(field: &mut Field) -> Result<String, ApiError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field
        .try_next()
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read form field: {e}")))?
    {
        bytes.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
