use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use shared_types::ErrorResponse;
use thiserror::Error;

/// Upstream collaborators (extractor, LLM) being unreachable; recorded in
/// report text and logs rather than surfaced as an HTTP status
pub const UPSTREAM_UNAVAILABLE: &str = "UPSTREAM_UNAVAILABLE";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("at least one file is required")]
    FilesRequired,
    #[error("file \"{0}\" exceeds the per-file size limit")]
    FileTooLarge(String),
    #[error("analysis is already running for session {0}")]
    AnalysisInProgress(String),
    #[error("report not found: {0}")]
    ReportNotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::FilesRequired => "FILES_REQUIRED",
            ApiError::FileTooLarge(_) => "FILE_TOO_LARGE",
            ApiError::AnalysisInProgress(_) => "ANALYSIS_IN_PROGRESS",
            ApiError::ReportNotFound(_) => "REPORT_NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::FilesRequired | ApiError::FileTooLarge(_) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::AnalysisInProgress(_) => StatusCode::CONFLICT,
            ApiError::ReportNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.code().to_string(),
            message: self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_statuses() {
        assert_eq!(ApiError::FilesRequired.code(), "FILES_REQUIRED");
        assert_eq!(ApiError::FilesRequired.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::FileTooLarge("a.pdf".to_string()).code(),
            "FILE_TOO_LARGE"
        );
        assert_eq!(
            ApiError::AnalysisInProgress("s1".to_string()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::ReportNotFound("s1".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
    }
}
