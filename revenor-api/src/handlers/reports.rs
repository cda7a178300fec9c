use crate::database::{messages as messages_db, sessions as sessions_db, Database};
use crate::error::ApiError;
use crate::jobs::analysis_manager::AnalysisManager;
use actix_web::{web, HttpResponse};
use shared_types::{MessageListResponse, ReportListResponse};
use std::sync::Arc;

const RECENT_LIMIT: usize = 100;

/// GET /api/reports: the 100 most recent sessions, newest first, each
/// reconciled against the LLM provider when still generating
pub async fn list_reports(
    db: web::Data<Arc<Database>>,
    manager: web::Data<Arc<AnalysisManager>>,
) -> Result<HttpResponse, ApiError> {
    let sessions = sessions_db::list_recent(db.async_connection.clone(), RECENT_LIMIT)
        .await
        .map_err(ApiError::Internal)?;

    let mut reports = Vec::with_capacity(sessions.len());
    for session in sessions {
        reports.push(manager.refresh_session(session).await);
    }

    Ok(HttpResponse::Ok().json(ReportListResponse { reports }))
}

/// GET /api/reports/{sessionId}
pub async fn get_report(
    path: web::Path<String>,
    db: web::Data<Arc<Database>>,
    manager: web::Data<Arc<AnalysisManager>>,
) -> Result<HttpResponse, ApiError> {
    let session_id = path.into_inner();
    let session = sessions_db::get_by_session(db.async_connection.clone(), &session_id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::ReportNotFound(session_id.clone()))?;

    let session = manager.refresh_session(session).await;
    Ok(HttpResponse::Ok().json(session))
}

/// GET /api/reports/{sessionId}/messages, ordered by message_order
pub async fn get_messages(
    path: web::Path<String>,
    db: web::Data<Arc<Database>>,
) -> Result<HttpResponse, ApiError> {
    let session_id = path.into_inner();
    let exists = sessions_db::get_by_session(db.async_connection.clone(), &session_id)
        .await
        .map_err(ApiError::Internal)?
        .is_some();
    if !exists {
        return Err(ApiError::ReportNotFound(session_id));
    }

    let messages = messages_db::get_messages(db.async_connection.clone(), &session_id)
        .await
        .map_err(ApiError::Internal)?;

    Ok(HttpResponse::Ok().json(MessageListResponse { messages }))
}

/// DELETE /api/reports/{sessionId}: cascades to messages, files and the
/// in-process dedup claim
pub async fn delete_report(
    path: web::Path<String>,
    manager: web::Data<Arc<AnalysisManager>>,
) -> Result<HttpResponse, ApiError> {
    let session_id = path.into_inner();
    let existed = manager
        .delete_session(&session_id)
        .await
        .map_err(ApiError::Internal)?;

    if existed {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(ApiError::ReportNotFound(session_id))
    }
}
