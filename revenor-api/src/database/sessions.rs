use crate::database::AsyncDbConnection;
use anyhow::Result;
use rusqlite::{named_params, OptionalExtension, Row};
use shared_types::{AnalysisSession, OpenaiStatus, SessionStatus};

/// Every field except the key is optional: None means "leave whatever the
/// row already has" (COALESCE on update)
#[derive(Debug, Clone, Default)]
pub struct ReportUpsert {
    pub comment: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub status: Option<SessionStatus>,
    pub openai_status: Option<OpenaiStatus>,
    pub openai_response_id: Option<String>,
    pub files_count: Option<i64>,
    pub files_data: Option<serde_json::Value>,
    pub report_text: Option<String>,
    pub report_structured: Option<serde_json::Value>,
    pub tax_report: Option<serde_json::Value>,
    pub financial_report: Option<serde_json::Value>,
    pub completed_at: Option<i64>,
}

/// Idempotent write of session state. Safe to repeat; a terminal status is
/// never overwritten by `generating`.
pub async fn upsert_report(
    conn: AsyncDbConnection,
    session_id: &str,
    payload: &ReportUpsert,
) -> Result<()> {
    let conn = conn.lock().await;
    let now = chrono::Utc::now().timestamp();

    conn.execute(
        "INSERT INTO sessions
            (session_id, comment, metadata, status, openai_status, openai_response_id,
             files_count, files_data, report_text, report_structured, tax_report,
             financial_report, created_at, completed_at)
         VALUES
            (:session_id, :comment, :metadata, COALESCE(:status, 'generating'),
             :openai_status, :openai_response_id, COALESCE(:files_count, 0), :files_data,
             :report_text, :report_structured, :tax_report, :financial_report,
             :created_at, :completed_at)
         ON CONFLICT(session_id) DO UPDATE SET
            comment = COALESCE(:comment, sessions.comment),
            metadata = COALESCE(:metadata, sessions.metadata),
            status = CASE
                WHEN sessions.status IN ('completed', 'failed')
                     AND COALESCE(:status, 'generating') = 'generating'
                    THEN sessions.status
                ELSE COALESCE(:status, sessions.status)
            END,
            openai_status = COALESCE(:openai_status, sessions.openai_status),
            openai_response_id = COALESCE(:openai_response_id, sessions.openai_response_id),
            files_count = COALESCE(:files_count, sessions.files_count),
            files_data = COALESCE(:files_data, sessions.files_data),
            report_text = COALESCE(:report_text, sessions.report_text),
            report_structured = COALESCE(:report_structured, sessions.report_structured),
            tax_report = COALESCE(:tax_report, sessions.tax_report),
            financial_report = COALESCE(:financial_report, sessions.financial_report),
            completed_at = COALESCE(:completed_at, sessions.completed_at)",
        named_params! {
            ":session_id": session_id,
            ":comment": payload.comment,
            ":metadata": payload.metadata.as_ref().map(to_json),
            ":status": payload.status.map(|s| s.as_str()),
            ":openai_status": payload.openai_status.map(|s| s.as_str()),
            ":openai_response_id": payload.openai_response_id,
            ":files_count": payload.files_count,
            ":files_data": payload.files_data.as_ref().map(to_json),
            ":report_text": payload.report_text,
            ":report_structured": payload.report_structured.as_ref().map(to_json),
            ":tax_report": payload.tax_report.as_ref().map(to_json),
            ":financial_report": payload.financial_report.as_ref().map(to_json),
            ":created_at": now,
            ":completed_at": payload.completed_at,
        },
    )?;

    Ok(())
}

pub async fn get_by_session(
    conn: AsyncDbConnection,
    session_id: &str,
) -> Result<Option<AnalysisSession>> {
    let conn = conn.lock().await;
    let session = conn
        .query_row(
            &format!("{SELECT_SESSION} WHERE session_id = ?1"),
            [session_id],
            row_to_session,
        )
        .optional()?;
    Ok(session)
}

pub async fn list_recent(conn: AsyncDbConnection, limit: usize) -> Result<Vec<AnalysisSession>> {
    let conn = conn.lock().await;
    let mut stmt = conn.prepare(&format!(
        "{SELECT_SESSION} ORDER BY created_at DESC, session_id DESC LIMIT ?1"
    ))?;
    let sessions = stmt
        .query_map([limit as i64], row_to_session)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(sessions)
}

/// Delete the session with its messages and files. Returns false when the
/// session did not exist.
pub async fn cascade_delete(conn: AsyncDbConnection, session_id: &str) -> Result<bool> {
    let conn = conn.lock().await;
    conn.execute("DELETE FROM messages WHERE session_id = ?1", [session_id])?;
    conn.execute("DELETE FROM files WHERE session_id = ?1", [session_id])?;
    let deleted = conn.execute("DELETE FROM sessions WHERE session_id = ?1", [session_id])?;
    Ok(deleted > 0)
}

const SELECT_SESSION: &str = "SELECT session_id, comment, metadata, status, openai_status,
    openai_response_id, files_count, files_data, report_text, report_structured,
    tax_report, financial_report, created_at, completed_at FROM sessions";

fn to_json(value: &serde_json::Value) -> String {
    value.to_string()
}

fn json_column(row: &Row, idx: usize) -> rusqlite::Result<Option<serde_json::Value>> {
    let text: Option<String> = row.get(idx)?;
    Ok(text.and_then(|t| serde_json::from_str(&t).ok()))
}

fn row_to_session(row: &Row) -> rusqlite::Result<AnalysisSession> {
    let status_text: String = row.get(3)?;
    let openai_text: Option<String> = row.get(4)?;
    Ok(AnalysisSession {
        session_id: row.get(0)?,
        comment: row.get(1)?,
        metadata: json_column(row, 2)?,
        status: SessionStatus::parse(&status_text).unwrap_or(SessionStatus::Failed),
        openai_status: openai_text.as_deref().and_then(OpenaiStatus::parse),
        openai_response_id: row.get(5)?,
        files_count: row.get(6)?,
        files_data: json_column(row, 7)?,
        report_text: row.get(8)?,
        report_structured: json_column(row, 9)?,
        tax_report: json_column(row, 10)?,
        financial_report: json_column(row, 11)?,
        created_at: row.get(12)?,
        completed_at: row.get(13)?,
    })
}
