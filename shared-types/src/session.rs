use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Lifecycle status of an analysis session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Generating,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Generating => "generating",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "generating" => Some(SessionStatus::Generating),
            "completed" => Some(SessionStatus::Completed),
            "failed" => Some(SessionStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Failed)
    }
}

/// Outcome of the LLM review step, orthogonal to the session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum OpenaiStatus {
    Skipped,
    Completed,
    Partial,
    Failed,
}

impl OpenaiStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpenaiStatus::Skipped => "skipped",
            OpenaiStatus::Completed => "completed",
            OpenaiStatus::Partial => "partial",
            OpenaiStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "skipped" => Some(OpenaiStatus::Skipped),
            "completed" => Some(OpenaiStatus::Completed),
            "partial" => Some(OpenaiStatus::Partial),
            "failed" => Some(OpenaiStatus::Failed),
            _ => None,
        }
    }
}

/// One statement submission tracked end to end, stored in database
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSession {
    pub session_id: String,
    pub comment: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub status: SessionStatus,
    pub openai_status: Option<OpenaiStatus>,
    pub openai_response_id: Option<String>,
    pub files_count: i64,
    /// Summary of submitted files: array of {name, size, mime, category, external_id?}
    pub files_data: Option<serde_json::Value>,
    pub report_text: Option<String>,
    pub report_structured: Option<serde_json::Value>,
    pub tax_report: Option<serde_json::Value>,
    pub financial_report: Option<serde_json::Value>,
    pub created_at: i64,
    pub completed_at: Option<i64>,
}

/// Response after accepting a submission
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisAccepted {
    pub session_id: String,
    pub status: SessionStatus,
}

/// Listing of recent sessions, newest first
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ReportListResponse {
    pub reports: Vec<AnalysisSession>,
}
