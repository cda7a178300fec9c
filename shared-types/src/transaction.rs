use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Who made the final revenue call for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
pub enum ClassificationSource {
    Heuristic,
    Agent,
    AgentMissing,
}

impl ClassificationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationSource::Heuristic => "heuristic",
            ClassificationSource::Agent => "agent",
            ClassificationSource::AgentMissing => "agent-missing",
        }
    }
}

/// One credit-side entry extracted from a statement
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Stable within a session: "{session_id}_{index}"
    pub internal_id: String,
    pub raw_amount: String,
    pub amount: f64,
    pub value_date: Option<DateTime<Utc>>,
    pub purpose: String,
    pub sender: String,
    pub correspondent: String,
    pub bin: Option<String>,
    pub source_file: Option<String>,
    pub classification_source: ClassificationSource,
    pub classification_reason: String,
    /// Hint that the heuristic saw non-revenue context but could not decide
    pub possible_non_revenue: bool,
}
