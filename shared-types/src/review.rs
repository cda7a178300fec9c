use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Reduced transaction view sent to the review agent
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ReviewItem {
    pub id: String,
    /// ISO date, absent when the statement row carried none
    pub date: Option<String>,
    pub amount: f64,
    pub purpose: String,
    pub sender: String,
    pub correspondent: String,
    pub bin: Option<String>,
    pub comment: Option<String>,
}

/// One resolved verdict from the review agent
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ReviewDecision {
    pub id: String,
    pub is_revenue: bool,
    pub reason: String,
}
