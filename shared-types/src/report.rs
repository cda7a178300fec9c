use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Monetary value alongside its rendered form, e.g. "1 234 567,89 KZT"
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct MoneyView {
    pub value: f64,
    pub formatted: String,
}

/// One calendar month inside a year bucket
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct MonthBucket {
    /// Month index 0..11
    pub month: u32,
    pub label: String,
    pub value: f64,
    pub formatted: String,
}

/// Totals and month breakdown for a single year
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct YearBucket {
    pub year: i32,
    pub total: MoneyView,
    pub months: Vec<MonthBucket>,
}

/// Year/month table for one transaction class
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ClassBreakdown {
    pub total: MoneyView,
    pub years: Vec<YearBucket>,
}

/// Revenue summed over the twelve months ending at the latest revenue date
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct TrailingRevenue {
    pub value: f64,
    pub formatted: String,
    /// ISO date of the window end; absent when no dated revenue exists
    pub reference_period_end: Option<String>,
}

/// Classification counters and reconciliation deltas
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    pub total: i64,
    pub auto_revenue: i64,
    pub agent_reviewed: i64,
    pub agent_decisions: i64,
    pub unresolved: i64,
    /// Revenue total minus the sum of its year buckets (undated or out-of-window)
    pub revenue_unattributed: f64,
    pub non_revenue_unattributed: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ReportTotals {
    pub revenue: MoneyView,
    pub non_revenue: MoneyView,
}

/// Terminal artifact of a session; the structured form is the source of truth
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct RevenueReport {
    pub session_id: String,
    pub generated_at: i64,
    pub currency: String,
    pub totals: ReportTotals,
    pub revenue: ClassBreakdown,
    pub non_revenue: ClassBreakdown,
    pub trailing_twelve_months_revenue: TrailingRevenue,
    pub stats: ReportStats,
}
