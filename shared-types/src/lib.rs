use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub mod extraction;
pub mod file;
pub mod message;
pub mod report;
pub mod review;
pub mod session;
pub mod transaction;

pub use extraction::{ExcelArtifact, ExtractorDocument, RawRecord};
pub use file::{FileCategory, FileSummary, StoredFile};
pub use message::{MessageListResponse, MessageRole, SessionMessage};
pub use report::{
    ClassBreakdown, MoneyView, MonthBucket, ReportStats, ReportTotals, RevenueReport,
    TrailingRevenue, YearBucket,
};
pub use review::{ReviewDecision, ReviewItem};
pub use session::{
    AnalysisAccepted, AnalysisSession, OpenaiStatus, ReportListResponse, SessionStatus,
};
pub use transaction::{ClassificationSource, Transaction};

/// Error response for API endpoints; `error` is a machine-readable code
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
