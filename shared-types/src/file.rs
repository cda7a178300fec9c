use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Category assigned to an uploaded file from its name and mime type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
pub enum FileCategory {
    Statements,
    Taxes,
    Financial,
    ConvertedStatement,
    Uncategorized,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Statements => "statements",
            FileCategory::Taxes => "taxes",
            FileCategory::Financial => "financial",
            FileCategory::ConvertedStatement => "converted-statement",
            FileCategory::Uncategorized => "uncategorized",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "statements" => Some(FileCategory::Statements),
            "taxes" => Some(FileCategory::Taxes),
            "financial" => Some(FileCategory::Financial),
            "converted-statement" => Some(FileCategory::ConvertedStatement),
            "uncategorized" => Some(FileCategory::Uncategorized),
            _ => None,
        }
    }
}

/// One uploaded artifact bound to a session, stored in database
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub id: i64,
    pub session_id: String,
    /// Id assigned by the upload collaborator, when applicable
    pub external_file_id: Option<String>,
    pub original_name: String,
    pub size: i64,
    pub mime_type: String,
    pub category: FileCategory,
    pub uploaded_at: i64,
}

/// Canonical per-file entry in the session's files_data summary
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct FileSummary {
    pub name: String,
    pub size: i64,
    pub mime: String,
    pub category: FileCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}
