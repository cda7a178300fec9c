use serde::{Deserialize, Serialize};

/// Untyped transaction row as emitted by the PDF extractor
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Spreadsheet rendition of a statement produced by the extractor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcelArtifact {
    pub name: String,
    pub size: i64,
    pub mime: String,
    /// Base64-encoded file body
    pub data: String,
}

/// Per-file result of a PDF extraction batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorDocument {
    pub source_file: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub transactions: Vec<RawRecord>,
    #[serde(default)]
    pub excel_file: Option<ExcelArtifact>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ExtractorDocument {
    /// Statement currency reported by the extractor, when present
    pub fn currency(&self) -> Option<&str> {
        self.metadata.get("currency").and_then(|v| v.as_str())
    }

    pub fn failed(source_file: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
            metadata: serde_json::Value::Null,
            transactions: Vec::new(),
            excel_file: None,
            error: Some(error.into()),
        }
    }
}
