//! Adapters for the external PDF-to-tabular-data extractor.
//!
//! Two interchangeable transports: the bundled CLI run as a subprocess, and
//! the same service spoken to over HTTP. The orchestrator only sees
//! [`StatementExtractor`].

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use extractors::payload::parse_extractor_output;
use shared_types::ExtractorDocument;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Wall clock granted to the extractor per file
pub const EXTRACT_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct PdfPayload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait StatementExtractor: Send + Sync {
    /// One document per input file. A file that cannot be processed comes
    /// back with its `error` set; only a transport-level failure of the
    /// whole batch is an `Err`.
    async fn extract(&self, files: &[PdfPayload]) -> Result<Vec<ExtractorDocument>>;
}

/// Runs the extractor CLI once per file against a short-lived temp copy
pub struct SubprocessExtractor {
    command: PathBuf,
    timeout: Duration,
}

impl SubprocessExtractor {
    pub fn new(command: PathBuf) -> Self {
        Self {
            command,
            timeout: EXTRACT_TIMEOUT,
        }
    }

    async fn extract_one(&self, file: &PdfPayload) -> Result<Vec<ExtractorDocument>> {
        let dir = tempfile::tempdir().context("failed to create temp dir for PDF")?;
        let pdf_path = dir.path().join(sanitize_filename(&file.filename));
        tokio::fs::write(&pdf_path, &file.bytes)
            .await
            .context("failed to write temp PDF")?;

        let run = Command::new(&self.command)
            .arg(&pdf_path)
            .arg("--json")
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| anyhow!("extractor timed out after {:?}", self.timeout))??;

        // The temp copy dies with `dir` on every path out of here
        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!(file = %file.filename, status = ?output.status.code(), "extractor finished");

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "extractor exited with {:?}: {}",
                output.status.code(),
                stderr.trim()
            ));
        }

        parse_extractor_output(&stdout)
    }
}

#[async_trait]
impl StatementExtractor for SubprocessExtractor {
    async fn extract(&self, files: &[PdfPayload]) -> Result<Vec<ExtractorDocument>> {
        let mut documents = Vec::with_capacity(files.len());
        for file in files {
            match self.extract_one(file).await {
                Ok(mut docs) => {
                    if docs.is_empty() {
                        // "No credit rows found" collapses to a successful
                        // empty document for the file
                        documents.push(ExtractorDocument {
                            source_file: file.filename.clone(),
                            metadata: serde_json::Value::Null,
                            transactions: Vec::new(),
                            excel_file: None,
                            error: None,
                        });
                    } else {
                        documents.append(&mut docs);
                    }
                }
                Err(e) => {
                    warn!(file = %file.filename, error = %e, "extractor failed for file");
                    documents.push(ExtractorDocument::failed(&file.filename, e.to_string()));
                }
            }
        }
        Ok(documents)
    }
}

/// Talks to the extractor's HTTP `/process` endpoint with one multipart
/// batch; 204 means no credit rows anywhere
pub struct HttpExtractor {
    client: reqwest::Client,
    url: String,
}

impl HttpExtractor {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: format!("{}/process", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl StatementExtractor for HttpExtractor {
    async fn extract(&self, files: &[PdfPayload]) -> Result<Vec<ExtractorDocument>> {
        let mut form = reqwest::multipart::Form::new();
        for file in files {
            let part = reqwest::multipart::Part::bytes(file.bytes.clone())
                .file_name(file.filename.clone())
                .mime_str("application/pdf")?;
            form = form.part("files", part);
        }

        let timeout = EXTRACT_TIMEOUT * files.len().max(1) as u32;
        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .timeout(timeout)
            .send()
            .await
            .context("extractor service unreachable")?;

        if response.status() == reqwest::StatusCode::NO_CONTENT {
            return Ok(files
                .iter()
                .map(|f| ExtractorDocument {
                    source_file: f.filename.clone(),
                    metadata: serde_json::Value::Null,
                    transactions: Vec::new(),
                    excel_file: None,
                    error: None,
                })
                .collect());
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("extractor service returned {status}: {body}"));
        }

        Ok(response.json().await?)
    }
}

fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "statement.pdf".to_string()
    } else {
        cleaned
    }
}
