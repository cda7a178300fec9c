use crate::database::sessions::{self, ReportUpsert};
use crate::database::{files as files_db, messages as messages_db, AsyncDbConnection};
use crate::error::{ApiError, UPSTREAM_UNAVAILABLE};
use crate::helpers::files::{categorize, is_pdf};
use crate::integrations::pdf_extractor::{PdfPayload, StatementExtractor};
use crate::jobs::registry::SessionRegistry;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use extractors::aggregate::{build_breakdown, sort_by_date, trailing_twelve_months};
use extractors::classifier::{classify, HeuristicClass};
use extractors::records::normalize_record;
use extractors::render::render_report_text;
use revenor_agents::review::agent::{MessageSink, TransactionReviewer};
use revenor_agents::OpenAiClient;
use shared_types::{
    AnalysisSession, ClassificationSource, FileCategory, FileSummary, MessageRole, OpenaiStatus,
    RawRecord, ReportStats, ReportTotals, RevenueReport, ReviewItem, SessionStatus, Transaction,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct SubmittedFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

pub struct Submission {
    pub session_id: Option<String>,
    pub comment: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub files: Vec<SubmittedFile>,
}

/// Persists the review agent's conversation. Message writes are
/// best-effort: a dead database must not sink the review round.
struct DbMessageSink {
    db_conn: AsyncDbConnection,
}

#[async_trait]
impl MessageSink for DbMessageSink {
    async fn append_message(
        &self,
        session_id: &str,
        role: MessageRole,
        content: serde_json::Value,
    ) -> Result<()> {
        if let Err(e) =
            messages_db::append_message(self.db_conn.clone(), session_id, role, &content).await
        {
            warn!(
                "Failed to persist agent message for session {}: {}",
                session_id, e
            );
        }
        Ok(())
    }
}

pub fn db_message_sink(db_conn: AsyncDbConnection) -> Arc<dyn MessageSink> {
    Arc::new(DbMessageSink { db_conn })
}

/// Owns the per-session lifecycle: claims the dedup slot, persists initial
/// state, runs the pipeline in a background task and guarantees the claim
/// is released however the task ends.
pub struct AnalysisManager {
    db_conn: AsyncDbConnection,
    registry: Arc<SessionRegistry>,
    extractor: Arc<dyn StatementExtractor>,
    reviewer: Option<Arc<dyn TransactionReviewer>>,
    llm_client: Option<Arc<OpenAiClient>>,
}

impl AnalysisManager {
    pub fn new(
        db_conn: AsyncDbConnection,
        registry: Arc<SessionRegistry>,
        extractor: Arc<dyn StatementExtractor>,
        reviewer: Option<Arc<dyn TransactionReviewer>>,
        llm_client: Option<Arc<OpenAiClient>>,
    ) -> Self {
        Self {
            db_conn,
            registry,
            extractor,
            reviewer,
            llm_client,
        }
    }

    /// Accept a submission: claim the session, persist the provisional row,
    /// spawn the pipeline. Returns as soon as the row is durable.
    pub async fn start_analysis(&self, submission: Submission) -> Result<String, ApiError> {
        let session_id = submission
            .session_id
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        if !self.registry.claim(&session_id).await {
            return Err(ApiError::AnalysisInProgress(session_id));
        }

        let summaries: Vec<FileSummary> = submission
            .files
            .iter()
            .map(|f| FileSummary {
                name: f.name.clone(),
                size: f.bytes.len() as i64,
                mime: f.mime.clone(),
                category: categorize(&f.name, &f.mime),
                external_id: None,
            })
            .collect();

        let initial = ReportUpsert {
            comment: submission.comment.clone(),
            metadata: submission.metadata.clone(),
            status: Some(SessionStatus::Generating),
            files_count: Some(submission.files.len() as i64),
            files_data: serde_json::to_value(&summaries).ok(),
            ..Default::default()
        };
        if let Err(e) = sessions::upsert_report(self.db_conn.clone(), &session_id, &initial).await {
            self.registry.release(&session_id).await;
            return Err(ApiError::Internal(e));
        }

        let db_conn = self.db_conn.clone();
        let extractor = self.extractor.clone();
        let reviewer = self.reviewer.clone();
        let registry = self.registry.clone();
        let spawned_id = session_id.clone();

        tokio::spawn(async move {
            let pipeline_id = spawned_id.clone();
            let pipeline_db = db_conn.clone();
            let inner = tokio::spawn(run_pipeline(
                pipeline_db,
                extractor,
                reviewer,
                pipeline_id,
                submission,
            ));

            match inner.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    mark_failed(db_conn.clone(), &spawned_id, &e.to_string()).await;
                }
                Err(join_error) => {
                    mark_failed(
                        db_conn.clone(),
                        &spawned_id,
                        &format!("analysis task panicked: {join_error}"),
                    )
                    .await;
                }
            }
            registry.release(&spawned_id).await;
        });

        Ok(session_id)
    }

    /// Delete a session with everything it owns, including its dedup claim
    pub async fn delete_session(&self, session_id: &str) -> Result<bool> {
        let existed = sessions::cascade_delete(self.db_conn.clone(), session_id).await?;
        self.registry.release(session_id).await;
        Ok(existed)
    }

    /// Best-effort reconciliation for sessions whose terminal state was not
    /// yet observed: ask the LLM provider about the persisted response id
    /// and write a terminal status back. Idempotent; non-terminal sessions
    /// without a response id are returned untouched.
    pub async fn refresh_session(&self, session: AnalysisSession) -> AnalysisSession {
        if session.status != SessionStatus::Generating {
            return session;
        }
        let (Some(response_id), Some(client)) = (&session.openai_response_id, &self.llm_client)
        else {
            return session;
        };

        let provider_status = match client.response_status(response_id).await {
            Ok(status) => status,
            Err(e) => {
                debug!(
                    "Response status probe failed for session {}: {}",
                    session.session_id, e
                );
                return session;
            }
        };

        let mapped = match provider_status.as_str() {
            "completed" => Some((SessionStatus::Completed, OpenaiStatus::Completed)),
            "failed" | "cancelled" | "expired" | "incomplete" => {
                Some((SessionStatus::Failed, OpenaiStatus::Failed))
            }
            _ => None,
        };
        let Some((status, openai_status)) = mapped else {
            return session;
        };

        let payload = ReportUpsert {
            status: Some(status),
            openai_status: Some(openai_status),
            completed_at: Some(Utc::now().timestamp()),
            ..Default::default()
        };
        if let Err(e) =
            sessions::upsert_report(self.db_conn.clone(), &session.session_id, &payload).await
        {
            warn!(
                "Failed to write reconciled status for session {}: {}",
                session.session_id, e
            );
            return session;
        }

        sessions::get_by_session(self.db_conn.clone(), &session.session_id)
            .await
            .ok()
            .flatten()
            .unwrap_or(session)
    }
}

/// Ingest → Extract → Classify → Aggregate → Finalize, strictly in order.
/// Any error bubbles to the spawn wrapper which marks the session failed.
async fn run_pipeline(
    db_conn: AsyncDbConnection,
    extractor: Arc<dyn StatementExtractor>,
    reviewer: Option<Arc<dyn TransactionReviewer>>,
    session_id: String,
    submission: Submission,
) -> Result<()> {
    info!(
        "Analysis started for session {}: {} files",
        session_id,
        submission.files.len()
    );

    // Ingest: file records are best-effort, the pipeline carries on without them
    let mut pdfs = Vec::new();
    for file in &submission.files {
        let category = categorize(&file.name, &file.mime);
        if is_pdf(&file.name, &file.mime) {
            pdfs.push(PdfPayload {
                filename: file.name.clone(),
                bytes: file.bytes.clone(),
            });
        }
        if let Err(e) = files_db::insert_file(
            db_conn.clone(),
            &session_id,
            None,
            &file.name,
            file.bytes.len() as i64,
            &file.mime,
            category,
        )
        .await
        {
            warn!(
                "Failed to store file record {} for session {}: {}",
                file.name, session_id, e
            );
        }
    }

    // Extract: a whole-batch failure is fatal, per-file errors are not
    let documents = if pdfs.is_empty() {
        Vec::new()
    } else {
        extractor
            .extract(&pdfs)
            .await
            .map_err(|e| anyhow!("{UPSTREAM_UNAVAILABLE}: PDF extractor failed: {e}"))?
    };

    let mut currency: Option<String> = None;
    let mut rows: Vec<(RawRecord, String)> = Vec::new();
    for doc in &documents {
        if let Some(doc_error) = &doc.error {
            warn!(
                "Extractor reported error for {} in session {}: {}",
                doc.source_file, session_id, doc_error
            );
            continue;
        }
        if currency.is_none() {
            currency = doc.currency().map(str::to_string);
        }
        if let Some(excel) = &doc.excel_file {
            if let Err(e) = files_db::insert_file(
                db_conn.clone(),
                &session_id,
                None,
                &excel.name,
                excel.size,
                &excel.mime,
                FileCategory::ConvertedStatement,
            )
            .await
            {
                warn!(
                    "Failed to store converted statement {} for session {}: {}",
                    excel.name, session_id, e
                );
            }
        }
        for record in &doc.transactions {
            rows.push((record.clone(), doc.source_file.clone()));
        }
    }
    let currency = currency.unwrap_or_else(|| "KZT".to_string());
    info!(
        "Extraction finished for session {}: {} transactions",
        session_id,
        rows.len()
    );

    // Classify: deterministic pass first
    let mut revenue: Vec<Transaction> = Vec::new();
    let mut non_revenue: Vec<Transaction> = Vec::new();
    let mut ambiguous: Vec<Transaction> = Vec::new();
    let mut auto_revenue = 0i64;

    for (index, (record, source_file)) in rows.iter().enumerate() {
        let normalized = normalize_record(record);
        let class = classify(&normalized);
        let mut tx = Transaction {
            internal_id: format!("{}_{}", session_id, index + 1),
            raw_amount: normalized.raw_amount,
            amount: normalized.amount,
            value_date: normalized.value_date,
            purpose: normalized.purpose,
            sender: normalized.sender,
            correspondent: normalized.correspondent,
            bin: normalized.bin,
            source_file: Some(source_file.clone()),
            classification_source: ClassificationSource::Heuristic,
            classification_reason: String::new(),
            possible_non_revenue: false,
        };
        match class {
            HeuristicClass::Revenue { reason } => {
                tx.classification_reason = reason;
                auto_revenue += 1;
                revenue.push(tx);
            }
            HeuristicClass::NonRevenue { reason } => {
                tx.classification_reason = reason;
                non_revenue.push(tx);
            }
            HeuristicClass::Ambiguous {
                reason,
                possible_non_revenue,
            } => {
                tx.classification_reason = reason;
                tx.possible_non_revenue = possible_non_revenue;
                ambiguous.push(tx);
            }
        }
    }

    // Review: only the ambiguous subset travels to the agent
    let total = rows.len() as i64;
    let agent_reviewed = ambiguous.len() as i64;
    let mut openai_status = OpenaiStatus::Skipped;
    let mut openai_response_id: Option<String> = None;
    let mut agent_decisions = 0i64;
    let mut unresolved = 0i64;

    if !ambiguous.is_empty() {
        let reviewer = reviewer
            .ok_or_else(|| anyhow!("{UPSTREAM_UNAVAILABLE}: LLM classifier is not configured"))?;

        let items: Vec<ReviewItem> = ambiguous
            .iter()
            .map(|tx| ReviewItem {
                id: tx.internal_id.clone(),
                date: tx.value_date.map(|d| d.date_naive().to_string()),
                amount: tx.amount,
                purpose: tx.purpose.clone(),
                sender: tx.sender.clone(),
                correspondent: tx.correspondent.clone(),
                bin: tx.bin.clone(),
                comment: submission.comment.clone(),
            })
            .collect();

        let outcome = reviewer
            .review(&session_id, &items)
            .await
            .map_err(|e| anyhow!("{UPSTREAM_UNAVAILABLE}: LLM classifier failed: {e}"))?;
        openai_response_id = outcome.response_id.clone();

        // Persist the response id before anything else can fail, so a later
        // crash still leaves enough for reconciliation
        if let Some(response_id) = &outcome.response_id {
            let early = ReportUpsert {
                openai_response_id: Some(response_id.clone()),
                ..Default::default()
            };
            if let Err(e) = sessions::upsert_report(db_conn.clone(), &session_id, &early).await {
                warn!(
                    "Failed to persist response id for session {}: {}",
                    session_id, e
                );
            }
        }

        let by_id: HashMap<&str, &shared_types::ReviewDecision> = outcome
            .decisions
            .iter()
            .map(|d| (d.id.as_str(), d))
            .collect();

        for mut tx in ambiguous.drain(..) {
            match by_id.get(tx.internal_id.as_str()) {
                Some(decision) => {
                    tx.classification_source = ClassificationSource::Agent;
                    tx.classification_reason = decision.reason.clone();
                    agent_decisions += 1;
                    if decision.is_revenue {
                        revenue.push(tx);
                    } else {
                        non_revenue.push(tx);
                    }
                }
                None => {
                    // Conservative default: no verdict means non-revenue
                    tx.classification_source = ClassificationSource::AgentMissing;
                    tx.classification_reason = "нет решения агента".to_string();
                    unresolved += 1;
                    non_revenue.push(tx);
                }
            }
        }

        openai_status = if unresolved == 0 {
            OpenaiStatus::Completed
        } else {
            OpenaiStatus::Partial
        };
    }

    // Aggregate
    sort_by_date(&mut revenue);
    sort_by_date(&mut non_revenue);
    let now = Utc::now();
    let (revenue_breakdown, revenue_delta) = build_breakdown(&revenue, &currency, now);
    let (non_revenue_breakdown, non_revenue_delta) = build_breakdown(&non_revenue, &currency, now);
    let trailing = trailing_twelve_months(&revenue, &currency);

    let report = RevenueReport {
        session_id: session_id.clone(),
        generated_at: now.timestamp(),
        currency: currency.clone(),
        totals: ReportTotals {
            revenue: revenue_breakdown.total.clone(),
            non_revenue: non_revenue_breakdown.total.clone(),
        },
        revenue: revenue_breakdown,
        non_revenue: non_revenue_breakdown,
        trailing_twelve_months_revenue: trailing,
        stats: ReportStats {
            total,
            auto_revenue,
            agent_reviewed,
            agent_decisions,
            unresolved,
            revenue_unattributed: revenue_delta,
            non_revenue_unattributed: non_revenue_delta,
        },
    };
    let report_text = render_report_text(&report);

    // Finalize: the one write whose failure is fatal for the session
    let payload = ReportUpsert {
        status: Some(SessionStatus::Completed),
        openai_status: Some(openai_status),
        openai_response_id,
        report_text: Some(report_text),
        report_structured: Some(serde_json::to_value(&report)?),
        completed_at: Some(now.timestamp()),
        ..Default::default()
    };
    sessions::upsert_report(db_conn, &session_id, &payload)
        .await
        .context("final report upsert failed")?;

    info!(
        "Analysis completed for session {}: revenue {}, non-revenue {}, openai status {}",
        session_id,
        report.totals.revenue.value,
        report.totals.non_revenue.value,
        openai_status.as_str()
    );
    Ok(())
}

async fn mark_failed(db_conn: AsyncDbConnection, session_id: &str, message: &str) {
    error!("Analysis failed for session {}: {}", session_id, message);
    let payload = ReportUpsert {
        status: Some(SessionStatus::Failed),
        report_text: Some(format!("ANALYSIS_FAILED: {message}")),
        completed_at: Some(Utc::now().timestamp()),
        ..Default::default()
    };
    if let Err(e) = sessions::upsert_report(db_conn, session_id, &payload).await {
        error!(
            "Failed to record failure for session {}: {}",
            session_id, e
        );
    }
}
