//! End-to-end pipeline scenarios driven through the analysis manager with
//! stubbed external collaborators.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use revenor_agents::review::agent::TransactionReviewer;
use revenor_agents::review::types::ReviewOutcome;
use revenor_api::database::{sessions as sessions_db, Database};
use revenor_api::error::ApiError;
use revenor_api::integrations::pdf_extractor::{PdfPayload, StatementExtractor};
use revenor_api::jobs::analysis_manager::{AnalysisManager, Submission, SubmittedFile};
use revenor_api::jobs::registry::SessionRegistry;
use serde_json::json;
use shared_types::{
    AnalysisSession, ExtractorDocument, OpenaiStatus, RawRecord, ReviewDecision, ReviewItem,
    SessionStatus,
};
use std::sync::Arc;
use std::time::Duration;

struct StubExtractor {
    documents: Vec<ExtractorDocument>,
    delay: Duration,
}

#[async_trait]
impl StatementExtractor for StubExtractor {
    async fn extract(&self, _files: &[PdfPayload]) -> Result<Vec<ExtractorDocument>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.documents.clone())
    }
}

struct StubReviewer {
    decisions: Vec<ReviewDecision>,
    fail: bool,
}

#[async_trait]
impl TransactionReviewer for StubReviewer {
    async fn review(&self, _session_id: &str, _items: &[ReviewItem]) -> Result<ReviewOutcome> {
        if self.fail {
            return Err(anyhow!("connection reset by peer"));
        }
        Ok(ReviewOutcome {
            decisions: self.decisions.clone(),
            response_id: Some("resp_test".to_string()),
            raw_reply: String::new(),
        })
    }
}

fn record(pairs: &[(&str, &str)]) -> RawRecord {
    let mut map = RawRecord::new();
    for (k, v) in pairs {
        map.insert(k.to_string(), json!(v));
    }
    map
}

fn document(source_file: &str, rows: Vec<RawRecord>) -> ExtractorDocument {
    ExtractorDocument {
        source_file: source_file.to_string(),
        metadata: json!({"currency": "KZT"}),
        transactions: rows,
        excel_file: None,
        error: None,
    }
}

fn pdf(name: &str) -> SubmittedFile {
    SubmittedFile {
        name: name.to_string(),
        mime: "application/pdf".to_string(),
        bytes: b"%PDF-1.4".to_vec(),
    }
}

fn manager_with(
    db: &Database,
    documents: Vec<ExtractorDocument>,
    reviewer: Option<StubReviewer>,
) -> AnalysisManager {
    manager_with_delay(db, documents, reviewer, Duration::ZERO)
}

fn manager_with_delay(
    db: &Database,
    documents: Vec<ExtractorDocument>,
    reviewer: Option<StubReviewer>,
    delay: Duration,
) -> AnalysisManager {
    AnalysisManager::new(
        db.async_connection.clone(),
        Arc::new(SessionRegistry::new()),
        Arc::new(StubExtractor { documents, delay }),
        reviewer.map(|r| Arc::new(r) as Arc<dyn TransactionReviewer>),
        None,
    )
}

async fn wait_terminal(db: &Database, session_id: &str) -> AnalysisSession {
    for _ in 0..200 {
        let session = sessions_db::get_by_session(db.async_connection.clone(), session_id)
            .await
            .unwrap()
            .expect("session row must exist");
        if session.status.is_terminal() {
            return session;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session {session_id} never reached a terminal status");
}

fn structured(session: &AnalysisSession) -> serde_json::Value {
    session
        .report_structured
        .clone()
        .expect("completed session must carry a structured report")
}

#[tokio::test]
async fn two_pdfs_with_terminal_deposit() {
    let db = Database::in_memory().unwrap();
    let docs = vec![
        document(
            "stmt-A.pdf",
            vec![
                record(&[
                    ("Дата", "2024-03-04"),
                    ("Кредит", "500 000"),
                    ("Назначение платежа", "Оплата по СФ №12"),
                ]),
                record(&[
                    ("Дата", "2024-03-15"),
                    ("Кредит", "1 200 000"),
                    ("Назначение платежа", "Оплата за услуги"),
                ]),
                record(&[
                    ("Дата", "2024-04-02"),
                    ("Кредит", "50 000"),
                    ("Назначение платежа", "Cash In Терминал ID 42"),
                ]),
            ],
        ),
        document(
            "stmt-B.pdf",
            vec![record(&[
                ("Дата", "2024-04-18"),
                ("Кредит", "750 000"),
                ("Назначение платежа", "Оплата по договору"),
            ])],
        ),
    ];
    let manager = manager_with(&db, docs, None);

    let session_id = manager
        .start_analysis(Submission {
            session_id: Some("scenario1".to_string()),
            comment: None,
            metadata: None,
            files: vec![pdf("stmt-A.pdf"), pdf("stmt-B.pdf")],
        })
        .await
        .unwrap();

    let session = wait_terminal(&db, &session_id).await;
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.openai_status, Some(OpenaiStatus::Skipped));
    assert_eq!(session.files_count, 2);

    let report = structured(&session);
    assert_eq!(report["totals"]["revenue"]["value"], json!(2450000.0));
    assert_eq!(report["totals"]["nonRevenue"]["value"], json!(50000.0));
    assert_eq!(report["stats"]["autoRevenue"], json!(3));
    assert_eq!(report["stats"]["agentReviewed"], json!(0));

    let months = &report["revenue"]["years"][0]["months"];
    assert_eq!(months[0]["value"], json!(1700000.0));
    assert_eq!(months[1]["value"], json!(750000.0));

    assert!(session.report_text.unwrap().contains("Выручка"));
}

#[tokio::test]
async fn ambiguous_topup_resolved_by_agent() {
    let db = Database::in_memory().unwrap();
    let docs = vec![document(
        "stmt.pdf",
        vec![record(&[
            ("Дата", "2024-05-10"),
            ("Кредит", "300 000"),
            ("Назначение платежа", "Пополнение счета от ИП Ахметов"),
        ])],
    )];
    let reviewer = StubReviewer {
        decisions: vec![ReviewDecision {
            id: "scenario2_1".to_string(),
            is_revenue: true,
            reason: "оплата от клиента".to_string(),
        }],
        fail: false,
    };
    let manager = manager_with(&db, docs, Some(reviewer));

    let session_id = manager
        .start_analysis(Submission {
            session_id: Some("scenario2".to_string()),
            comment: None,
            metadata: None,
            files: vec![pdf("stmt.pdf")],
        })
        .await
        .unwrap();

    let session = wait_terminal(&db, &session_id).await;
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.openai_status, Some(OpenaiStatus::Completed));
    assert_eq!(session.openai_response_id.as_deref(), Some("resp_test"));

    let report = structured(&session);
    assert_eq!(report["totals"]["revenue"]["value"], json!(300000.0));
    assert_eq!(report["stats"]["agentDecisions"], json!(1));
    assert_eq!(report["stats"]["agentReviewed"], json!(1));
    assert_eq!(report["stats"]["unresolved"], json!(0));
}

#[tokio::test]
async fn agent_silent_on_some_items() {
    let db = Database::in_memory().unwrap();
    let rows = (1..=4)
        .map(|i| {
            record(&[
                ("Дата", "2024-05-10"),
                ("Кредит", "100 000"),
                ("Назначение платежа", "Пополнение счета"),
                ("Отправитель", &format!("ИП №{i}")[..],),
            ])
        })
        .collect();
    let reviewer = StubReviewer {
        decisions: vec![
            ReviewDecision {
                id: "scenario3_1".to_string(),
                is_revenue: true,
                reason: "выручка".to_string(),
            },
            ReviewDecision {
                id: "scenario3_2".to_string(),
                is_revenue: false,
                reason: "возврат".to_string(),
            },
        ],
        fail: false,
    };
    let manager = manager_with(&db, vec![document("stmt.pdf", rows)], Some(reviewer));

    let session_id = manager
        .start_analysis(Submission {
            session_id: Some("scenario3".to_string()),
            comment: None,
            metadata: None,
            files: vec![pdf("stmt.pdf")],
        })
        .await
        .unwrap();

    let session = wait_terminal(&db, &session_id).await;
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.openai_status, Some(OpenaiStatus::Partial));

    let report = structured(&session);
    // one agent-approved revenue; one agent non-revenue + two agent-missing
    assert_eq!(report["totals"]["revenue"]["value"], json!(100000.0));
    assert_eq!(report["totals"]["nonRevenue"]["value"], json!(300000.0));
    assert_eq!(report["stats"]["agentDecisions"], json!(2));
    assert_eq!(report["stats"]["unresolved"], json!(2));
}

#[tokio::test]
async fn duplicate_submission_conflicts_until_completion() {
    let db = Database::in_memory().unwrap();
    let docs = vec![document("stmt.pdf", Vec::new())];
    let manager = manager_with_delay(&db, docs, None, Duration::from_millis(300));

    let submission = || Submission {
        session_id: Some("scenario4".to_string()),
        comment: None,
        metadata: None,
        files: vec![pdf("stmt.pdf")],
    };

    let first = manager.start_analysis(submission()).await;
    assert!(first.is_ok());

    let second = manager.start_analysis(submission()).await;
    match second {
        Err(ApiError::AnalysisInProgress(id)) => assert_eq!(id, "scenario4"),
        other => panic!("expected conflict, got {other:?}"),
    }

    wait_terminal(&db, "scenario4").await;

    let third = manager.start_analysis(submission()).await;
    assert!(third.is_ok());
    wait_terminal(&db, "scenario4").await;
}

#[tokio::test]
async fn extractor_error_on_one_of_two_files() {
    let db = Database::in_memory().unwrap();
    let rows = (1..=5)
        .map(|i| {
            record(&[
                ("Дата", "2024-03-04"),
                ("Кредит", "100 000"),
                ("Назначение платежа", &format!("Оплата по счету {i}")[..],),
            ])
        })
        .collect();
    let docs = vec![
        document("stmt-A.pdf", rows),
        ExtractorDocument::failed("stmt-B.pdf", "Adobe limit"),
    ];
    let manager = manager_with(&db, docs, None);

    let session_id = manager
        .start_analysis(Submission {
            session_id: Some("scenario5".to_string()),
            comment: None,
            metadata: None,
            files: vec![pdf("stmt-A.pdf"), pdf("stmt-B.pdf")],
        })
        .await
        .unwrap();

    let session = wait_terminal(&db, &session_id).await;
    assert_eq!(session.status, SessionStatus::Completed);

    let report = structured(&session);
    assert_eq!(report["stats"]["total"], json!(5));
    assert_eq!(report["totals"]["revenue"]["value"], json!(500000.0));
}

#[tokio::test]
async fn future_dated_transaction_in_totals_only() {
    let db = Database::in_memory().unwrap();
    let docs = vec![document(
        "stmt.pdf",
        vec![
            record(&[
                ("Дата", "2099-01-01"),
                ("Кредит", "1 000 000"),
                ("Назначение платежа", "Оплата"),
            ]),
            record(&[
                ("Дата", "2024-03-04"),
                ("Кредит", "200 000"),
                ("Назначение платежа", "Оплата по договору"),
            ]),
        ],
    )];
    let manager = manager_with(&db, docs, None);

    let session_id = manager
        .start_analysis(Submission {
            session_id: Some("scenario6".to_string()),
            comment: None,
            metadata: None,
            files: vec![pdf("stmt.pdf")],
        })
        .await
        .unwrap();

    let session = wait_terminal(&db, &session_id).await;
    let report = structured(&session);

    assert_eq!(report["totals"]["revenue"]["value"], json!(1200000.0));
    assert_eq!(report["stats"]["revenueUnattributed"], json!(1000000.0));
    // only March 2024 appears in the monthly table
    let years = report["revenue"]["years"].as_array().unwrap();
    assert_eq!(years.len(), 1);
    assert_eq!(years[0]["year"], json!(2024));
}

#[tokio::test]
async fn llm_failure_without_decisions_fails_session() {
    let db = Database::in_memory().unwrap();
    let docs = vec![document(
        "stmt.pdf",
        vec![record(&[
            ("Дата", "2024-05-10"),
            ("Кредит", "300 000"),
            ("Назначение платежа", "Пополнение счета"),
        ])],
    )];
    let reviewer = StubReviewer {
        decisions: Vec::new(),
        fail: true,
    };
    let manager = manager_with(&db, docs, Some(reviewer));

    let session_id = manager
        .start_analysis(Submission {
            session_id: Some("llm-down".to_string()),
            comment: None,
            metadata: None,
            files: vec![pdf("stmt.pdf")],
        })
        .await
        .unwrap();

    let session = wait_terminal(&db, &session_id).await;
    assert_eq!(session.status, SessionStatus::Failed);
    let text = session.report_text.unwrap();
    assert!(text.contains("UPSTREAM_UNAVAILABLE"));
    assert!(text.contains("connection reset"));
}

#[tokio::test]
async fn empty_extraction_completes_with_skipped_review() {
    let db = Database::in_memory().unwrap();
    let manager = manager_with(&db, vec![document("stmt.pdf", Vec::new())], None);

    let session_id = manager
        .start_analysis(Submission {
            session_id: None,
            comment: Some("пустая выписка".to_string()),
            metadata: Some(json!({"branch": "almaty"})),
            files: vec![pdf("stmt.pdf")],
        })
        .await
        .unwrap();

    let session = wait_terminal(&db, &session_id).await;
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.openai_status, Some(OpenaiStatus::Skipped));
    assert_eq!(session.comment.as_deref(), Some("пустая выписка"));

    let report = structured(&session);
    assert_eq!(report["totals"]["revenue"]["value"], json!(0.0));
    assert_eq!(report["stats"]["total"], json!(0));
}
