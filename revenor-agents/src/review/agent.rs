use crate::llm::client::OpenAiClient;
use crate::review::system_prompt;
use crate::review::types::{parse_decisions, ReviewOutcome};
use anyhow::Result;
use async_trait::async_trait;
use shared_types::{MessageRole, ReviewItem};
use std::sync::Arc;
use tracing::info;

/// Where the agent persists its conversation; implemented by the API's
/// message store
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn append_message(
        &self,
        session_id: &str,
        role: MessageRole,
        content: serde_json::Value,
    ) -> Result<()>;
}

/// Resolves ambiguous transactions; the orchestrator only sees this trait
#[async_trait]
pub trait TransactionReviewer: Send + Sync {
    async fn review(&self, session_id: &str, items: &[ReviewItem]) -> Result<ReviewOutcome>;
}

pub struct ReviewAgent {
    client: Arc<OpenAiClient>,
    sink: Arc<dyn MessageSink>,
}

impl ReviewAgent {
    pub fn new(client: Arc<OpenAiClient>, sink: Arc<dyn MessageSink>) -> Self {
        Self { client, sink }
    }
}

#[async_trait]
impl TransactionReviewer for ReviewAgent {
    /// One completion per batch. The outgoing prompt and the assistant reply
    /// are persisted in causal order; decisions the model omitted stay
    /// unresolved, there are no semantic retries here.
    async fn review(&self, session_id: &str, items: &[ReviewItem]) -> Result<ReviewOutcome> {
        let system = system_prompt::build_system_prompt();
        let user = system_prompt::build_user_prompt(items);

        self.sink
            .append_message(
                session_id,
                MessageRole::User,
                serde_json::Value::String(user.clone()),
            )
            .await?;

        let completion = self.client.complete_json(&system, &user).await?;

        self.sink
            .append_message(
                session_id,
                MessageRole::Assistant,
                serde_json::Value::String(completion.content.clone()),
            )
            .await?;

        let decisions = parse_decisions(&completion.content);
        info!(
            session_id,
            sent = items.len(),
            resolved = decisions.len(),
            "review round finished"
        );

        Ok(ReviewOutcome {
            decisions,
            response_id: Some(completion.response_id),
            raw_reply: completion.content,
        })
    }
}
