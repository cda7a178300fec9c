use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Author of a persisted conversational entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(MessageRole::User),
            "assistant" => Some(MessageRole::Assistant),
            _ => None,
        }
    }
}

/// Durable conversational entry within a session (prompt or LLM reply)
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct SessionMessage {
    pub id: i64,
    pub session_id: String,
    pub role: MessageRole,
    pub content: serde_json::Value,
    /// Dense 1..N, unique per session
    pub message_order: i64,
    pub created_at: i64,
}

/// Messages of one session ordered by message_order
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct MessageListResponse {
    pub messages: Vec<SessionMessage>,
}
