use crate::database::AsyncDbConnection;
use anyhow::Result;
use rusqlite::params;
use shared_types::{MessageRole, SessionMessage};

/// Append a message, allocating the next dense message_order for the
/// session. The single-writer connection lock makes the allocation atomic.
pub async fn append_message(
    conn: AsyncDbConnection,
    session_id: &str,
    role: MessageRole,
    content: &serde_json::Value,
) -> Result<i64> {
    let conn = conn.lock().await;
    let now = chrono::Utc::now().timestamp();

    conn.execute(
        "INSERT INTO messages (session_id, role, content, message_order, created_at)
         VALUES (?1, ?2, ?3,
            (SELECT COALESCE(MAX(message_order), 0) + 1 FROM messages WHERE session_id = ?1),
            ?4)",
        params![session_id, role.as_str(), content.to_string(), now],
    )?;

    Ok(conn.last_insert_rowid())
}

pub async fn get_messages(
    conn: AsyncDbConnection,
    session_id: &str,
) -> Result<Vec<SessionMessage>> {
    let conn = conn.lock().await;

    let mut stmt = conn.prepare(
        "SELECT id, session_id, role, content, message_order, created_at
         FROM messages
         WHERE session_id = ?1
         ORDER BY message_order ASC",
    )?;

    let messages = stmt
        .query_map([session_id], |row| {
            let role_text: String = row.get(2)?;
            let content_text: String = row.get(3)?;
            Ok(SessionMessage {
                id: row.get(0)?,
                session_id: row.get(1)?,
                role: MessageRole::parse(&role_text).unwrap_or(MessageRole::Assistant),
                content: serde_json::from_str(&content_text)
                    .unwrap_or(serde_json::Value::String(content_text)),
                message_order: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(messages)
}
