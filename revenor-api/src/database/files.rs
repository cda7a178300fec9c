use crate::database::AsyncDbConnection;
use anyhow::Result;
use rusqlite::params;
use shared_types::{FileCategory, StoredFile};

pub async fn insert_file(
    conn: AsyncDbConnection,
    session_id: &str,
    external_file_id: Option<&str>,
    original_name: &str,
    size: i64,
    mime_type: &str,
    category: FileCategory,
) -> Result<i64> {
    let conn = conn.lock().await;
    let now = chrono::Utc::now().timestamp();

    conn.execute(
        "INSERT INTO files (session_id, external_file_id, original_name, size, mime_type, category, uploaded_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            session_id,
            external_file_id,
            original_name,
            size,
            mime_type,
            category.as_str(),
            now,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

pub async fn list_files(conn: AsyncDbConnection, session_id: &str) -> Result<Vec<StoredFile>> {
    let conn = conn.lock().await;

    let mut stmt = conn.prepare(
        "SELECT id, session_id, external_file_id, original_name, size, mime_type, category, uploaded_at
         FROM files
         WHERE session_id = ?1
         ORDER BY id ASC",
    )?;

    let files = stmt
        .query_map([session_id], |row| {
            let category_text: String = row.get(6)?;
            Ok(StoredFile {
                id: row.get(0)?,
                session_id: row.get(1)?,
                external_file_id: row.get(2)?,
                original_name: row.get(3)?,
                size: row.get(4)?,
                mime_type: row.get(5)?,
                category: FileCategory::parse(&category_text)
                    .unwrap_or(FileCategory::Uncategorized),
                uploaded_at: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(files)
}
