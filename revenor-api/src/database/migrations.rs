use rusqlite::Connection;

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS sessions (
            session_id TEXT PRIMARY KEY,
            comment TEXT,
            metadata TEXT,
            status TEXT NOT NULL DEFAULT 'generating' CHECK (status IN ('generating', 'completed', 'failed')),
            openai_status TEXT CHECK (openai_status IN ('skipped', 'completed', 'partial', 'failed')),
            openai_response_id TEXT,
            files_count BIGINT NOT NULL DEFAULT 0,
            files_data TEXT,
            report_text TEXT,
            report_structured TEXT,
            created_at BIGINT NOT NULL,
            completed_at BIGINT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS files (
            id INTEGER PRIMARY KEY,
            session_id TEXT NOT NULL,
            external_file_id TEXT,
            original_name TEXT NOT NULL,
            size BIGINT NOT NULL,
            mime_type TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT 'uncategorized',
            uploaded_at BIGINT NOT NULL,
            FOREIGN KEY (session_id) REFERENCES sessions (session_id) ON DELETE CASCADE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY,
            session_id TEXT NOT NULL,
            role TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
            content TEXT NOT NULL,
            message_order BIGINT NOT NULL,
            created_at BIGINT NOT NULL,
            UNIQUE (session_id, message_order),
            FOREIGN KEY (session_id) REFERENCES sessions (session_id) ON DELETE CASCADE
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_files_session ON files(session_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sessions_created ON sessions(created_at)",
        [],
    )?;

    // Auxiliary analyses arrived later; additive columns only, old
    // deployments must keep working
    add_column_if_missing(conn, "sessions", "tax_report", "TEXT")?;
    add_column_if_missing(conn, "sessions", "financial_report", "TEXT")?;

    Ok(())
}

fn add_column_if_missing(
    conn: &Connection,
    table: &str,
    column: &str,
    ddl_type: &str,
) -> anyhow::Result<()> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let existing: Vec<String> = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<_, _>>()?;

    if !existing.iter().any(|c| c == column) {
        conn.execute(
            &format!("ALTER TABLE {table} ADD COLUMN {column} {ddl_type}"),
            [],
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let mut stmt = conn.prepare("PRAGMA table_info(sessions)").unwrap();
        let columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert!(columns.contains(&"tax_report".to_string()));
        assert!(columns.contains(&"financial_report".to_string()));
        assert_eq!(columns.iter().filter(|c| *c == "tax_report").count(), 1);
    }
}
