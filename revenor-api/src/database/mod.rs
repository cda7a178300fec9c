pub mod files;
pub mod messages;
pub mod migrations;
pub mod sessions;

use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

pub type AsyncDbConnection = Arc<Mutex<Connection>>;

pub struct Database {
    pub async_connection: AsyncDbConnection,
}

impl Database {
    /// Open the database file and run migrations
    pub fn new(db_path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        migrations::run_migrations(&conn)?;

        Ok(Self {
            async_connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Fresh in-memory database, used by tests
    pub fn in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::run_migrations(&conn)?;
        Ok(Self {
            async_connection: Arc::new(Mutex::new(conn)),
        })
    }
}
