use std::collections::HashSet;
use tokio::sync::Mutex;

/// Process-wide set of sessions with a live background task. Claims are
/// released on every exit path of the task, including panics.
pub struct SessionRegistry {
    running: Mutex<HashSet<String>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            running: Mutex::new(HashSet::new()),
        }
    }

    /// Returns false when the session already has a running task
    pub async fn claim(&self, session_id: &str) -> bool {
        self.running.lock().await.insert(session_id.to_string())
    }

    pub async fn release(&self, session_id: &str) {
        self.running.lock().await.remove(session_id);
    }

    pub async fn is_running(&self, session_id: &str) -> bool {
        self.running.lock().await.contains(session_id)
    }

    pub async fn snapshot(&self) -> Vec<String> {
        self.running.lock().await.iter().cloned().collect()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
