use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

/// One uploaded report. Write-once: the text is never mutated after
/// creation and sessions are only dropped on process restart.
#[derive(Debug, Clone)]
pub struct Session {
    pub report_text: String,
    pub created_at: DateTime<Utc>,
}

/// In-memory store of uploaded reports keyed by an opaque session id.
///
/// Owned by `AppState` and injected into the orchestrator so tests can
/// construct their own instance. Insertion happens as a single map write
/// under the lock, so a reader either sees the full session or nothing.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Stores the report text and returns a fresh session id. UUID v4 ids
    /// are collision-resistant under concurrent creation, so no
    /// coordination beyond the map lock is needed.
    pub async fn create(&self, report_text: String) -> String {
        let session_id = Uuid::new_v4().to_string();
        let session = Session {
            report_text,
            created_at: Utc::now(),
        };

        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id.clone(), session);

        session_id
    }

    /// Returns the report text for a session, or `None` when the id is
    /// unknown. Callers map the miss to their own not-found error.
    pub async fn get(&self, session_id: &str) -> Option<String> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).map(|s| s.report_text.clone())
    }

    /// Number of live sessions, reported by the health endpoint.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_get_round_trip() {
        let store = SessionStore::new();
        let id = store.create("Completed feature X.".to_string()).await;
        let text = store.get(&id).await;
        assert_eq!(text.as_deref(), Some("Completed feature X."));
    }

    #[tokio::test]
    async fn test_get_unknown_id() {
        let store = SessionStore::new();
        store.create("some report".to_string()).await;
        assert!(store.get("not-a-real-session").await.is_none());
    }

    #[tokio::test]
    async fn test_empty_report_is_valid() {
        let store = SessionStore::new();
        let id = store.create(String::new()).await;
        assert_eq!(store.get(&id).await.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let store = SessionStore::new();
        let a = store.create("report a".to_string()).await;
        let b = store.create("report a".to_string()).await;
        assert_ne!(a, b);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_concurrent_creates_all_visible() {
        use std::sync::Arc;

        let store = Arc::new(SessionStore::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.create(format!("report {i}")).await
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }

        assert_eq!(store.len().await, 16);
        for id in &ids {
            assert!(store.get(id).await.is_some());
        }
    }
}
