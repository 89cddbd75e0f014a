use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::SessionError;

pub type SessionData = Map<String, Value>;

/// Server-side storage for session entries, keyed by the id carried in the session cookie.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &str) -> Result<Option<SessionData>, SessionError>;

    async fn save(&self, id: &str, data: SessionData) -> Result<(), SessionError>;

    async fn destroy(&self, id: &str) -> Result<(), SessionError>;
}

struct StoredSession {
    data: SessionData,
    touched_at: DateTime<Utc>,
}

/// In-process session store. Sessions idle for longer than `max_idle` are dropped when loaded
/// and swept out on every save.
#[derive(Clone)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, StoredSession>>>,
    max_idle: Duration,
}

impl MemorySessionStore {
    pub fn new(max_idle: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            max_idle,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(Duration::hours(24))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &str) -> Result<Option<SessionData>, SessionError> {
        // Fast path: read lock
        {
            let sessions = self.sessions.read().await;
            match sessions.get(id) {
                None => return Ok(None),
                Some(stored) if Utc::now() - stored.touched_at <= self.max_idle => {
                    return Ok(Some(stored.data.clone()));
                }
                Some(_) => {}
            }
        }

        let mut sessions = self.sessions.write().await;
        sessions.remove(id);
        tracing::debug!("Dropped idle session {}", id);
        Ok(None)
    }

    async fn save(&self, id: &str, data: SessionData) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;

        let now = Utc::now();
        let before = sessions.len();
        sessions.retain(|_, stored| now - stored.touched_at <= self.max_idle);
        if sessions.len() < before {
            tracing::debug!("Swept {} idle session(s)", before - sessions.len());
        }

        sessions.insert(
            id.to_string(),
            StoredSession {
                data,
                touched_at: now,
            },
        );
        Ok(())
    }

    async fn destroy(&self, id: &str) -> Result<(), SessionError> {
        self.sessions.write().await.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_save_load_destroy() {
        let store = MemorySessionStore::default();
        let mut data = SessionData::new();
        data.insert("mfaid".to_string(), json!(3));

        store.save("abc", data.clone()).await.unwrap();
        assert_eq!(store.load("abc").await.unwrap(), Some(data));

        store.destroy("abc").await.unwrap();
        assert_eq!(store.load("abc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_idle_sessions_expire() {
        let store = MemorySessionStore::new(Duration::seconds(-1));
        store.save("abc", SessionData::new()).await.unwrap();
        assert_eq!(store.load("abc").await.unwrap(), None);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_save_sweeps_idle_sessions() {
        let store = MemorySessionStore::new(Duration::seconds(-1));
        for id in ["a", "b", "c"] {
            store.save(id, SessionData::new()).await.unwrap();
        }
        assert_eq!(store.len().await, 1);
    }
}
