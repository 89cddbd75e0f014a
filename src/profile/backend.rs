use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{ProfileEntries, ProfileError, ProfileWrite};
use crate::types::ObjectId;

/// Persistent storage for profiles. `commit` applies every write or none of them.
#[async_trait]
pub trait ProfileBackend: Send + Sync {
    async fn load(&self, userid: ObjectId) -> Result<ProfileEntries, ProfileError>;

    async fn commit(&self, userid: ObjectId, writes: &[ProfileWrite]) -> Result<(), ProfileError>;
}

#[derive(Clone, Default)]
pub struct MemoryProfileBackend {
    profiles: Arc<RwLock<HashMap<ObjectId, ProfileEntries>>>,
    commits: Arc<AtomicUsize>,
}

impl MemoryProfileBackend {
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ProfileBackend for MemoryProfileBackend {
    async fn load(&self, userid: ObjectId) -> Result<ProfileEntries, ProfileError> {
        Ok(self.profiles.read().await.get(&userid).cloned().unwrap_or_default())
    }

    async fn commit(&self, userid: ObjectId, writes: &[ProfileWrite]) -> Result<(), ProfileError> {
        for write in writes {
            write.check()?;
        }

        // Single lock for the whole batch so readers never see half of it
        let mut profiles = self.profiles.write().await;
        let entries = profiles.entry(userid).or_default();
        for write in writes {
            match write {
                ProfileWrite::Set(key, value) => {
                    entries.insert(key.clone(), value.clone());
                }
                ProfileWrite::Delete(key) => {
                    entries.remove(key);
                }
            }
        }

        self.commits.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
