use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::ApiClientError;
use crate::modules::{ModuleRecord, ModuleStatus};
use crate::types::ObjectId;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModuleFilter {
    /// Restrict to these ids; all modules when `None`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moduleids: Option<Vec<ObjectId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sortfield: Option<&'static str>,
}

impl ModuleFilter {
    pub fn ids(moduleids: Vec<ObjectId>) -> Self {
        Self {
            moduleids: Some(moduleids),
            sortfield: None,
        }
    }

    pub fn all_by_path() -> Self {
        Self {
            moduleids: None,
            sortfield: Some("relative_path"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModuleStatusUpdate {
    #[serde(with = "crate::types::id_string")]
    pub moduleid: ObjectId,
    pub status: ModuleStatus,
}

/// Persisted module registry.
#[async_trait]
pub trait ModuleApi: Send + Sync {
    async fn get(&self, auth: &str, filter: &ModuleFilter) -> Result<Vec<ModuleRecord>, ApiClientError>;

    /// Applies every update or none of them.
    async fn update(&self, auth: &str, updates: &[ModuleStatusUpdate]) -> Result<bool, ApiClientError>;
}

#[derive(Clone, Default)]
pub struct MemoryModuleApi {
    modules: Arc<RwLock<BTreeMap<ObjectId, ModuleRecord>>>,
    updates: Arc<AtomicUsize>,
}

impl MemoryModuleApi {
    pub fn new(records: impl IntoIterator<Item = ModuleRecord>) -> Self {
        let modules = records.into_iter().map(|r| (r.moduleid, r)).collect();
        Self {
            modules: Arc::new(RwLock::new(modules)),
            updates: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn snapshot(&self) -> Vec<ModuleRecord> {
        self.modules.read().await.values().cloned().collect()
    }

    pub async fn status_of(&self, moduleid: ObjectId) -> Option<ModuleStatus> {
        self.modules.read().await.get(&moduleid).map(|m| m.status)
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ModuleApi for MemoryModuleApi {
    async fn get(&self, _auth: &str, filter: &ModuleFilter) -> Result<Vec<ModuleRecord>, ApiClientError> {
        let modules = self.modules.read().await;
        let mut found: Vec<ModuleRecord> = match &filter.moduleids {
            Some(ids) => modules.values().filter(|m| ids.contains(&m.moduleid)).cloned().collect(),
            None => modules.values().cloned().collect(),
        };

        if filter.sortfield == Some("relative_path") {
            found.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        }

        Ok(found)
    }

    async fn update(&self, _auth: &str, updates: &[ModuleStatusUpdate]) -> Result<bool, ApiClientError> {
        let mut modules = self.modules.write().await;

        if let Some(missing) = updates.iter().find(|u| !modules.contains_key(&u.moduleid)) {
            return Err(ApiClientError::application(format!("Module with ID \"{}\" is not available.", missing.moduleid)));
        }

        for update in updates {
            if let Some(module) = modules.get_mut(&update.moduleid) {
                module.status = update.status;
            }
        }

        self.updates.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }
}
