//! Frontend modules: registry records, manifests and conflict detection.

pub mod loader;
pub mod manager;
pub mod manifest;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{NumberOrString, ObjectId};

pub use loader::{scan_modules, FsManifestLoader, ManifestLoader, MemoryManifestLoader};
pub use manager::{ModuleConflicts, ModuleManager};
pub use manifest::{Manifest, ManifestAction, ManifestError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "NumberOrString")]
pub enum ModuleStatus {
    Disabled = 0,
    Enabled = 1,
}

impl From<ModuleStatus> for u8 {
    fn from(status: ModuleStatus) -> u8 {
        status as u8
    }
}

impl TryFrom<NumberOrString> for ModuleStatus {
    type Error = String;

    fn try_from(value: NumberOrString) -> Result<Self, Self::Error> {
        match value.as_u64() {
            Some(0) => Ok(ModuleStatus::Disabled),
            Some(1) => Ok(ModuleStatus::Enabled),
            _ => Err(format!("unknown module status {:?}", value)),
        }
    }
}

/// Persisted registry entry of one module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleRecord {
    #[serde(with = "crate::types::id_string")]
    pub moduleid: ObjectId,
    pub id: String,
    pub relative_path: String,
    pub status: ModuleStatus,
    #[serde(default)]
    pub config: Value,
}
