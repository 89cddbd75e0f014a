use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

use super::manifest::Manifest;

pub const MANIFEST_FILE: &str = "manifest.json";

/// Source of module manifests, addressed by the module's path relative to the modules directory.
#[async_trait]
pub trait ManifestLoader: Send + Sync {
    /// `None` when the manifest is missing or invalid.
    async fn load(&self, relative_path: &str) -> Option<Manifest>;
}

pub struct FsManifestLoader {
    root: PathBuf,
}

impl FsManifestLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Only plain sub-directory names are accepted as module paths.
fn is_safe_relative(path: &str) -> bool {
    let path = Path::new(path);
    !path.as_os_str().is_empty() && path.components().all(|c| matches!(c, Component::Normal(_)))
}

#[async_trait]
impl ManifestLoader for FsManifestLoader {
    async fn load(&self, relative_path: &str) -> Option<Manifest> {
        if !is_safe_relative(relative_path) {
            warn!("Refusing module path outside the modules directory: {}", relative_path);
            return None;
        }

        let path = self.root.join(relative_path).join(MANIFEST_FILE);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Cannot read {}: {}", path.display(), e);
                return None;
            }
        };

        match Manifest::parse(&text) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                warn!("Invalid manifest {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Manifests held in memory, used by tests and by deployments without a modules directory.
#[derive(Clone, Default)]
pub struct MemoryManifestLoader {
    manifests: Arc<RwLock<HashMap<String, Manifest>>>,
}

impl MemoryManifestLoader {
    pub async fn insert(&self, relative_path: impl Into<String>, manifest: Manifest) {
        self.manifests.write().await.insert(relative_path.into(), manifest);
    }
}

#[async_trait]
impl ManifestLoader for MemoryManifestLoader {
    async fn load(&self, relative_path: &str) -> Option<Manifest> {
        self.manifests.read().await.get(relative_path).cloned()
    }
}

/// Sub-directories of `root` that contain a manifest file, sorted by name.
pub async fn scan_modules(root: &Path) -> std::io::Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(root).await?;
    let mut found = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        if tokio::fs::metadata(entry.path().join(MANIFEST_FILE)).await.is_err() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            found.push(name.to_string());
        }
    }

    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_module(root: &Path, dir: &str, manifest: &str) {
        std::fs::create_dir_all(root.join(dir)).unwrap();
        std::fs::write(root.join(dir).join(MANIFEST_FILE), manifest).unwrap();
    }

    const VALID: &str = r#"{"manifest_version": 2.0, "id": "clock", "name": "Clock", "namespace": "Clock", "version": "1.0"}"#;

    #[tokio::test]
    async fn test_fs_loader_reads_valid_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_module(root, "clock", VALID);
        write_module(root, "broken", "{not json");

        let loader = FsManifestLoader::new(root);
        assert_eq!(loader.load("clock").await.map(|m| m.name), Some("Clock".to_string()));
        assert!(loader.load("broken").await.is_none());
        assert!(loader.load("missing").await.is_none());
        assert!(loader.load("../clock").await.is_none());
    }

    #[tokio::test]
    async fn test_scan_lists_module_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_module(root, "zeta", VALID);
        write_module(root, "alpha", VALID);
        std::fs::create_dir_all(root.join("empty")).unwrap();
        std::fs::write(root.join("README"), "modules").unwrap();

        assert_eq!(scan_modules(root).await.unwrap(), vec!["alpha", "zeta"]);
    }
}
