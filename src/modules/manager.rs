use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::loader::ManifestLoader;
use super::manifest::Manifest;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleConflicts {
    /// One human-readable message per conflict
    pub conflicts: Vec<String>,
    /// Every module path involved in at least one conflict
    pub conflicting_paths: BTreeSet<String>,
}

impl ModuleConflicts {
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// A set of loaded module manifests, checked together for conflicts.
pub struct ModuleManager {
    loader: Arc<dyn ManifestLoader>,
    manifests: Vec<(String, Manifest)>,
}

impl ModuleManager {
    pub fn new(loader: Arc<dyn ManifestLoader>) -> Self {
        Self {
            loader,
            manifests: Vec::new(),
        }
    }

    /// Load the module at `relative_path`. Returns its manifest if it could be loaded.
    pub async fn add_module(&mut self, relative_path: &str) -> Option<Manifest> {
        let manifest = self.loader.load(relative_path).await?;
        self.manifests.push((relative_path.to_string(), manifest.clone()));
        Some(manifest)
    }

    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }

    pub fn manifests(&self) -> impl Iterator<Item = (&str, &Manifest)> {
        self.manifests.iter().map(|(path, m)| (path.as_str(), m))
    }

    pub fn check_conflicts(&self) -> ModuleConflicts {
        let mut by_id: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        let mut by_namespace: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        let mut by_action: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

        for (path, manifest) in &self.manifests {
            by_id.entry(&manifest.id).or_default().push(path);
            by_namespace.entry(&manifest.namespace).or_default().push(path);
            for action in manifest.actions.keys() {
                by_action.entry(action).or_default().push(path);
            }
        }

        let mut result = ModuleConflicts::default();

        for (id, paths) in by_id.iter().filter(|(_, paths)| paths.len() > 1) {
            result
                .conflicts
                .push(format!("Identical ID \"{}\" is used by modules located at {}.", id, paths.join(", ")));
            result.conflicting_paths.extend(paths.iter().map(|p| p.to_string()));
        }

        for (namespace, paths) in by_namespace.iter().filter(|(_, paths)| paths.len() > 1) {
            result.conflicts.push(format!(
                "Identical namespace \"{}\" is used by modules located at {}.",
                namespace,
                paths.join(", ")
            ));
            result.conflicting_paths.extend(paths.iter().map(|p| p.to_string()));
        }

        // Modules sharing several actions are reported once
        let mut action_groups: Vec<Vec<&str>> = Vec::new();
        for paths in by_action.into_values().filter(|paths| paths.len() > 1) {
            if !action_groups.contains(&paths) {
                action_groups.push(paths);
            }
        }
        for paths in action_groups {
            result
                .conflicts
                .push(format!("Identical actions are used by modules located at {}.", paths.join(", ")));
            result.conflicting_paths.extend(paths.iter().map(|p| p.to_string()));
        }

        result
    }
}
