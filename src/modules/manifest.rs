use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ManifestError {
    #[error("invalid manifest JSON: {0}")]
    Json(String),

    #[error("manifest field \"{0}\" is missing or empty")]
    MissingField(&'static str),

    #[error("manifest namespace \"{0}\" must contain only letters and digits")]
    InvalidNamespace(String),

    #[error("unsupported manifest version {0}")]
    UnsupportedVersion(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestAction {
    #[serde(default)]
    pub class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
}

/// Contents of a module's `manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub manifest_version: f64,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub actions: BTreeMap<String, ManifestAction>,
    #[serde(default)]
    pub config: Value,
}

impl Manifest {
    pub const SUPPORTED_VERSIONS: [f64; 2] = [1.0, 2.0];

    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let manifest: Manifest = serde_json::from_str(text).map_err(|e| ManifestError::Json(e.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<(), ManifestError> {
        if !Self::SUPPORTED_VERSIONS.contains(&self.manifest_version) {
            return Err(ManifestError::UnsupportedVersion(self.manifest_version));
        }

        for (name, value) in [
            ("id", &self.id),
            ("name", &self.name),
            ("namespace", &self.namespace),
            ("version", &self.version),
        ] {
            if value.trim().is_empty() {
                return Err(ManifestError::MissingField(name));
            }
        }

        if !self.namespace.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ManifestError::InvalidNamespace(self.namespace.clone()));
        }

        Ok(())
    }
}
