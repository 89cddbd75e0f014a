//! Per-user preference store with write buffering.
//!
//! Writes made while handling a request are kept in the [`Profile`] buffer and only reach the
//! backend when [`Profile::flush`] is called, as a single all-or-nothing commit.

pub mod backend;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::types::ObjectId;

pub use backend::{MemoryProfileBackend, ProfileBackend};

/// Longest `idx` accepted by the store.
pub const MAX_IDX_LENGTH: usize = 96;
/// Longest string value accepted by the store.
pub const MAX_STR_LENGTH: usize = 255;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Profile key \"{0}\" is too long")]
    KeyTooLong(String),

    #[error("Profile value for \"{0}\" is too long")]
    ValueTooLong(String),

    #[error("Profile storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ProfileType {
    Id = 1,
    Int = 2,
    Str = 3,
}

impl From<ProfileType> for u8 {
    fn from(t: ProfileType) -> u8 {
        t as u8
    }
}

impl TryFrom<u8> for ProfileType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ProfileType::Id),
            2 => Ok(ProfileType::Int),
            3 => Ok(ProfileType::Str),
            other => Err(format!("unknown profile type {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileValue {
    Id(ObjectId),
    Int(i32),
    Str(String),
}

impl ProfileValue {
    pub fn profile_type(&self) -> ProfileType {
        match self {
            ProfileValue::Id(_) => ProfileType::Id,
            ProfileValue::Int(_) => ProfileType::Int,
            ProfileValue::Str(_) => ProfileType::Str,
        }
    }

    pub fn as_id(&self) -> Option<ObjectId> {
        match self {
            ProfileValue::Id(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            ProfileValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ProfileValue::Str(v) => Some(v),
            _ => None,
        }
    }
}

/// `(idx, idx2)` addressing one profile entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProfileKey {
    pub idx: String,
    pub idx2: ObjectId,
}

impl ProfileKey {
    pub fn new(idx: impl Into<String>, idx2: ObjectId) -> Self {
        Self { idx: idx.into(), idx2 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileWrite {
    Set(ProfileKey, ProfileValue),
    Delete(ProfileKey),
}

impl ProfileWrite {
    pub fn key(&self) -> &ProfileKey {
        match self {
            ProfileWrite::Set(key, _) | ProfileWrite::Delete(key) => key,
        }
    }

    /// Checks the limits every backend enforces.
    pub fn check(&self) -> Result<(), ProfileError> {
        let key = self.key();
        if key.idx.chars().count() > MAX_IDX_LENGTH {
            return Err(ProfileError::KeyTooLong(key.idx.clone()));
        }
        if let ProfileWrite::Set(_, ProfileValue::Str(s)) = self {
            if s.chars().count() > MAX_STR_LENGTH {
                return Err(ProfileError::ValueTooLong(key.idx.clone()));
            }
        }
        Ok(())
    }
}

pub type ProfileEntries = BTreeMap<ProfileKey, ProfileValue>;

/// One user's preferences plus the writes buffered during the current request.
#[derive(Debug, Clone, Default)]
pub struct Profile {
    userid: ObjectId,
    values: ProfileEntries,
    pending: BTreeMap<ProfileKey, Option<ProfileValue>>,
}

impl Profile {
    pub fn new(userid: ObjectId, values: ProfileEntries) -> Self {
        Self {
            userid,
            values,
            pending: BTreeMap::new(),
        }
    }

    pub async fn load(backend: &dyn ProfileBackend, userid: ObjectId) -> Result<Self, ProfileError> {
        let values = backend.load(userid).await?;
        Ok(Self::new(userid, values))
    }

    pub fn userid(&self) -> ObjectId {
        self.userid
    }

    /// Current value, including writes not yet flushed.
    pub fn get(&self, idx: &str, idx2: ObjectId) -> Option<&ProfileValue> {
        let key = ProfileKey::new(idx, idx2);
        match self.pending.get(&key) {
            Some(pending) => pending.as_ref(),
            None => self.values.get(&key),
        }
    }

    pub fn get_int(&self, idx: &str, default: i32) -> i32 {
        self.get(idx, 0).and_then(ProfileValue::as_int).unwrap_or(default)
    }

    pub fn get_str<'a>(&'a self, idx: &str, default: &'a str) -> &'a str {
        self.get(idx, 0).and_then(ProfileValue::as_str).unwrap_or(default)
    }

    pub fn update(&mut self, idx: impl Into<String>, idx2: ObjectId, value: ProfileValue) {
        let key = ProfileKey::new(idx, idx2);
        if self.values.get(&key) == Some(&value) && !self.pending.contains_key(&key) {
            return;
        }
        self.pending.insert(key, Some(value));
    }

    pub fn delete(&mut self, idx: &str, idx2s: &[ObjectId]) {
        for idx2 in idx2s {
            self.pending.insert(ProfileKey::new(idx, *idx2), None);
        }
    }

    pub fn is_modified(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_writes(&self) -> Vec<ProfileWrite> {
        self.pending
            .iter()
            .map(|(key, value)| match value {
                Some(value) => ProfileWrite::Set(key.clone(), value.clone()),
                None => ProfileWrite::Delete(key.clone()),
            })
            .collect()
    }

    /// Commit every buffered write as one unit. On failure the buffer is kept and nothing is applied.
    pub async fn flush(&mut self, backend: &dyn ProfileBackend) -> Result<(), ProfileError> {
        if !self.is_modified() {
            return Ok(());
        }

        let writes = self.pending_writes();
        backend.commit(self.userid, &writes).await?;

        for (key, value) in std::mem::take(&mut self.pending) {
            match value {
                Some(value) => {
                    self.values.insert(key, value);
                }
                None => {
                    self.values.remove(&key);
                }
            }
        }

        tracing::debug!("Flushed {} profile write(s) for user {}", writes.len(), self.userid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_see_pending_writes() {
        let mut values = ProfileEntries::new();
        values.insert(ProfileKey::new("web.modules.sort", 0), ProfileValue::Str("name".into()));
        let mut profile = Profile::new(1, values);

        assert_eq!(profile.get_str("web.modules.sort", "id"), "name");
        profile.update("web.modules.sort", 0, ProfileValue::Str("status".into()));
        assert_eq!(profile.get_str("web.modules.sort", "id"), "status");

        profile.delete("web.modules.sort", &[0]);
        assert_eq!(profile.get("web.modules.sort", 0), None);
        assert_eq!(profile.get_str("web.modules.sort", "id"), "id");
    }

    #[test]
    fn test_unchanged_value_is_not_a_write() {
        let mut values = ProfileEntries::new();
        values.insert(ProfileKey::new("web.rows", 0), ProfileValue::Int(50));
        let mut profile = Profile::new(1, values);

        profile.update("web.rows", 0, ProfileValue::Int(50));
        assert!(!profile.is_modified());

        profile.update("web.rows", 0, ProfileValue::Int(100));
        assert!(profile.is_modified());
        assert_eq!(profile.get_int("web.rows", 0), 100);
    }

    #[test]
    fn test_write_limits() {
        let long_key = ProfileWrite::Delete(ProfileKey::new("k".repeat(97), 0));
        assert!(matches!(long_key.check(), Err(ProfileError::KeyTooLong(_))));

        let long_value = ProfileWrite::Set(ProfileKey::new("k", 0), ProfileValue::Str("v".repeat(256)));
        assert!(matches!(long_value.check(), Err(ProfileError::ValueTooLong(_))));
    }

    #[tokio::test]
    async fn test_flush_is_skipped_without_writes() {
        let backend = MemoryProfileBackend::default();
        let mut profile = Profile::load(&backend, 3).await.unwrap();

        profile.flush(&backend).await.unwrap();
        assert_eq!(backend.commit_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_flush_applies_nothing() {
        let backend = MemoryProfileBackend::default();
        let mut profile = Profile::load(&backend, 3).await.unwrap();

        profile.update("web.a", 0, ProfileValue::Int(1));
        profile.update("web.b", 0, ProfileValue::Str("x".repeat(300)));
        assert!(profile.flush(&backend).await.is_err());

        assert!(backend.load(3).await.unwrap().is_empty());
        assert!(profile.is_modified());
    }

    #[tokio::test]
    async fn test_flush_persists_all_writes() {
        let backend = MemoryProfileBackend::default();
        let mut profile = Profile::load(&backend, 3).await.unwrap();

        profile.update("web.a", 0, ProfileValue::Int(1));
        profile.update("web.b", 7, ProfileValue::Id(42));
        profile.flush(&backend).await.unwrap();
        assert!(!profile.is_modified());
        assert_eq!(backend.commit_count(), 1);

        let reloaded = Profile::load(&backend, 3).await.unwrap();
        assert_eq!(reloaded.get_int("web.a", 0), 1);
        assert_eq!(reloaded.get("web.b", 7), Some(&ProfileValue::Id(42)));
    }
}
