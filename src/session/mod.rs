//! Per-session key/value state: form retry data, MFA flow markers, the bound user session.
//!
//! A [`Session`] is loaded at the start of a request, mutated through typed accessors and
//! written back once with [`Session::commit`] when the request finishes.

pub mod cookie;
pub mod store;

use serde_json::{json, Value};
use thiserror::Error;

use crate::params::Params;
use crate::types::ObjectId;

pub use cookie::SessionCookie;
pub use store::{MemorySessionStore, SessionData, SessionStore};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid session cookie: {0}")]
    Cookie(String),

    #[error("Session storage error: {0}")]
    Storage(String),
}

/// Logical entry names kept in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKey {
    FormData,
    MfaId,
    State,
    Username,
    SessionId,
    Request,
}

impl SessionKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKey::FormData => "formData",
            SessionKey::MfaId => "mfaid",
            SessionKey::State => "state",
            SessionKey::Username => "username",
            SessionKey::SessionId => "sessionid",
            SessionKey::Request => "request",
        }
    }
}

pub struct Session {
    id: String,
    data: SessionData,
    is_new: bool,
    modified: bool,
}

impl Session {
    /// Start a new, empty session with a fresh id.
    pub fn start() -> Self {
        Self {
            id: SessionCookie::generate().sessionid,
            data: SessionData::new(),
            is_new: true,
            modified: false,
        }
    }

    pub fn from_data(id: impl Into<String>, data: SessionData) -> Self {
        Self {
            id: id.into(),
            data,
            is_new: false,
            modified: false,
        }
    }

    /// Resume the session named by `cookie`, or start a new one when it is unknown or expired.
    pub async fn resume(store: &dyn SessionStore, cookie: Option<&SessionCookie>) -> Result<Self, SessionError> {
        if let Some(cookie) = cookie {
            if let Some(data) = store.load(&cookie.sessionid).await? {
                return Ok(Self::from_data(cookie.sessionid.clone(), data));
            }
            tracing::debug!("Session {} not found, starting a new one", cookie.sessionid);
        }
        Ok(Self::start())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn cookie(&self) -> SessionCookie {
        SessionCookie::new(self.id.clone())
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn data(&self) -> &SessionData {
        &self.data
    }

    pub fn has(&self, key: SessionKey) -> bool {
        self.data.contains_key(key.as_str())
    }

    pub fn get(&self, key: SessionKey) -> Option<&Value> {
        self.data.get(key.as_str())
    }

    pub fn set(&mut self, key: SessionKey, value: Value) {
        self.data.insert(key.as_str().to_string(), value);
        self.modified = true;
    }

    pub fn unset(&mut self, keys: &[SessionKey]) {
        for key in keys {
            if self.data.remove(key.as_str()).is_some() {
                self.modified = true;
            }
        }
    }

    fn get_str(&self, key: SessionKey) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Remember form values for the next request (e.g. after a failed submit redirect).
    pub fn set_form_data(&mut self, form: Params) {
        self.set(SessionKey::FormData, Value::Object(form));
    }

    /// Retry data is consumed once: reading it removes it.
    pub fn take_form_data(&mut self) -> Option<Params> {
        let value = self.data.remove(SessionKey::FormData.as_str())?;
        self.modified = true;
        match value {
            Value::Object(form) => Some(form),
            _ => None,
        }
    }

    /// Pending MFA method id recorded at login; `None` or 0 means no second factor is due.
    pub fn mfaid(&self) -> Option<ObjectId> {
        match self.get(SessionKey::MfaId)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn set_mfaid(&mut self, mfaid: ObjectId) {
        self.set(SessionKey::MfaId, json!(mfaid));
    }

    pub fn state(&self) -> Option<&str> {
        self.get_str(SessionKey::State)
    }

    pub fn set_state(&mut self, state: impl Into<String>) {
        self.set(SessionKey::State, Value::String(state.into()));
    }

    pub fn username(&self) -> Option<&str> {
        self.get_str(SessionKey::Username)
    }

    pub fn set_username(&mut self, username: impl Into<String>) {
        self.set(SessionKey::Username, Value::String(username.into()));
    }

    /// Authenticated user session bound to this browser session.
    pub fn sessionid(&self) -> Option<&str> {
        self.get_str(SessionKey::SessionId).filter(|s| !s.is_empty())
    }

    pub fn set_sessionid(&mut self, sessionid: impl Into<String>) {
        self.set(SessionKey::SessionId, Value::String(sessionid.into()));
    }

    pub fn request(&self) -> Option<&str> {
        self.get_str(SessionKey::Request)
    }

    pub fn set_request(&mut self, request: impl Into<String>) {
        self.set(SessionKey::Request, Value::String(request.into()));
    }

    /// Write the session back if anything changed. A new session nothing was written to stays
    /// unsaved and keeps `is_new`.
    pub async fn commit(&mut self, store: &dyn SessionStore) -> Result<(), SessionError> {
        if !self.modified {
            return Ok(());
        }
        store.save(&self.id, self.data.clone()).await?;
        self.modified = false;
        self.is_new = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_data_is_consumed_once() {
        let mut session = Session::start();
        let mut form = Params::new();
        form.insert("name".to_string(), json!("retry"));
        session.set_form_data(form.clone());

        assert_eq!(session.take_form_data(), Some(form));
        assert_eq!(session.take_form_data(), None);
        assert!(!session.has(SessionKey::FormData));
    }

    #[test]
    fn test_mfaid_accepts_numbers_and_strings() {
        let mut session = Session::start();
        assert_eq!(session.mfaid(), None);

        session.set_mfaid(2);
        assert_eq!(session.mfaid(), Some(2));

        session.set(SessionKey::MfaId, json!("7"));
        assert_eq!(session.mfaid(), Some(7));
    }

    #[test]
    fn test_unset_marks_modified_only_when_removing() {
        let mut data = SessionData::new();
        data.insert("state".to_string(), json!("s1"));
        let mut session = Session::from_data("abc", data);

        session.unset(&[SessionKey::Username]);
        assert!(!session.is_modified());

        session.unset(&[SessionKey::State, SessionKey::Username]);
        assert!(session.is_modified());
        assert_eq!(session.state(), None);
    }

    #[tokio::test]
    async fn test_resume_and_commit() {
        let store = MemorySessionStore::default();

        let mut session = Session::resume(&store, None).await.unwrap();
        assert!(session.is_new());
        session.set_username("Admin");
        session.commit(&store).await.unwrap();

        let cookie = session.cookie();
        let resumed = Session::resume(&store, Some(&cookie)).await.unwrap();
        assert!(!resumed.is_new());
        assert_eq!(resumed.username(), Some("Admin"));

        let unknown = SessionCookie::new("doesnotexist");
        assert_eq!(store.len().await, 1);
        let fresh = Session::resume(&store, Some(&unknown)).await.unwrap();
        assert!(fresh.is_new());
        assert_ne!(fresh.id(), "doesnotexist");
    }

    #[tokio::test]
    async fn test_untouched_new_session_is_not_stored() {
        let store = MemorySessionStore::default();

        let mut session = Session::resume(&store, None).await.unwrap();
        session.unset(&[SessionKey::MfaId]);
        session.commit(&store).await.unwrap();

        assert!(session.is_new());
        assert_eq!(store.len().await, 0);
    }
}
