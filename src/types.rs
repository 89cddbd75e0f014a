/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Database object identifier (moduleid, userid, hostid, ...)
pub type ObjectId = u64;

/// Largest identifier the database layer accepts
pub const MAX_OBJECT_ID: u64 = 9_223_372_036_854_775_807;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum UserType {
    User = 1,
    Admin = 2,
    SuperAdmin = 3,
}

impl From<UserType> for u8 {
    fn from(value: UserType) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for UserType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(UserType::User),
            2 => Ok(UserType::Admin),
            3 => Ok(UserType::SuperAdmin),
            other => Err(format!("unknown user type {}", other)),
        }
    }
}

/// The user a request runs as. Unauthenticated requests run as the guest user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleUser {
    pub userid: ObjectId,
    pub username: String,
    pub user_type: UserType,
    /// UI capabilities granted by the user's role, e.g. "ui.administration.general"
    #[serde(default)]
    pub ui_rules: BTreeSet<String>,
    #[serde(default)]
    pub debug_mode: bool,
    /// Account home page, empty when not configured
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub sessionid: String,
}

impl ConsoleUser {
    pub const GUEST_USERNAME: &'static str = "guest";

    pub fn guest() -> Self {
        Self {
            userid: 0,
            username: Self::GUEST_USERNAME.to_string(),
            user_type: UserType::User,
            ui_rules: BTreeSet::new(),
            debug_mode: false,
            url: String::new(),
            theme: None,
            sessionid: String::new(),
        }
    }

    pub fn is_guest(&self) -> bool {
        self.userid == 0
    }

    pub fn has_rule(&self, rule: &str) -> bool {
        self.ui_rules.contains(rule)
    }
}

/// Backend APIs encode numbers either as JSON numbers or as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    Number(u64),
    String(String),
}

impl NumberOrString {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            NumberOrString::Number(n) => Some(*n),
            NumberOrString::String(s) => s.trim().parse().ok(),
        }
    }
}

/// Serde helpers for identifiers sent as decimal strings and accepted in either form.
pub mod id_string {
    use super::{NumberOrString, ObjectId};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &ObjectId, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&id.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ObjectId, D::Error> {
        let raw = NumberOrString::deserialize(deserializer)?;
        raw.as_u64().ok_or_else(|| D::Error::custom(format!("invalid identifier {:?}", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    struct Row {
        #[serde(with = "id_string")]
        id: ObjectId,
    }

    #[test]
    fn test_id_string_accepts_both_forms() {
        let a: Row = serde_json::from_str(r#"{"id":"42"}"#).unwrap();
        let b: Row = serde_json::from_str(r#"{"id":42}"#).unwrap();
        assert_eq!(a.id, 42);
        assert_eq!(b.id, 42);
        assert_eq!(serde_json::to_string(&a).unwrap(), r#"{"id":"42"}"#);
        assert!(serde_json::from_str::<Row>(r#"{"id":"x"}"#).is_err());
    }

    #[test]
    fn test_guest_user() {
        let guest = ConsoleUser::guest();
        assert!(guest.is_guest());
        assert!(!guest.has_rule("ui.monitoring.hosts"));
    }
}
