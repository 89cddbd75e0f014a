use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ApiClientError;
use crate::types::{ConsoleUser, NumberOrString, ObjectId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "NumberOrString")]
pub enum MfaType {
    Totp = 1,
    Duo = 2,
}

impl From<MfaType> for u8 {
    fn from(t: MfaType) -> u8 {
        t as u8
    }
}

impl TryFrom<NumberOrString> for MfaType {
    type Error = String;

    fn try_from(value: NumberOrString) -> Result<Self, Self::Error> {
        match value.as_u64() {
            Some(1) => Ok(MfaType::Totp),
            Some(2) => Ok(MfaType::Duo),
            _ => Err(format!("unknown MFA type {:?}", value)),
        }
    }
}

/// Second-factor method configured for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MfaMethod {
    #[serde(rename = "type")]
    pub kind: MfaType,
    #[serde(default)]
    pub name: String,
    /// TOTP hash algorithm, e.g. "SHA1"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_length: Option<u8>,
}

/// Session markers sent when asking the backend to start a second-factor challenge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeRequest {
    pub sessionid: String,
    #[serde(with = "crate::types::id_string")]
    pub mfaid: ObjectId,
    pub redirect_uri: String,
}

/// Challenge descriptor returned by `user.getConfirmData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmData {
    pub mfa: MfaMethod,
    #[serde(default)]
    pub sessionid: String,
    #[serde(default)]
    pub username: String,
    /// Present while the user enrolls a new TOTP secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totp_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_code_url: Option<String>,
    /// Duo only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_uri: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MfaResponseData {
    pub verification_code: String,
    pub totp_secret: Option<String>,
    pub duo_code: Option<String>,
    pub duo_state: Option<String>,
    pub state: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfirmRequest {
    pub sessionid: String,
    #[serde(with = "crate::types::id_string")]
    pub mfaid: ObjectId,
    pub redirect_uri: String,
    pub mfa_response_data: MfaResponseData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedSession {
    pub sessionid: String,
}

#[async_trait]
pub trait UserApi: Send + Sync {
    async fn get_confirm_data(&self, request: &ChallengeRequest) -> Result<ConfirmData, ApiClientError>;

    /// `None` when the backend declined without an error message.
    async fn confirm(&self, request: &ConfirmRequest) -> Result<Option<ConfirmedSession>, ApiClientError>;

    /// The user owning an authenticated session.
    async fn check_authentication(&self, sessionid: &str) -> Result<ConsoleUser, ApiClientError>;
}
