use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use super::SessionError;

/// Payload of the session cookie: base64-encoded JSON naming the server-side session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCookie {
    pub sessionid: String,
}

impl SessionCookie {
    pub fn new(sessionid: impl Into<String>) -> Self {
        Self { sessionid: sessionid.into() }
    }

    /// Fresh random session id (32 lowercase hex characters).
    pub fn generate() -> Self {
        Self::new(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn encode(&self) -> Result<String, SessionError> {
        let json = serde_json::to_vec(self).map_err(|e| SessionError::Cookie(e.to_string()))?;
        Ok(STANDARD.encode(json))
    }

    pub fn decode(value: &str) -> Result<Self, SessionError> {
        let bytes = STANDARD
            .decode(value.trim())
            .map_err(|e| SessionError::Cookie(format!("invalid base64: {}", e)))?;
        let cookie: SessionCookie =
            serde_json::from_slice(&bytes).map_err(|e| SessionError::Cookie(format!("invalid JSON: {}", e)))?;

        if cookie.sessionid.is_empty() || !cookie.sessionid.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(SessionError::Cookie("invalid session id".to_string()));
        }

        Ok(cookie)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let cookie = SessionCookie::generate();
        assert_eq!(cookie.sessionid.len(), 32);

        let encoded = cookie.encode().unwrap();
        assert_eq!(SessionCookie::decode(&encoded).unwrap(), cookie);
    }

    #[test]
    fn test_decode_known_payload() {
        // {"sessionid":"abc123"}
        let cookie = SessionCookie::decode("eyJzZXNzaW9uaWQiOiJhYmMxMjMifQ==").unwrap();
        assert_eq!(cookie.sessionid, "abc123");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(SessionCookie::decode("not base64!").is_err());
        assert!(SessionCookie::decode(&STANDARD.encode("[]")).is_err());
        assert!(SessionCookie::decode(&STANDARD.encode(r#"{"sessionid":"../x"}"#)).is_err());
    }
}
