use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::BTreeMap;

type HmacSha256 = Hmac<Sha256>;

/// Name of the request parameter carrying the token.
pub const CSRF_TOKEN_NAME: &str = "_csrf_token";

/// Server-side key that signs per-session, per-action tokens. A session id alone is not enough
/// to derive a token.
#[derive(Clone)]
pub struct CsrfKey {
    secret: Vec<u8>,
}

impl std::fmt::Debug for CsrfKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CsrfKey(..)")
    }
}

impl CsrfKey {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self, sessionid: &str, action: &str) -> Option<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).ok()?;
        mac.update(sessionid.as_bytes());
        mac.update(b"\n");
        mac.update(action.as_bytes());
        Some(mac)
    }

    /// Token embedded in forms and action links for `action` in this session.
    pub fn token(&self, sessionid: &str, action: &str) -> String {
        self.mac(sessionid, action)
            .map(|mac| hex::encode(mac.finalize().into_bytes()))
            .unwrap_or_default()
    }

    /// Tokens for several actions, keyed by action name.
    pub fn tokens(&self, sessionid: &str, actions: &[&str]) -> BTreeMap<String, String> {
        actions
            .iter()
            .map(|action| (action.to_string(), self.token(sessionid, action)))
            .collect()
    }

    pub fn verify(&self, sessionid: &str, action: &str, token: &str) -> bool {
        if sessionid.is_empty() {
            return false;
        }
        let Ok(expected) = hex::decode(token) else {
            return false;
        };
        self.mac(sessionid, action)
            .is_some_and(|mac| mac.verify_slice(&expected).is_ok())
    }
}
