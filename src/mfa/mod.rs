//! Second-factor step of the login: challenge issue, code confirmation and the final redirect.

pub mod flow;

use crate::params::{scalar_string, Params};

pub use flow::{ChallengeResult, MfaFlow, MfaOutcome};

pub const MFA_PAGE: &str = "index_mfa.php";
pub const LOGIN_TARGET: &str = "index.php?form=default";

/// Parameters of one `index_mfa.php` request plus the transport details needed for the
/// provider redirect URI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MfaRequest {
    pub request: String,
    pub enter: bool,
    pub verification_code: String,
    pub totp_secret: Option<String>,
    pub hash_function: Option<String>,
    pub qr_code_url: Option<String>,
    pub duo_code: Option<String>,
    pub state: Option<String>,
    /// Host header
    pub host: Option<String>,
    pub https: bool,
    /// Path and query as requested, e.g. `/index_mfa.php?duo_code=x&state=y`
    pub request_uri: String,
}

impl MfaRequest {
    pub fn from_params(params: &Params, host: Option<String>, https: bool, request_uri: impl Into<String>) -> Self {
        let get = |name: &str| params.get(name).and_then(scalar_string);

        Self {
            request: get("request").unwrap_or_default(),
            enter: params.contains_key("enter"),
            verification_code: get("verification_code").unwrap_or_default(),
            totp_secret: get("totp_secret"),
            hash_function: get("hash_function"),
            qr_code_url: get("qr_code_url"),
            duo_code: get("duo_code"),
            state: get("state"),
            host,
            https,
            request_uri: request_uri.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::from_urlencoded;

    #[test]
    fn test_from_params() {
        let params = from_urlencoded(b"enter=1&verification_code=123456&request=zabbix.php%3Faction%3Dhost.view");
        let req = MfaRequest::from_params(&params, Some("console.local".to_string()), false, "/index_mfa.php");

        assert!(req.enter);
        assert_eq!(req.verification_code, "123456");
        assert_eq!(req.request, "zabbix.php?action=host.view");
        assert_eq!(req.totp_secret, None);
    }
}
