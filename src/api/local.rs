use async_trait::async_trait;
use data_encoding::BASE32_NOPAD;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use totp_rs::{Algorithm, Secret, TOTP};
use tracing::{info, warn};

use super::user::{ChallengeRequest, ConfirmData, ConfirmRequest, ConfirmedSession, MfaMethod, MfaType, UserApi};
use super::{ApiClientError, INCORRECT_CODE_MESSAGE};
use crate::types::{ConsoleUser, ObjectId};

const TOTP_DIGITS: usize = 6;
const TOTP_STEP: u64 = 30;
const SECRET_BYTES: usize = 20;

#[derive(Debug, Clone)]
pub struct LocalMfa {
    pub mfaid: ObjectId,
    pub kind: MfaType,
    pub name: String,
    /// Base32 secret; `None` until the user enrolls
    pub totp_secret: Option<String>,
}

#[derive(Debug, Clone)]
struct LocalAccount {
    user: ConsoleUser,
    mfa: Option<LocalMfa>,
}

#[derive(Default)]
struct LocalState {
    accounts: HashMap<ObjectId, LocalAccount>,
    /// Sessions that passed the password step and wait for the second factor
    pending: HashMap<String, ObjectId>,
    /// Fully authenticated sessions
    active: HashMap<String, ObjectId>,
    /// Secrets handed out for enrollment, by pending session
    enrolling: HashMap<String, String>,
}

/// In-process user authentication with TOTP second factor. Duo needs the real backend.
#[derive(Clone)]
pub struct LocalUserApi {
    issuer: String,
    state: Arc<RwLock<LocalState>>,
}

fn totp_for_secret(issuer: &str, account: &str, secret_b32: &str) -> Result<TOTP, ApiClientError> {
    let bytes = Secret::Encoded(secret_b32.to_string())
        .to_bytes()
        .map_err(|_| ApiClientError::application("Invalid TOTP secret."))?;
    TOTP::new(
        Algorithm::SHA1,
        TOTP_DIGITS,
        1,
        TOTP_STEP,
        bytes,
        Some(issuer.to_string()),
        account.to_string(),
    )
    .map_err(|e| ApiClientError::application(format!("Invalid TOTP secret: {}", e)))
}

fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    BASE32_NOPAD.encode(&bytes)
}

fn new_sessionid() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

impl LocalUserApi {
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            state: Arc::new(RwLock::new(LocalState::default())),
        }
    }

    pub async fn add_user(&self, user: ConsoleUser, mfa: Option<LocalMfa>) {
        let mut state = self.state.write().await;
        state.accounts.insert(user.userid, LocalAccount { user, mfa });
    }

    /// Record a password-verified login. Returns the session id and the pending MFA method id
    /// (0 when the user has no second factor and the session is already active).
    pub async fn begin_login(&self, userid: ObjectId) -> Result<(String, ObjectId), ApiClientError> {
        let mut state = self.state.write().await;
        let mfaid = state
            .accounts
            .get(&userid)
            .ok_or_else(|| ApiClientError::application("Incorrect user name or password or account is temporarily blocked."))?
            .mfa
            .as_ref()
            .map(|m| m.mfaid)
            .unwrap_or(0);

        let sessionid = new_sessionid();
        if mfaid == 0 {
            state.active.insert(sessionid.clone(), userid);
        } else {
            state.pending.insert(sessionid.clone(), userid);
        }
        Ok((sessionid, mfaid))
    }

    /// Current code for a user's enrolled secret.
    pub async fn current_code(&self, userid: ObjectId) -> Option<String> {
        let state = self.state.read().await;
        let account = state.accounts.get(&userid)?;
        let secret = account.mfa.as_ref()?.totp_secret.as_ref()?;
        totp_for_secret(&self.issuer, &account.user.username, secret).ok()?.generate_current().ok()
    }

    fn pending_account<'a>(state: &'a LocalState, sessionid: &str) -> Result<&'a LocalAccount, ApiClientError> {
        state
            .pending
            .get(sessionid)
            .and_then(|userid| state.accounts.get(userid))
            .ok_or_else(|| ApiClientError::application("Session terminated, re-login, please."))
    }
}

fn method_of(account: &LocalAccount, mfaid: ObjectId) -> Result<&LocalMfa, ApiClientError> {
    account
        .mfa
        .as_ref()
        .filter(|m| m.mfaid == mfaid)
        .ok_or_else(|| ApiClientError::application("Incorrect MFA method."))
}

#[async_trait]
impl UserApi for LocalUserApi {
    async fn get_confirm_data(&self, request: &ChallengeRequest) -> Result<ConfirmData, ApiClientError> {
        let mut state = self.state.write().await;
        let account = Self::pending_account(&state, &request.sessionid)?.clone();
        let method = method_of(&account, request.mfaid)?;

        if method.kind == MfaType::Duo {
            warn!("Duo MFA requested for {} but no Duo backend is configured", account.user.username);
            return Err(ApiClientError::application("Duo Universal Prompt is not available."));
        }

        let mut data = ConfirmData {
            mfa: MfaMethod {
                kind: MfaType::Totp,
                name: method.name.clone(),
                hash_function: Some("SHA1".to_string()),
                code_length: Some(TOTP_DIGITS as u8),
            },
            sessionid: request.sessionid.clone(),
            username: account.user.username.clone(),
            totp_secret: None,
            qr_code_url: None,
            state: None,
            prompt_uri: None,
        };

        if method.totp_secret.is_none() {
            let secret = generate_secret();
            let totp = totp_for_secret(&self.issuer, &account.user.username, &secret)?;
            data.qr_code_url = Some(totp.get_url());
            data.totp_secret = Some(secret.clone());
            state.enrolling.insert(request.sessionid.clone(), secret);
        }

        Ok(data)
    }

    async fn confirm(&self, request: &ConfirmRequest) -> Result<Option<ConfirmedSession>, ApiClientError> {
        let mut state = self.state.write().await;
        let account = Self::pending_account(&state, &request.sessionid)?.clone();
        let method = method_of(&account, request.mfaid)?.clone();

        if method.kind == MfaType::Duo {
            return Err(ApiClientError::application("Duo Universal Prompt is not available."));
        }

        // An enrolling user proves possession of the secret issued with the challenge
        let enrolling = state.enrolling.get(&request.sessionid).cloned();
        let secret = match (&method.totp_secret, &enrolling) {
            (Some(secret), _) => secret.clone(),
            (None, Some(issued)) if request.mfa_response_data.totp_secret.as_deref() == Some(issued.as_str()) => {
                issued.clone()
            }
            (None, _) => return Err(ApiClientError::application("Incorrect TOTP secret.")),
        };

        let totp = totp_for_secret(&self.issuer, &account.user.username, &secret)?;
        let code = request.mfa_response_data.verification_code.trim();
        let valid = code.len() == TOTP_DIGITS
            && totp
                .check_current(code)
                .map_err(|e| ApiClientError::application(format!("System clock error: {}", e)))?;

        if !valid {
            info!("Incorrect verification code for {}", account.user.username);
            return Err(ApiClientError::application(INCORRECT_CODE_MESSAGE));
        }

        if method.totp_secret.is_none() {
            if let Some(mfa) = state.accounts.get_mut(&account.user.userid).and_then(|a| a.mfa.as_mut()) {
                mfa.totp_secret = Some(secret);
            }
        }

        state.enrolling.remove(&request.sessionid);
        state.pending.remove(&request.sessionid);
        let sessionid = new_sessionid();
        state.active.insert(sessionid.clone(), account.user.userid);

        info!("User {} passed the second factor", account.user.username);
        Ok(Some(ConfirmedSession { sessionid }))
    }

    async fn check_authentication(&self, sessionid: &str) -> Result<ConsoleUser, ApiClientError> {
        let state = self.state.read().await;
        let user = state
            .active
            .get(sessionid)
            .and_then(|userid| state.accounts.get(userid))
            .map(|account| account.user.clone())
            .ok_or_else(|| ApiClientError::application("Session terminated, re-login, please."))?;

        Ok(ConsoleUser {
            sessionid: sessionid.to_string(),
            ..user
        })
    }
}
