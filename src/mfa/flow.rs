use tracing::{debug, error, info, warn};

use super::{MfaRequest, LOGIN_TARGET};
use crate::access::AccessPolicy;
use crate::api::{
    ApiClientError, ChallengeRequest, ConfirmData, ConfirmRequest, ConfirmedSession, MfaResponseData, MfaType, UserApi,
};
use crate::menu::Menu;
use crate::session::{Session, SessionKey};
use crate::types::ObjectId;
use crate::urls::{is_same_site, ConsoleUrl};
use crate::views::pages::{mfa_login_page, warning_page, MfaLoginPage, WarningPage};

const HOME_FALLBACK: &str = "index.php";

/// What the backend made of this request's challenge or confirmation.
#[derive(Debug)]
pub enum ChallengeResult {
    /// TOTP challenge: show the code-entry page
    ChallengeIssued(ConfirmData),
    /// Provider prompt (Duo) to send the browser to
    RedirectRequired(String),
    Confirmed(ConfirmedSession),
    /// `None` when the backend declined without a reason
    Rejected(Option<ApiClientError>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MfaOutcome {
    /// Complete HTML page
    Render(String),
    Redirect(String),
}

pub struct MfaFlow<'a> {
    user_api: &'a dyn UserApi,
    access: &'a dyn AccessPolicy,
    menu: &'a Menu,
    theme: &'a str,
}

/// Callback URI handed to the provider: the current request without the provider's answer.
fn provider_redirect_uri(input: &MfaRequest, request: &str) -> String {
    let uri = ConsoleUrl::parse(&input.request_uri)
        .remove_argument("state")
        .remove_argument("duo_code")
        .set_argument("request", request);
    let scheme = if input.https { "https://" } else { "http://" };
    format!("{}{}{}", scheme, input.host.as_deref().unwrap_or_default(), uri)
}

impl<'a> MfaFlow<'a> {
    pub fn new(user_api: &'a dyn UserApi, access: &'a dyn AccessPolicy, menu: &'a Menu, theme: &'a str) -> Self {
        Self {
            user_api,
            access,
            menu,
            theme,
        }
    }

    pub async fn run(&self, session: &mut Session, input: &MfaRequest) -> MfaOutcome {
        let request = if !input.request.is_empty() && is_same_site(&input.request, input.host.as_deref()) {
            input.request.clone()
        } else {
            String::new()
        };

        let mut target = ConsoleUrl::parse(LOGIN_TARGET);
        if !request.is_empty() {
            target = target.set_argument("request", request.as_str());
        }
        let target = target.to_string();

        let Some(mfaid) = session.mfaid().filter(|id| *id != 0) else {
            debug!("No second factor pending, back to the login form");
            return MfaOutcome::Redirect(target);
        };

        if !request.is_empty() {
            session.set_request(request.as_str());
        }

        let redirect_uri = provider_redirect_uri(input, &request);
        let sessionid = session.sessionid().unwrap_or_default().to_string();

        let result = if !session.has(SessionKey::State) && !input.enter {
            self.challenge(session, sessionid, mfaid, redirect_uri).await
        } else {
            self.confirm(session, input, sessionid, mfaid, redirect_uri).await
        };

        self.transition(session, input, &request, &target, result).await
    }

    async fn challenge(
        &self,
        session: &mut Session,
        sessionid: String,
        mfaid: ObjectId,
        redirect_uri: String,
    ) -> ChallengeResult {
        let request = ChallengeRequest {
            sessionid,
            mfaid,
            redirect_uri,
        };

        let data = match self.user_api.get_confirm_data(&request).await {
            Ok(data) => data,
            Err(err) => return ChallengeResult::Rejected(Some(err)),
        };

        match data.mfa.kind {
            MfaType::Totp => ChallengeResult::ChallengeIssued(data),
            MfaType::Duo => {
                let Some(prompt_uri) = data.prompt_uri.filter(|uri| !uri.is_empty()) else {
                    return ChallengeResult::Rejected(Some(ApiClientError::InvalidResponse(
                        "Duo challenge without a prompt URI".to_string(),
                    )));
                };
                session.set_state(data.state.unwrap_or_default());
                session.set_username(data.username);
                session.set_sessionid(data.sessionid);
                ChallengeResult::RedirectRequired(prompt_uri)
            }
        }
    }

    async fn confirm(
        &self,
        session: &Session,
        input: &MfaRequest,
        sessionid: String,
        mfaid: ObjectId,
        redirect_uri: String,
    ) -> ChallengeResult {
        let request = ConfirmRequest {
            sessionid,
            mfaid,
            redirect_uri,
            mfa_response_data: MfaResponseData {
                verification_code: input.verification_code.clone(),
                totp_secret: input.totp_secret.clone(),
                duo_code: input.duo_code.clone(),
                duo_state: input.state.clone(),
                state: session.state().unwrap_or_default().to_string(),
                username: session.username().unwrap_or_default().to_string(),
            },
        };

        match self.user_api.confirm(&request).await {
            Ok(Some(confirmed)) => ChallengeResult::Confirmed(confirmed),
            Ok(None) => ChallengeResult::Rejected(None),
            Err(err) => ChallengeResult::Rejected(Some(err)),
        }
    }

    async fn transition(
        &self,
        session: &mut Session,
        input: &MfaRequest,
        request: &str,
        target: &str,
        result: ChallengeResult,
    ) -> MfaOutcome {
        match result {
            ChallengeResult::ChallengeIssued(data) => MfaOutcome::Render(mfa_login_page(&MfaLoginPage {
                name: data.mfa.name,
                qr_code_url: data.qr_code_url,
                totp_secret: data.totp_secret,
                hash_function: data.mfa.hash_function,
                error: None,
                theme: self.theme.to_string(),
            })),

            ChallengeResult::RedirectRequired(url) => {
                info!("Redirecting to the MFA provider prompt");
                MfaOutcome::Redirect(url)
            }

            ChallengeResult::Confirmed(confirmed) => {
                let user = match self.user_api.check_authentication(&confirmed.sessionid).await {
                    Ok(user) => user,
                    Err(err) => return self.warning(target, Some(err)),
                };

                let sessionid = if user.sessionid.is_empty() {
                    confirmed.sessionid
                } else {
                    user.sessionid.clone()
                };
                // Later backend calls authenticate with this session id
                session.set_sessionid(sessionid);
                session.unset(&[SessionKey::MfaId, SessionKey::State, SessionKey::Username]);

                let url = [
                    request.to_string(),
                    user.url.clone(),
                    self.menu.first_url(&user, self.access).unwrap_or_default(),
                ]
                .into_iter()
                .find(|url| !url.is_empty())
                .unwrap_or_else(|| HOME_FALLBACK.to_string());

                info!("User {} completed multi-factor authentication", user.username);
                MfaOutcome::Redirect(url)
            }

            ChallengeResult::Rejected(Some(err)) if err.is_incorrect_code() => {
                MfaOutcome::Render(mfa_login_page(&MfaLoginPage {
                    name: String::new(),
                    qr_code_url: input.qr_code_url.clone(),
                    totp_secret: input.totp_secret.clone(),
                    hash_function: input.hash_function.clone(),
                    error: Some(err.to_string()),
                    theme: self.theme.to_string(),
                }))
            }

            ChallengeResult::Rejected(err) => self.warning(target, err),
        }
    }

    fn warning(&self, target: &str, err: Option<ApiClientError>) -> MfaOutcome {
        let messages = match err {
            Some(err @ ApiClientError::Application { .. }) => {
                warn!("Multi-factor authentication failed: {}", err);
                vec![err.to_string()]
            }
            Some(err) => {
                error!("Multi-factor authentication backend error: {}", err);
                vec![err.to_string()]
            }
            None => Vec::new(),
        };

        MfaOutcome::Render(warning_page(&WarningPage::not_logged_in(messages, target, self.theme)))
    }
}
