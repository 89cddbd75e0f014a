//! Session cookie handling shared by the console handlers: resume the browser session, resolve
//! the user it is bound to, and write both back when the request is done.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::{debug, error, warn};

use crate::api::ApiClientError;
use crate::error::ConsoleError;
use crate::session::{Session, SessionCookie};
use crate::types::ConsoleUser;
use crate::AppState;

pub struct ConsoleSession {
    pub session: Session,
    pub user: ConsoleUser,
}

pub fn session_cookie(state: &AppState, jar: &CookieJar) -> Option<SessionCookie> {
    let cookie = jar.get(&state.config.session.cookie_name)?;
    match SessionCookie::decode(cookie.value()) {
        Ok(cookie) => Some(cookie),
        Err(e) => {
            warn!("Ignoring session cookie: {}", e);
            None
        }
    }
}

/// The user bound to the session, or the guest while no login (or its second factor) completed.
pub async fn resolve_user(state: &AppState, session: &Session) -> Result<ConsoleUser, ConsoleError> {
    let Some(sessionid) = session.sessionid() else {
        return Ok(ConsoleUser::guest());
    };
    if session.mfaid().is_some_and(|id| id != 0) {
        return Ok(ConsoleUser::guest());
    }

    match state.users.check_authentication(sessionid).await {
        Ok(user) => Ok(user),
        Err(ApiClientError::Application { message, .. }) => {
            debug!("Session not authenticated: {}", message);
            Ok(ConsoleUser::guest())
        }
        Err(err) => {
            error!("Authentication check failed: {}", err);
            Err(err.into())
        }
    }
}

pub async fn open(state: &AppState, jar: &CookieJar) -> Result<ConsoleSession, ConsoleError> {
    let cookie = session_cookie(state, jar);
    let session = Session::resume(state.sessions.as_ref(), cookie.as_ref()).await?;
    let user = resolve_user(state, &session).await?;
    Ok(ConsoleSession { session, user })
}

/// Commit the session and refresh its cookie. Sessions that were never stored get no cookie.
pub async fn close(state: &AppState, mut session: Session, jar: CookieJar) -> Result<CookieJar, ConsoleError> {
    session.commit(state.sessions.as_ref()).await?;
    if session.is_new() {
        return Ok(jar);
    }

    let cookie = Cookie::build((state.config.session.cookie_name.clone(), session.cookie().encode()?))
        .path("/")
        .http_only(true)
        .secure(state.config.session.cookie_secure)
        .same_site(SameSite::Lax);
    Ok(jar.add(cookie))
}
