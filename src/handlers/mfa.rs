use axum::body::Bytes;
use axum::extract::{RawQuery, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;

use super::{host_header, request_params};
use crate::error::ConsoleError;
use crate::mfa::{MfaFlow, MfaOutcome, MfaRequest};
use crate::middleware;
use crate::session::Session;
use crate::AppState;

/// GET|POST /index_mfa.php
pub async fn index_mfa(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    jar: CookieJar,
    body: Bytes,
) -> Result<Response, ConsoleError> {
    let params = request_params(query.as_deref(), &headers, &body)?;
    let request_uri = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or(uri.path());
    let input = MfaRequest::from_params(&params, host_header(&headers), state.config.server.https, request_uri);

    // Only the session entries matter here; the user is not logged in yet
    let cookie = middleware::session::session_cookie(&state, &jar);
    let mut session = Session::resume(state.sessions.as_ref(), cookie.as_ref()).await?;

    let flow = MfaFlow::new(
        state.users.as_ref(),
        state.access.as_ref(),
        &state.menu,
        &state.config.ui.default_theme,
    );
    let outcome = flow.run(&mut session, &input).await;

    let jar = middleware::close(&state, session, jar).await?;
    let response = match outcome {
        MfaOutcome::Render(page) => Html(page).into_response(),
        MfaOutcome::Redirect(url) => (StatusCode::FOUND, [(header::LOCATION, url)]).into_response(),
    };

    Ok((jar, response).into_response())
}
