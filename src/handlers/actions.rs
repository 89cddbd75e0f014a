//! `/zabbix.php?action=<name>`: resolves the controller for an action and dispatches it.

use axum::body::Bytes;
use axum::extract::{RawQuery, State};
use axum::http::{HeaderMap, Method};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, warn};

use super::request_params;
use crate::controller::{dispatch, ActionContext, Controller};
use crate::controllers::{ModuleUpdate, ProfileUpdate};
use crate::csrf::CSRF_TOKEN_NAME;
use crate::error::ConsoleError;
use crate::middleware;
use crate::params::scalar_string;
use crate::profile::Profile;
use crate::AppState;

fn controller_for(action: &str, state: &AppState) -> Option<Box<dyn Controller>> {
    match action {
        "module.update" => Some(Box::new(ModuleUpdate::new(state.modules.clone(), state.manifests.clone()))),
        "profile.update" => Some(Box::new(ProfileUpdate)),
        _ => None,
    }
}

/// Every state-changing action needs a token bound to the user's session.
fn requires_csrf(method: &Method) -> bool {
    method == Method::POST
}

pub async fn handle_action(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    jar: CookieJar,
    body: Bytes,
) -> Result<Response, ConsoleError> {
    let params = request_params(query.as_deref(), &headers, &body)?;

    let action = params.get("action").and_then(scalar_string).unwrap_or_default();
    let Some(mut controller) = controller_for(&action, &state) else {
        warn!("Unknown action \"{}\"", action);
        return Err(ConsoleError::not_found("Page not found"));
    };

    let middleware::ConsoleSession { session, user } = middleware::open(&state, &jar).await?;

    if requires_csrf(&method) {
        let token = params.get(CSRF_TOKEN_NAME).and_then(scalar_string).unwrap_or_default();
        if !state.csrf.verify(&user.sessionid, &action, &token) {
            warn!("Rejected {} for {}: invalid CSRF token", action, user.username);
            return Err(ConsoleError::forbidden("Access denied"));
        }
    }

    let profile = if user.is_guest() {
        Profile::new(user.userid, Default::default())
    } else {
        Profile::load(state.profiles.as_ref(), user.userid).await?
    };

    let mut ctx = ActionContext::new(action, params, user, session, profile, state.access.clone());
    let dispatched = dispatch(controller.as_mut(), &mut ctx, state.profiles.as_ref()).await?;
    info!("{} by {} ended in {:?}", ctx.action, ctx.user.username, dispatched.state);

    let response = crate::views::render(dispatched, &ctx.user, &state.config.ui.default_theme);
    let jar = middleware::close(&state, ctx.session, jar).await?;

    Ok((jar, response).into_response())
}
