pub mod access;
pub mod api;
pub mod config;
pub mod controller;
pub mod controllers;
pub mod csrf;
pub mod database;
pub mod error;
pub mod handlers;
pub mod menu;
pub mod mfa;
pub mod middleware;
pub mod modules;
pub mod params;
pub mod profile;
pub mod session;
pub mod types;
pub mod urls;
pub mod validation;
pub mod views;

use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::access::{AccessPolicy, RoleAccessPolicy};
use crate::api::{ModuleApi, UserApi};
use crate::config::{AppConfig, SecurityConfig};
use crate::csrf::CsrfKey;
use crate::menu::Menu;
use crate::modules::ManifestLoader;
use crate::profile::{MemoryProfileBackend, ProfileBackend};
use crate::session::{MemorySessionStore, SessionStore};

/// Collaborators shared by all requests.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<dyn SessionStore>,
    pub profiles: Arc<dyn ProfileBackend>,
    pub modules: Arc<dyn ModuleApi>,
    pub users: Arc<dyn UserApi>,
    pub manifests: Arc<dyn ManifestLoader>,
    pub access: Arc<dyn AccessPolicy>,
    pub menu: Arc<Menu>,
    pub csrf: CsrfKey,
}

impl AppState {
    /// State with in-process session and profile storage and role-based access.
    pub fn new(
        config: AppConfig,
        modules: Arc<dyn ModuleApi>,
        users: Arc<dyn UserApi>,
        manifests: Arc<dyn ManifestLoader>,
    ) -> Self {
        Self {
            csrf: CsrfKey::new(&config.security.csrf_secret),
            config: Arc::new(config),
            sessions: Arc::new(MemorySessionStore::default()),
            profiles: Arc::new(MemoryProfileBackend::default()),
            modules,
            users,
            manifests,
            access: Arc::new(RoleAccessPolicy),
            menu: Arc::new(Menu::main()),
        }
    }

    pub fn with_profiles(mut self, profiles: Arc<dyn ProfileBackend>) -> Self {
        self.profiles = profiles;
        self
    }

    pub fn with_sessions(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = sessions;
        self
    }
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_credentials(true)
}

pub fn app(state: AppState) -> Router {
    use handlers::{actions, mfa, root};

    let enable_cors = state.config.security.enable_cors;
    let cors = cors_layer(&state.config.security);

    let router = Router::new()
        // Public
        .route("/", get(root::root))
        .route("/health", get(root::health))
        // Session-bound console pages
        .route("/zabbix.php", get(actions::handle_action).post(actions::handle_action))
        .route("/index_mfa.php", get(mfa::index_mfa).post(mfa::index_mfa))
        .with_state(state);

    let router = if enable_cors { router.layer(cors) } else { router };
    router.layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{LocalUserApi, MemoryModuleApi};
    use crate::modules::MemoryManifestLoader;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn state() -> AppState {
        AppState::new(
            AppConfig::development(),
            Arc::new(MemoryModuleApi::new(vec![])),
            Arc::new(LocalUserApi::new("Monitoring")),
            Arc::new(MemoryManifestLoader::default()),
        )
    }

    #[tokio::test]
    async fn test_health_route() {
        let response = app(state())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_guest_mfa_page_redirects_to_login() {
        let response = app(state())
            .oneshot(Request::builder().uri("/index_mfa.php").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()["location"], "index.php?form=default");
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let response = app(state())
            .oneshot(Request::builder().uri("/api/data").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
