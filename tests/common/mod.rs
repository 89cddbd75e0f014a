#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use serde_json::{Map, Value};

use netmon_console::api::local::LocalMfa;
use netmon_console::api::{LocalUserApi, MemoryModuleApi};
use netmon_console::config::AppConfig;
use netmon_console::csrf::CsrfKey;
use netmon_console::modules::{ModuleRecord, MemoryManifestLoader};
use netmon_console::profile::MemoryProfileBackend;
use netmon_console::session::{MemorySessionStore, SessionCookie, SessionStore};
use netmon_console::types::{ConsoleUser, UserType};
use netmon_console::{app, AppState};

pub const COOKIE_NAME: &str = "zbx_session";
pub const CSRF_SECRET: &str = "integration-secret";

/// Console served in-process with in-memory collaborators the test can seed and inspect.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub sessions: MemorySessionStore,
    pub profiles: MemoryProfileBackend,
    pub modules: MemoryModuleApi,
    pub manifests: MemoryManifestLoader,
    pub users: LocalUserApi,
}

impl TestServer {
    pub async fn spawn(records: Vec<ModuleRecord>) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut config = AppConfig::development();
        config.server.port = port;
        config.security.enable_cors = false;
        config.security.csrf_secret = CSRF_SECRET.to_string();

        let sessions = MemorySessionStore::default();
        let profiles = MemoryProfileBackend::default();
        let modules = MemoryModuleApi::new(records);
        let manifests = MemoryManifestLoader::default();
        let users = LocalUserApi::new("Monitoring");

        let state = AppState::new(
            config,
            Arc::new(modules.clone()),
            Arc::new(users.clone()),
            Arc::new(manifests.clone()),
        )
        .with_sessions(Arc::new(sessions.clone()))
        .with_profiles(Arc::new(profiles.clone()));

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        let server = Self {
            port,
            base_url,
            sessions,
            profiles,
            modules,
            manifests,
            users,
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Store a browser session holding `entries` and return its Cookie header value.
    pub async fn browser_session(&self, entries: Map<String, Value>) -> Result<String> {
        let cookie = SessionCookie::generate();
        self.sessions.save(&cookie.sessionid, entries).await?;
        Ok(format!("{}={}", COOKIE_NAME, cookie.encode()?))
    }

    /// Log `user` in (password step, no second factor) and return the cookie and the user session id.
    pub async fn login(&self, user: ConsoleUser) -> Result<(String, String)> {
        let userid = user.userid;
        self.users.add_user(user, None).await;
        let (sessionid, _) = self.users.begin_login(userid).await?;

        let mut entries = Map::new();
        entries.insert("sessionid".to_string(), Value::String(sessionid.clone()));
        Ok((self.browser_session(entries).await?, sessionid))
    }

    /// Password step for a user with a TOTP second factor; the browser session carries `mfaid`.
    pub async fn login_pending_mfa(&self, user: ConsoleUser, mfa: LocalMfa) -> Result<String> {
        let userid = user.userid;
        self.users.add_user(user, Some(mfa)).await;
        let (sessionid, mfaid) = self.users.begin_login(userid).await?;

        let mut entries = Map::new();
        entries.insert("sessionid".to_string(), Value::String(sessionid));
        entries.insert("mfaid".to_string(), Value::from(mfaid));
        self.browser_session(entries).await
    }
}

/// Token the console accepts for `action` in the given user session.
pub fn csrf_token(sessionid: &str, action: &str) -> String {
    CsrfKey::new(CSRF_SECRET).token(sessionid, action)
}

pub fn client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().redirect(Policy::none()).build()?)
}

pub fn super_admin(userid: u64, username: &str) -> ConsoleUser {
    let mut user = ConsoleUser::guest();
    user.userid = userid;
    user.username = username.to_string();
    user.user_type = UserType::SuperAdmin;
    user.ui_rules = ["ui.administration.general", "ui.monitoring.dashboard"]
        .into_iter()
        .map(str::to_string)
        .collect();
    user
}

/// Session cookie value set by a response, as a Cookie header value.
pub fn response_cookie(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(COOKIE_NAME))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}
