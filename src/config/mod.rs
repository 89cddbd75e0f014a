use once_cell::sync::Lazy;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub modules: ModulesConfig,
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub ui: UiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Whether the console is served over TLS (affects provider redirect URIs)
    pub https: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModulesConfig {
    /// Directory holding one sub-directory (with manifest.json) per frontend module
    pub root_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// JSON-RPC endpoint of the monitoring backend; in-memory collaborators are used when unset
    pub url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Profile storage; profiles are kept in memory when unset
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    pub default_theme: String,
    pub totp_issuer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    /// Signs CSRF tokens. Random per process unless `SECURITY_CSRF_SECRET` is set, which is
    /// needed when several console processes serve the same sessions.
    #[serde(skip_serializing, default = "random_secret")]
    pub csrf_secret: String,
}

fn random_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("CONSOLE_PORT").or_else(|_| env::var("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("CONSOLE_HTTPS") {
            self.server.https = v.parse().unwrap_or(self.server.https);
        }

        // Session overrides
        if let Ok(v) = env::var("SESSION_COOKIE_NAME") {
            if !v.trim().is_empty() {
                self.session.cookie_name = v.trim().to_string();
            }
        }
        if let Ok(v) = env::var("SESSION_COOKIE_SECURE") {
            self.session.cookie_secure = v.parse().unwrap_or(self.session.cookie_secure);
        }

        // Module overrides
        if let Ok(v) = env::var("MODULES_DIR") {
            self.modules.root_dir = PathBuf::from(v);
        }

        // Backend API overrides
        if let Ok(v) = env::var("BACKEND_API_URL") {
            self.api.url = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Ok(v) = env::var("BACKEND_API_TIMEOUT_SECS") {
            self.api.timeout_secs = v.parse().unwrap_or(self.api.timeout_secs);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }

        // UI overrides
        if let Ok(v) = env::var("UI_DEFAULT_THEME") {
            self.ui.default_theme = v;
        }
        if let Ok(v) = env::var("UI_TOTP_ISSUER") {
            self.ui.totp_issuer = v;
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_CSRF_SECRET") {
            if !v.trim().is_empty() {
                self.security.csrf_secret = v.trim().to_string();
            }
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 8080,
                https: false,
            },
            session: SessionConfig {
                cookie_name: "zbx_session".to_string(),
                cookie_secure: false,
            },
            modules: ModulesConfig {
                root_dir: PathBuf::from("modules"),
            },
            api: ApiConfig {
                url: None,
                timeout_secs: 30,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
            },
            ui: UiConfig {
                default_theme: "blue-theme".to_string(),
                totp_issuer: "Monitoring".to_string(),
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:8080".to_string()],
                csrf_secret: random_secret(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 8080,
                https: true,
            },
            session: SessionConfig {
                cookie_name: "zbx_session".to_string(),
                cookie_secure: true,
            },
            modules: ModulesConfig {
                root_dir: PathBuf::from("/usr/share/netmon/modules"),
            },
            api: ApiConfig {
                url: None,
                timeout_secs: 15,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
            },
            ui: UiConfig {
                default_theme: "blue-theme".to_string(),
                totp_issuer: "Monitoring".to_string(),
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                csrf_secret: random_secret(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 80,
                https: true,
            },
            session: SessionConfig {
                cookie_name: "zbx_session".to_string(),
                cookie_secure: true,
            },
            modules: ModulesConfig {
                root_dir: PathBuf::from("/usr/share/netmon/modules"),
            },
            api: ApiConfig {
                url: None,
                timeout_secs: 10,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
            },
            ui: UiConfig {
                default_theme: "blue-theme".to_string(),
                totp_issuer: "Monitoring".to_string(),
            },
            security: SecurityConfig {
                enable_cors: false,
                cors_origins: vec![],
                csrf_secret: random_secret(),
            },
        }
    }
}

/// Process-wide configuration, read from the environment on first access.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}
