use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use netmon_console::api::{LocalUserApi, MemoryModuleApi, RpcClient};
use netmon_console::config::{self, AppConfig};
use netmon_console::database::{DatabaseManager, PgProfileBackend};
use netmon_console::modules::{scan_modules, FsManifestLoader, ManifestLoader, ModuleRecord, ModuleStatus};
use netmon_console::types::{ConsoleUser, UserType};
use netmon_console::{app, AppState};

#[derive(Parser)]
#[command(name = "netmon-console")]
#[command(about = "Administrative web console for a network monitoring platform")]
#[command(version)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "CONSOLE_PORT")]
    port: Option<u16>,

    /// Directory holding the frontend modules
    #[arg(long, env = "MODULES_DIR")]
    modules_dir: Option<PathBuf>,
}

/// Registry of every module found on disk, all disabled.
async fn scan_registry(root: &Path, loader: &FsManifestLoader) -> Vec<ModuleRecord> {
    let paths = match scan_modules(root).await {
        Ok(paths) => paths,
        Err(e) => {
            tracing::warn!("Cannot scan module directory {}: {}", root.display(), e);
            return Vec::new();
        }
    };

    let mut records = Vec::new();
    for (index, relative_path) in paths.into_iter().enumerate() {
        let id = match loader.load(&relative_path).await {
            Some(manifest) => manifest.id,
            None => continue,
        };
        records.push(ModuleRecord {
            moduleid: index as u64 + 1,
            id,
            relative_path,
            status: ModuleStatus::Disabled,
            config: serde_json::Value::Object(Default::default()),
        });
    }
    records
}

fn local_admin() -> ConsoleUser {
    ConsoleUser {
        userid: 1,
        username: "Admin".to_string(),
        user_type: UserType::SuperAdmin,
        ui_rules: [
            "ui.monitoring.dashboard",
            "ui.monitoring.problems",
            "ui.monitoring.hosts",
            "ui.configuration.hosts",
            "ui.configuration.templates",
            "ui.administration.general",
            "ui.administration.users",
        ]
        .into_iter()
        .map(str::to_string)
        .collect(),
        ..ConsoleUser::guest()
    }
}

async fn build_state(config: AppConfig) -> anyhow::Result<AppState> {
    let loader = FsManifestLoader::new(config.modules.root_dir.clone());

    let state = match &config.api.url {
        Some(url) => {
            tracing::info!("Using backend API at {}", url);
            let client = Arc::new(RpcClient::new(url.clone(), Duration::from_secs(config.api.timeout_secs))?);
            AppState::new(config.clone(), client.clone(), client, Arc::new(loader))
        }
        None => {
            let records = scan_registry(&config.modules.root_dir, &loader).await;
            tracing::info!("No backend API configured, {} module(s) registered in memory", records.len());

            let users = LocalUserApi::new(config.ui.totp_issuer.clone());
            users.add_user(local_admin(), None).await;

            AppState::new(
                config.clone(),
                Arc::new(MemoryModuleApi::new(records)),
                Arc::new(users),
                Arc::new(loader),
            )
        }
    };

    if config.database.url.is_some() {
        let pool = DatabaseManager::init(&config.database)
            .await
            .context("failed to connect to the profile database")?;
        return Ok(state.with_profiles(Arc::new(PgProfileBackend::new(pool))));
    }

    Ok(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so BACKEND_API_URL, DATABASE_URL etc. are picked up
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = config::config().clone();
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(dir) = cli.modules_dir {
        config.modules.root_dir = dir;
    }
    tracing::info!("Starting netmon console in {:?} mode", config.environment);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let state = build_state(config).await?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await.context("server error")?;
    Ok(())
}
