use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::DatabaseManager;

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Netmon console",
            "version": version,
            "description": "Administrative web console for a network monitoring platform",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "actions": "/zabbix.php?action=<name> (session)",
                "mfa": "/index_mfa.php (login second factor)",
            }
        }
    }))
}

pub async fn health() -> impl IntoResponse {
    let now = chrono::Utc::now();

    if !DatabaseManager::is_initialized() {
        return (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "not configured"
                }
            })),
        );
    }

    match DatabaseManager::health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
