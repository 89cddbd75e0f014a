use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, error};

use super::module::{ModuleApi, ModuleFilter, ModuleStatusUpdate};
use super::user::{ChallengeRequest, ConfirmData, ConfirmRequest, ConfirmedSession, UserApi};
use super::ApiClientError;
use crate::modules::ModuleRecord;
use crate::types::ConsoleUser;

#[derive(Debug, Serialize)]
struct RpcRequest<'a, P: Serialize> {
    jsonrpc: &'static str,
    method: &'a str,
    params: P,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

/// JSON-RPC 2.0 client for the monitoring backend API.
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ApiClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Call `method`. `auth` is the session id of the user the call is made for.
    pub async fn call<P, R>(&self, method: &str, params: P, auth: Option<&str>) -> Result<R, ApiClientError>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };

        let mut builder = self.http.post(&self.url).json(&request);
        if let Some(auth) = auth.filter(|a| !a.is_empty()) {
            builder = builder.bearer_auth(auth);
        }

        debug!("API call {} (id {})", method, request.id);
        let response: RpcResponse = builder.send().await?.error_for_status()?.json().await?;

        if let Some(err) = response.error {
            let message = err.data.filter(|d| !d.is_empty()).unwrap_or(err.message);
            debug!("API call {} failed: {}", method, message);
            return Err(ApiClientError::Application { code: err.code, message });
        }

        let result = response
            .result
            .ok_or_else(|| ApiClientError::InvalidResponse(format!("{}: no result", method)))?;
        serde_json::from_value(result).map_err(|e| {
            error!("Unexpected {} result: {}", method, e);
            ApiClientError::InvalidResponse(e.to_string())
        })
    }
}

#[async_trait]
impl ModuleApi for RpcClient {
    async fn get(&self, auth: &str, filter: &ModuleFilter) -> Result<Vec<ModuleRecord>, ApiClientError> {
        let mut params = json!({
            "output": ["moduleid", "id", "relative_path", "status", "config"],
        });
        if let Some(ids) = &filter.moduleids {
            params["moduleids"] = json!(ids.iter().map(|id| id.to_string()).collect::<Vec<_>>());
        }
        if let Some(sortfield) = filter.sortfield {
            params["sortfield"] = json!(sortfield);
        }

        self.call("module.get", params, Some(auth)).await
    }

    async fn update(&self, auth: &str, updates: &[ModuleStatusUpdate]) -> Result<bool, ApiClientError> {
        #[derive(Deserialize)]
        struct Updated {
            #[serde(default)]
            moduleids: Vec<Value>,
        }

        let updated: Updated = self.call("module.update", updates, Some(auth)).await?;
        Ok(updated.moduleids.len() == updates.len())
    }
}

#[async_trait]
impl UserApi for RpcClient {
    async fn get_confirm_data(&self, request: &ChallengeRequest) -> Result<ConfirmData, ApiClientError> {
        self.call("user.getConfirmData", request, None).await
    }

    async fn confirm(&self, request: &ConfirmRequest) -> Result<Option<ConfirmedSession>, ApiClientError> {
        // The backend answers `false` when it declines without an error
        let result: Value = self.call("user.confirm", request, None).await?;
        match result {
            Value::Bool(false) | Value::Null => Ok(None),
            other => serde_json::from_value(other)
                .map(Some)
                .map_err(|e| ApiClientError::InvalidResponse(e.to_string())),
        }
    }

    async fn check_authentication(&self, sessionid: &str) -> Result<ConsoleUser, ApiClientError> {
        let mut user: ConsoleUser = self
            .call("user.checkAuthentication", json!({ "sessionid": sessionid }), None)
            .await?;
        user.sessionid = sessionid.to_string();
        Ok(user)
    }
}
