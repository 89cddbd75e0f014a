//! Collaborators reached through the backend API: the module registry and user authentication.
//!
//! Each collaborator is a trait with an in-memory implementation and a JSON-RPC one
//! ([`RpcClient`]) that talks to the monitoring backend.

pub mod local;
pub mod module;
pub mod rpc;
pub mod user;

use thiserror::Error;

pub use local::LocalUserApi;
pub use module::{MemoryModuleApi, ModuleApi, ModuleFilter, ModuleStatusUpdate};
pub use rpc::RpcClient;
pub use user::{
    ChallengeRequest, ConfirmData, ConfirmRequest, ConfirmedSession, MfaMethod, MfaResponseData, MfaType, UserApi,
};

/// Message the backend uses when a one-time code does not match.
pub const INCORRECT_CODE_MESSAGE: &str = "The verification code was incorrect, please try again.";

#[derive(Debug, Error)]
pub enum ApiClientError {
    /// The backend processed the call and refused it; `message` is meant for the user
    #[error("{message}")]
    Application { code: i64, message: String },

    #[error("HTTP transport error: {0}")]
    Transport(String),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

impl ApiClientError {
    pub fn application(message: impl Into<String>) -> Self {
        ApiClientError::Application {
            code: -32500,
            message: message.into(),
        }
    }

    /// User-facing message of an application error.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            ApiClientError::Application { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn is_incorrect_code(&self) -> bool {
        self.user_message() == Some(INCORRECT_CODE_MESSAGE)
    }
}

impl From<reqwest::Error> for ApiClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiClientError::InvalidResponse(err.to_string())
        } else {
            ApiClientError::Transport(err.to_string())
        }
    }
}
