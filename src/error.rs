// HTTP-facing error types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// Error surfaced to the HTTP layer with an appropriate status code and a client-friendly message
#[derive(Debug)]
pub enum ConsoleError {
    // 400 Bad Request
    BadRequest(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (backend API issues)
    BadGateway(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ConsoleError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ConsoleError::BadRequest(_) => 400,
            ConsoleError::Forbidden(_) => 403,
            ConsoleError::NotFound(_) => 404,
            ConsoleError::InternalServerError(_) => 500,
            ConsoleError::BadGateway(_) => 502,
            ConsoleError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ConsoleError::BadRequest(msg) => msg,
            ConsoleError::Forbidden(msg) => msg,
            ConsoleError::NotFound(msg) => msg,
            ConsoleError::InternalServerError(msg) => msg,
            ConsoleError::BadGateway(msg) => msg,
            ConsoleError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ConsoleError::BadRequest(_) => "BAD_REQUEST",
            ConsoleError::Forbidden(_) => "FORBIDDEN",
            ConsoleError::NotFound(_) => "NOT_FOUND",
            ConsoleError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ConsoleError::BadGateway(_) => "BAD_GATEWAY",
            ConsoleError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "title": self.message(),
            },
            "code": self.error_code()
        })
    }
}

impl ConsoleError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ConsoleError::BadRequest(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ConsoleError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ConsoleError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ConsoleError::InternalServerError(message.into())
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ConsoleError::BadGateway(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ConsoleError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ConsoleError
impl From<crate::session::SessionError> for ConsoleError {
    fn from(err: crate::session::SessionError) -> Self {
        match err {
            crate::session::SessionError::Cookie(msg) => ConsoleError::bad_request(msg),
            crate::session::SessionError::Storage(msg) => {
                tracing::error!("Session storage error: {}", msg);
                ConsoleError::service_unavailable("Session storage temporarily unavailable")
            }
        }
    }
}

impl From<crate::profile::ProfileError> for ConsoleError {
    fn from(err: crate::profile::ProfileError) -> Self {
        match err {
            crate::profile::ProfileError::Storage(msg) => {
                // Don't expose internal SQL errors to clients
                tracing::error!("Profile storage error: {}", msg);
                ConsoleError::internal_server_error("Cannot save user profile")
            }
            other => ConsoleError::bad_request(other.to_string()),
        }
    }
}

impl From<crate::validation::RuleError> for ConsoleError {
    fn from(err: crate::validation::RuleError) -> Self {
        tracing::error!("Invalid validation rules: {}", err);
        ConsoleError::internal_server_error("Invalid validation rules")
    }
}

impl From<crate::api::ApiClientError> for ConsoleError {
    fn from(err: crate::api::ApiClientError) -> Self {
        match err {
            crate::api::ApiClientError::Application { message, .. } => ConsoleError::bad_request(message),
            other => {
                tracing::error!("Backend API error: {}", other);
                ConsoleError::bad_gateway("Backend API request failed")
            }
        }
    }
}

impl From<crate::database::DatabaseError> for ConsoleError {
    fn from(err: crate::database::DatabaseError) -> Self {
        tracing::error!("Database error: {}", err);
        ConsoleError::service_unavailable("Database temporarily unavailable")
    }
}

// Standard error trait implementations
impl std::fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ConsoleError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ConsoleError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_and_body() {
        let err = ConsoleError::forbidden("Access denied");
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.to_json()["error"]["title"], "Access denied");

        let err = ConsoleError::bad_gateway("down");
        assert_eq!(err.status_code(), 502);
        assert_eq!(err.to_json()["code"], "BAD_GATEWAY");
    }

    #[test]
    fn test_profile_storage_error_is_hidden() {
        let err: ConsoleError = crate::profile::ProfileError::Storage("syntax error at or near".into()).into();
        assert_eq!(err.status_code(), 500);
        assert!(!err.message().contains("syntax"));
    }
}
