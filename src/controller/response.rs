use serde_json::Value;

use crate::access::AccessDenial;

/// How a response's data is turned into the HTTP body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `main_block` is sent as-is with a JSON content type
    Json,
    /// Rendered into a full HTML page
    Html,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseData {
    /// Pre-rendered body, used by JSON actions
    pub main_block: Option<String>,
    /// Data bag handed to the view
    pub data: Value,
    pub title: Option<String>,
}

impl ResponseData {
    pub fn main_block(body: impl Into<String>) -> Self {
        Self {
            main_block: Some(body.into()),
            ..Default::default()
        }
    }

    pub fn json(value: &Value) -> Self {
        Self::main_block(value.to_string())
    }

    pub fn view(data: Value) -> Self {
        Self {
            data,
            ..Default::default()
        }
    }
}

/// Outcome of one controller run. Exactly one is produced per request.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerResponse {
    Data(ResponseData),
    Redirect(String),
    AccessDenied(AccessDenial),
}

impl ControllerResponse {
    pub fn is_access_denied(&self) -> bool {
        matches!(self, ControllerResponse::AccessDenied(_))
    }

    /// Parsed JSON main block, if this is a JSON data response.
    pub fn json_body(&self) -> Option<Value> {
        match self {
            ControllerResponse::Data(ResponseData {
                main_block: Some(body),
                ..
            }) => serde_json::from_str(body).ok(),
            _ => None,
        }
    }
}
