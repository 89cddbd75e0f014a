//! Turns a dispatched controller response into the HTTP response for its layout.

use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use serde_json::json;

use super::html::Node;
use super::pages::{page_shell, warning_page, WarningButton, WarningPage};
use crate::access::AccessDenial;
use crate::controller::{ControllerResponse, Dispatched, Layout, ResponseData};
use crate::types::ConsoleUser;

pub const LOGIN_URL: &str = "index.php";
pub const DASHBOARD_URL: &str = "zabbix.php?action=dashboard.view";

fn theme<'a>(user: &'a ConsoleUser, default_theme: &'a str) -> &'a str {
    user.theme.as_deref().filter(|t| !t.is_empty()).unwrap_or(default_theme)
}

pub fn denial_page(denial: &AccessDenial, theme: &str) -> WarningPage {
    let button = if denial.login_required {
        WarningButton {
            name: "login".to_string(),
            label: "Login".to_string(),
            url: LOGIN_URL.to_string(),
        }
    } else {
        WarningButton {
            name: "back".to_string(),
            label: "Go to dashboard".to_string(),
            url: DASHBOARD_URL.to_string(),
        }
    };

    WarningPage {
        header: denial.header.clone(),
        messages: denial.messages.clone(),
        buttons: vec![button],
        theme: theme.to_string(),
    }
}

fn json_response(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

fn render_data(layout: Layout, data: ResponseData, theme: &str) -> Response {
    match layout {
        Layout::Json => json_response(StatusCode::OK, data.main_block.unwrap_or_else(|| data.data.to_string())),
        Layout::Html => {
            let title = data.title.as_deref().unwrap_or("Netmon");
            let body = Node::Raw(data.main_block.unwrap_or_default());
            Html(page_shell(title, theme, body)).into_response()
        }
    }
}

pub fn render(dispatched: Dispatched, user: &ConsoleUser, default_theme: &str) -> Response {
    let theme = theme(user, default_theme);

    match dispatched.response {
        ControllerResponse::Data(data) => render_data(dispatched.layout, data, theme),
        ControllerResponse::Redirect(url) => (StatusCode::FOUND, [(header::LOCATION, url)]).into_response(),
        ControllerResponse::AccessDenied(denial) => {
            let status = StatusCode::from_u16(denial.status_code()).unwrap_or(StatusCode::FORBIDDEN);
            match dispatched.layout {
                Layout::Json => {
                    let body = json!({
                        "error": {
                            "title": denial.header,
                            "messages": denial.messages,
                        }
                    });
                    json_response(status, body.to_string())
                }
                Layout::Html => (status, Html(warning_page(&denial_page(&denial, theme)))).into_response(),
            }
        }
    }
}
