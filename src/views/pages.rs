//! Full pages: the page shell, the MFA code-entry page and the general warning page.

use serde::Serialize;

use super::html::{button, div, hidden, Node, Tag};

pub const DEFAULT_THEME: &str = "blue-theme";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarningButton {
    pub name: String,
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarningPage {
    pub header: String,
    pub messages: Vec<String>,
    pub buttons: Vec<WarningButton>,
    pub theme: String,
}

impl WarningPage {
    /// Warning offering a way back to the login form.
    pub fn not_logged_in(messages: Vec<String>, login_url: &str, theme: &str) -> Self {
        Self {
            header: "You are not logged in".to_string(),
            messages,
            buttons: vec![WarningButton {
                name: "login".to_string(),
                label: "Login".to_string(),
                url: login_url.to_string(),
            }],
            theme: theme.to_string(),
        }
    }
}

/// Data of the code-entry page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MfaLoginPage {
    pub name: String,
    pub qr_code_url: Option<String>,
    pub totp_secret: Option<String>,
    pub hash_function: Option<String>,
    pub error: Option<String>,
    pub theme: String,
}

/// Error list shown above page content.
pub fn message_box(messages: &[String]) -> Tag {
    let list = Tag::new("ul")
        .class("list-dashed")
        .children(messages.iter().map(|m| Tag::new("li").child(m.as_str())));
    div()
        .class("msg-bad")
        .attr("role", "alert")
        .child(list)
}

fn theme_or_default(theme: &str) -> &str {
    if theme.is_empty() {
        DEFAULT_THEME
    } else {
        theme
    }
}

/// Complete HTML document around `body`.
pub fn page_shell(title: &str, theme: &str, body: impl Into<Node>) -> String {
    let head = Tag::new("head")
        .child(Tag::new("meta").attr("charset", "utf-8"))
        .child(Tag::new("title").child(title))
        .child(
            Tag::new("link")
                .attr("rel", "stylesheet")
                .attr("href", format!("assets/styles/{}.css", theme_or_default(theme))),
        );
    let html = Tag::new("html")
        .attr("lang", "en")
        .child(head)
        .child(Tag::new("body").child(body));
    format!("<!DOCTYPE html>\n{}", html.render())
}

pub fn warning_page(page: &WarningPage) -> String {
    let buttons = div().class("warning-footer").children(page.buttons.iter().map(|b| {
        button(&b.name, b.label.as_str())
            .attr("data-url", b.url.as_str())
            .attr("onclick", "document.location = this.dataset.url;")
    }));

    let mut body = div().class("msg-global").class("msg-bad").child(Tag::new("h1").child(page.header.as_str()));
    if !page.messages.is_empty() {
        body = body.child(message_box(&page.messages));
    }
    let content = div().class("wrapper").child(body.child(buttons));

    page_shell("Warning", &page.theme, content)
}

pub fn mfa_login_page(page: &MfaLoginPage) -> String {
    let mut form = Tag::new("form")
        .attr("method", "post")
        .attr("action", "index_mfa.php")
        .attr("accept-charset", "utf-8")
        .child(hidden("enter", "1"));

    if let Some(error) = &page.error {
        form = form.child(div().class("red").attr("role", "alert").child(error.as_str()));
    }

    // Enrollment: show the secret to register in the authenticator app
    if let (Some(qr), Some(secret)) = (&page.qr_code_url, &page.totp_secret) {
        form = form
            .child(div().class("mfa-enroll").child("Scan this QR code"))
            .child(
                div()
                    .class("qr-code")
                    .child(Tag::new("a").attr("href", qr.as_str()).child(Tag::new("img").attr("src", qr.as_str()).attr("alt", "QR code"))),
            )
            .child(div().class("mfa-secret").child(format!("Or enter this secret key: {}", secret)))
            .child(hidden("qr_code_url", qr.as_str()));
    }

    if let Some(secret) = &page.totp_secret {
        form = form.child(hidden("totp_secret", secret.as_str()));
    }
    if let Some(hash) = &page.hash_function {
        form = form.child(hidden("hash_function", hash.as_str()));
    }

    form = form
        .child(Tag::new("label").attr("for", "verification_code").child("Verification code"))
        .child(
            Tag::new("input")
                .attr("type", "text")
                .attr("id", "verification_code")
                .attr("name", "verification_code")
                .attr("autocomplete", "one-time-code")
                .attr("inputmode", "numeric")
                .attr("autofocus", "autofocus"),
        )
        .child(Tag::new("button").attr("type", "submit").child("Sign in"));

    let content = div()
        .class("signin-container")
        .child(div().class("signin-logo"))
        .maybe_child((!page.name.is_empty()).then(|| div().class("mfa-method").child(page.name.as_str())))
        .child(form);

    page_shell("Multi-factor authentication", &page.theme, content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_page_has_login_button() {
        let page = WarningPage::not_logged_in(vec!["Session expired".to_string()], "index.php?form=default", "");
        let html = warning_page(&page);

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h1>You are not logged in</h1>"));
        assert!(html.contains("data-url=\"index.php?form=default\""));
        assert!(html.contains("<li>Session expired</li>"));
        assert!(html.contains("blue-theme.css"));
    }

    #[test]
    fn test_mfa_page_keeps_enrollment_data() {
        let page = MfaLoginPage {
            qr_code_url: Some("otpauth://totp/Netmon:Admin?secret=ABC".to_string()),
            totp_secret: Some("ABC".to_string()),
            hash_function: Some("SHA1".to_string()),
            error: Some("The verification code was incorrect, please try again.".to_string()),
            ..Default::default()
        };
        let html = mfa_login_page(&page);

        assert!(html.contains("name=\"totp_secret\" value=\"ABC\""));
        assert!(html.contains("name=\"qr_code_url\" value=\"otpauth://totp/Netmon:Admin?secret=ABC\""));
        assert!(html.contains("name=\"hash_function\" value=\"SHA1\""));
        assert!(html.contains("The verification code was incorrect"));
    }

    #[test]
    fn test_mfa_page_without_enrollment() {
        let html = mfa_login_page(&MfaLoginPage::default());
        assert!(!html.contains("qr_code_url"));
        assert!(html.contains("name=\"verification_code\""));
    }
}
