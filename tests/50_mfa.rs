mod common;

use anyhow::{Context, Result};
use reqwest::header::{CONTENT_TYPE, COOKIE, LOCATION};
use reqwest::StatusCode;
use serde_json::Map;

use netmon_console::api::local::LocalMfa;
use netmon_console::api::{MfaType, INCORRECT_CODE_MESSAGE};
use netmon_console::session::{SessionCookie, SessionStore};

fn totp(secret: Option<&str>) -> LocalMfa {
    LocalMfa {
        mfaid: 2,
        kind: MfaType::Totp,
        name: "Authenticator".to_string(),
        totp_secret: secret.map(str::to_string),
    }
}

#[tokio::test]
async fn no_pending_factor_redirects_to_login() -> Result<()> {
    let server = common::TestServer::spawn(vec![]).await?;
    let cookie = server.browser_session(Map::new()).await?;

    let res = common::client()?
        .get(server.url("/index_mfa.php?request=zabbix.php%3Faction%3Dproblem.view"))
        .header(COOKIE, cookie)
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(
        res.headers()[LOCATION],
        "index.php?form=default&request=zabbix.php%3Faction%3Dproblem.view"
    );
    Ok(())
}

#[tokio::test]
async fn challenge_page_then_code_confirmation() -> Result<()> {
    let server = common::TestServer::spawn(vec![]).await?;
    let cookie = server
        .login_pending_mfa(common::super_admin(1, "Admin"), totp(Some("JBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXP")))
        .await?;

    // Challenge
    let res = common::client()?
        .get(server.url("/index_mfa.php"))
        .header(COOKIE, &cookie)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let html = res.text().await?;
    assert!(html.contains("name=\"verification_code\""));

    // Confirmation
    let code = server.users.current_code(1).await.context("no code")?;
    let res = common::client()?
        .post(server.url("/index_mfa.php"))
        .header(COOKIE, &cookie)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(format!("enter=1&verification_code={}", code))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()[LOCATION], "zabbix.php?action=dashboard.view");

    // The browser session is bound to the authenticated user session, the factor is done
    let value = cookie.split_once('=').map(|(_, v)| v).context("cookie")?;
    let id = SessionCookie::decode(value)?.sessionid;
    let data = server.sessions.load(&id).await?.context("session")?;
    assert!(data.get("mfaid").is_none());
    assert!(data.get("sessionid").and_then(|v| v.as_str()).is_some_and(|s| !s.is_empty()));
    Ok(())
}

#[tokio::test]
async fn incorrect_code_keeps_enrollment_fields() -> Result<()> {
    let server = common::TestServer::spawn(vec![]).await?;
    let cookie = server
        .login_pending_mfa(common::super_admin(1, "Admin"), totp(Some("JBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXP")))
        .await?;

    let current = server.users.current_code(1).await.context("no code")?;
    let wrong = if current == "000000" { "111111" } else { "000000" };

    let res = common::client()?
        .post(server.url("/index_mfa.php"))
        .header(COOKIE, &cookie)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(format!(
            "enter=1&verification_code={}&totp_secret=NEWSECRET&hash_function=SHA1&qr_code_url=otpauth%3A%2F%2Ftotp%2Fx",
            wrong
        ))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    let html = res.text().await?;
    assert!(html.contains(INCORRECT_CODE_MESSAGE));
    assert!(html.contains("name=\"totp_secret\" value=\"NEWSECRET\""));
    assert!(html.contains("name=\"qr_code_url\" value=\"otpauth://totp/x\""));
    Ok(())
}

#[tokio::test]
async fn cookieless_requests_store_no_sessions() -> Result<()> {
    let server = common::TestServer::spawn(vec![]).await?;
    let client = common::client()?;

    for _ in 0..20 {
        let res = client.get(server.url("/index_mfa.php")).send().await?;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert!(common::response_cookie(&res).is_none());
    }

    assert_eq!(server.sessions.len().await, 0);
    Ok(())
}
