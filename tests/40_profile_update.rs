mod common;

use anyhow::Result;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::StatusCode;
use serde_json::{json, Value};

use netmon_console::profile::{ProfileBackend, ProfileKey, ProfileValue};

#[tokio::test]
async fn stores_preference_for_logged_in_user() -> Result<()> {
    let server = common::TestServer::spawn(vec![]).await?;
    let (cookie, sessionid) = server.login(common::super_admin(7, "operator")).await?;

    let body = format!(
        "idx=web.modules.filter.active&value_int=1&_csrf_token={}",
        common::csrf_token(&sessionid, "profile.update")
    );
    let res = common::client()?
        .post(server.url("/zabbix.php?action=profile.update"))
        .header(COOKIE, cookie)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body)
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?, json!({}));

    let entries = server.profiles.load(7).await?;
    assert_eq!(
        entries.get(&ProfileKey::new("web.modules.filter.active", 0)),
        Some(&ProfileValue::Int(1))
    );
    assert_eq!(server.profiles.commit_count(), 1);
    Ok(())
}

#[tokio::test]
async fn guest_writes_nothing() -> Result<()> {
    let server = common::TestServer::spawn(vec![]).await?;

    let res = common::client()?
        .get(server.url("/zabbix.php?action=profile.update&idx=web.modules.filter.active&value_int=1"))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(server.profiles.commit_count(), 0);
    Ok(())
}
