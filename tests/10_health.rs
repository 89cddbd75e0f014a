mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::TestServer::spawn(vec![]).await?;

    let res = common::client()?.get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"], "not configured");
    Ok(())
}

#[tokio::test]
async fn root_lists_endpoints() -> Result<()> {
    let server = common::TestServer::spawn(vec![]).await?;

    let body = common::client()?
        .get(server.url("/"))
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    assert_eq!(body["success"], true);
    assert!(body["data"]["endpoints"]["mfa"].is_string());
    Ok(())
}

#[tokio::test]
async fn unknown_action_is_not_found() -> Result<()> {
    let server = common::TestServer::spawn(vec![]).await?;

    let res = common::client()?
        .get(server.url("/zabbix.php?action=does.not.exist"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
