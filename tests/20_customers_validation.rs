mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn invalid_request_lists_every_bad_field() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/customers", server.base_url))
        .json(&json!({
            "name": "",
            "email": "not-an-email",
            "packageId": "platinum",
            "phpVersion": "5.6"
        }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    for field in ["name", "email", "packageId", "phpVersion"] {
        assert!(body["details"][field].is_string(), "missing error for {}", field);
    }
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/customers", server.base_url))
        .header("content-type", "application/json")
        .body("{\"name\": ")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], "INVALID_JSON");
    Ok(())
}

#[tokio::test]
async fn unknown_customer_id_format_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(format!("{}/api/customers/not-a-uuid", server.base_url)).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
