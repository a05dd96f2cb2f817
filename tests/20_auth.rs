mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn login_returns_token_and_admin_identity() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/auth/login", server.base_url))
        .json(&json!({ "email": common::ADMIN_EMAIL, "password": common::ADMIN_PASSWORD }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["token"].as_str().unwrap().split('.').count(), 3);
    assert_eq!(body["data"]["admin"]["email"], common::ADMIN_EMAIL);
    assert!(body["data"]["admin"].get("password").is_none());
    Ok(())
}

#[tokio::test]
async fn bad_credentials_get_the_same_401_message() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let wrong_password = client
        .post(format!("{}/api/auth/login", server.base_url))
        .json(&json!({ "email": common::ADMIN_EMAIL, "password": "wrong-password" }))
        .send()
        .await?;
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    let wrong_password = wrong_password.json::<serde_json::Value>().await?;

    let unknown_email = client
        .post(format!("{}/api/auth/login", server.base_url))
        .json(&json!({ "email": "nobody@test.local", "password": "whatever1" }))
        .send()
        .await?;
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    let unknown_email = unknown_email.json::<serde_json::Value>().await?;

    // Same message either way, so the response does not leak which emails exist
    assert_eq!(wrong_password["message"], unknown_email["message"]);
    assert_eq!(wrong_password["success"], false);
    Ok(())
}

#[tokio::test]
async fn me_returns_profile_for_a_valid_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let token = common::admin_token(server).await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/auth/me", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["email"], common::ADMIN_EMAIL);
    assert!(body["data"].get("password").is_none());
    Ok(())
}

#[tokio::test]
async fn missing_token_is_401_and_bad_token_is_403() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let missing = client
        .get(format!("{}/api/auth/me", server.base_url))
        .send()
        .await?;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let garbage = client
        .get(format!("{}/api/auth/me", server.base_url))
        .bearer_auth("not-a-real-token")
        .send()
        .await?;
    assert_eq!(garbage.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn logout_acknowledges() -> Result<()> {
    let server = common::ensure_server().await?;
    let token = common::admin_token(server).await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/auth/logout", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], true);
    assert!(body["message"].as_str().unwrap().contains("Logged out"));
    Ok(())
}
