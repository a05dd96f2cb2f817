mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

// One test function: the password change would race the login helper if the
// steps ran concurrently with other tests against the same admin.
#[tokio::test]
async fn change_password_cycle() -> Result<()> {
    let server = common::ensure_server().await?;
    let token = common::admin_token(server).await?;
    let client = reqwest::Client::new();
    let url = format!("{}/api/auth/change-password", server.base_url);

    // Wrong current password is rejected
    let res = client
        .post(&url)
        .bearer_auth(&token)
        .json(&json!({ "currentPassword": "nope-nope", "newPassword": "replacement1" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Too-short replacement is rejected
    let res = client
        .post(&url)
        .bearer_auth(&token)
        .json(&json!({ "currentPassword": common::ADMIN_PASSWORD, "newPassword": "tiny" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Real change goes through
    let res = client
        .post(&url)
        .bearer_auth(&token)
        .json(&json!({ "currentPassword": common::ADMIN_PASSWORD, "newPassword": "replacement1" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    // Old password no longer logs in; the new one does
    let res = client
        .post(format!("{}/api/auth/login", server.base_url))
        .json(&json!({ "email": common::ADMIN_EMAIL, "password": common::ADMIN_PASSWORD }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(format!("{}/api/auth/login", server.base_url))
        .json(&json!({ "email": common::ADMIN_EMAIL, "password": "replacement1" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    // Restore the original password for hygiene
    let res = client
        .post(&url)
        .bearer_auth(&token)
        .json(&json!({ "currentPassword": "replacement1", "newPassword": common::ADMIN_PASSWORD }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}
