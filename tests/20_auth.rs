mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn register_then_login() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let email = common::unique_email("ana");

    let res = client
        .post(server.url("/auth/register"))
        .json(&json!({ "fullName": "Ana", "email": email, "passwordHash": "Str0ng!Pass" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["message"], "User registered successfully");
    assert_eq!(body["data"]["user"]["fullName"], "Ana");
    assert!(body["data"]["user"].get("passwordHash").is_none());

    let res = client
        .post(server.url("/auth/login"))
        .json(&json!({ "email": email, "passwordHash": "Str0ng!Pass" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    let token = body["data"]["token"].as_str().unwrap_or_default().to_string();
    assert!(!token.is_empty());

    let me = client
        .get(server.url("/user/me"))
        .bearer_auth(&token)
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(me["data"]["email"], email.as_str());
    Ok(())
}

#[tokio::test]
async fn duplicate_registration_conflicts() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let payload = json!({
        "fullName": "Bia",
        "email": common::unique_email("bia"),
        "passwordHash": "Str0ng!Pass",
    });

    let first = client.post(server.url("/auth/register")).json(&payload).send().await?;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = client.post(server.url("/auth/register")).json(&payload).send().await?;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body = second.json::<Value>().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "CONFLICT");
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_rejected() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let email = common::unique_email("caio");

    client
        .post(server.url("/auth/register"))
        .json(&json!({ "fullName": "Caio", "email": email, "passwordHash": "Str0ng!Pass" }))
        .send()
        .await?;

    let res = client
        .post(server.url("/auth/login"))
        .json(&json!({ "email": email, "passwordHash": "Wr0ng!Pass" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(server.url("/auth/login"))
        .json(&json!({ "email": common::unique_email("nobody"), "passwordHash": "Str0ng!Pass" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn weak_password_fails_validation() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = reqwest::Client::new()
        .post(server.url("/auth/register"))
        .json(&json!({ "fullName": "Duda", "email": common::unique_email("duda"), "passwordHash": "weak" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    Ok(())
}

#[tokio::test]
async fn bootstrap_admin_can_reach_admin_routes() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let login = client
        .post(server.url("/auth/login"))
        .json(&json!({ "email": common::ADMIN_EMAIL, "passwordHash": common::ADMIN_PASSWORD }))
        .send()
        .await?
        .json::<Value>()
        .await?;
    let token = login["data"]["token"].as_str().unwrap_or_default().to_string();

    let res = client.get(server.url("/role")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let roles = res.json::<Value>().await?;
    let names: Vec<&str> = roles["data"]
        .as_array()
        .map(|roles| roles.iter().filter_map(|role| role["name"].as_str()).collect())
        .unwrap_or_default();
    assert!(names.contains(&"ADMIN"));
    assert!(names.contains(&"PATIENT"));
    Ok(())
}
