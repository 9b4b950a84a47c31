#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use survey_api::app::{router, AppState};
use survey_api::auth::{generate_jwt, Claims};
use survey_api::config::config;
use survey_api::database::models::{NewUser, UserProfile};
use survey_api::database::{MemoryStore, Store};

pub const ADMIN_EMAIL: &str = "admin@survey.test";
pub const ADMIN_PASSWORD: &str = "Adm1n!Secret";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // An empty DATABASE_URL keeps the server on the in-memory store even when .env names a database
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_survey-api"));
        cmd.env("SURVEY_API_PORT", port.to_string())
            .env("SERVER_HOST", "127.0.0.1")
            .env("APP_ENV", "development")
            .env("DATABASE_URL", "")
            .env("ADMIN_EMAIL", ADMIN_EMAIL)
            .env("ADMIN_PASSWORD", ADMIN_PASSWORD)
            .env("BCRYPT_COST", "4")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

// The child is killed when the owning test drops its handle, including on panic.
impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Start a server binary for one test and wait until it answers `/health`.
pub async fn spawn_server() -> Result<TestServer> {
    let server = TestServer::spawn()?;
    server.wait_ready(Duration::from_secs(15)).await?;
    Ok(server)
}

/// Unique address so tests sharing a store never collide.
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@survey.test", prefix, uuid::Uuid::new_v4().simple())
}

/// In-process application backed by a fresh in-memory store.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::with_default_roles());
        let shared: Arc<dyn Store> = store.clone();
        let router = router(AppState::new(shared), &config().security);
        Self { store, router }
    }

    /// Insert a user holding `role` and return a token for it. The stored hash is never checked.
    pub async fn user_with_role(&self, email: &str, role: &str) -> (UserProfile, String) {
        let user = self
            .store
            .create_user_with_role(
                NewUser {
                    full_name: "Test User".to_string(),
                    email: email.to_string(),
                    password_hash: "unused".to_string(),
                },
                role,
            )
            .await
            .expect("create user");
        let token = generate_jwt(&Claims::new(user.id, user.email.clone())).expect("token");
        (user.profile(), token)
    }

    pub async fn send(&self, method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, path, token, None).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, path, token, Some(body)).await
    }
}
