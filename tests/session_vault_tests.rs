//! Session lifecycle tests: login populates the session and its vault file,
//! a new process seeds from the vault, refresh rewrites the stored access
//! token, and logout wipes everything.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tempfile::tempdir;

use enplace::{ApiClient, ClientConfig};

const FIRST_ACCESS: &str = "access-first";
const FRESH_ACCESS: &str = "access-fresh";
const REFRESH: &str = "refresh-1";

#[derive(Clone)]
struct Backend {
    refresh_hits: Arc<AtomicUsize>,
}

async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body.get("email").and_then(Value::as_str) != Some("alice@kitchen.example") {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "bad credentials" })));
    }
    (
        StatusCode::OK,
        Json(json!({
            "user": {
                "_id": "u1", "name": "Alice", "email": "alice@kitchen.example",
                "role": "head-chef", "status": "active"
            },
            "accessToken": FIRST_ACCESS,
            "refreshToken": REFRESH
        })),
    )
}

async fn refresh(State(backend): State<Backend>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    backend.refresh_hits.fetch_add(1, Ordering::SeqCst);
    if body.get("refreshToken").and_then(Value::as_str) == Some(REFRESH) {
        (StatusCode::OK, Json(json!({ "accessToken": FRESH_ACCESS })))
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "message": "invalid refresh token" })))
    }
}

async fn logout() -> StatusCode {
    StatusCode::OK
}

// Requires the refreshed token, so the first post-login read forces a refresh.
async fn panels(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    let authed = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", FRESH_ACCESS))
        .unwrap_or(false);
    if !authed {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "unauthorized" })));
    }
    (StatusCode::OK, Json(json!([{ "_id": "p1", "name": "Grill", "order": 1, "recipeCount": 0 }])))
}

async fn spawn_backend(backend: Backend) -> Result<String> {
    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/refresh-token", post(refresh))
        .route("/panels", get(panels))
        .with_state(backend);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{}", addr))
}

fn vault_value(dir: &std::path::Path) -> Result<Value> {
    let raw = std::fs::read_to_string(dir.join("session.json"))?;
    Ok(serde_json::from_str(&raw)?)
}

#[tokio::test]
async fn login_populates_session_and_vault_with_matching_values() -> Result<()> {
    let base = spawn_backend(Backend { refresh_hits: Arc::new(AtomicUsize::new(0)) }).await?;
    let dir = tempdir()?;
    let config = ClientConfig::new(&base)?.with_vault_dir(dir.path());
    let client = ApiClient::new(&config)?;

    let auth = client.login("alice@kitchen.example", "s3cr3t!").await?;
    assert_eq!(auth.user.email, "alice@kitchen.example");
    assert!(client.session().is_authenticated());
    assert_eq!(client.session().access_token().as_deref(), Some(FIRST_ACCESS));
    assert_eq!(client.session().refresh_token().as_deref(), Some(REFRESH));

    let vault = vault_value(dir.path())?;
    assert_eq!(vault.get("accessToken").and_then(Value::as_str), Some(FIRST_ACCESS));
    assert_eq!(vault.get("refreshToken").and_then(Value::as_str), Some(REFRESH));
    // The user is stored as a serialized JSON string.
    let user_raw = vault.get("user").and_then(Value::as_str).expect("user key");
    let user: Value = serde_json::from_str(user_raw)?;
    assert_eq!(user.get("email").and_then(Value::as_str), Some("alice@kitchen.example"));
    Ok(())
}

#[tokio::test]
async fn a_new_client_seeds_its_session_from_the_vault() -> Result<()> {
    let base = spawn_backend(Backend { refresh_hits: Arc::new(AtomicUsize::new(0)) }).await?;
    let dir = tempdir()?;
    let config = ClientConfig::new(&base)?.with_vault_dir(dir.path());

    let first = ApiClient::new(&config)?;
    first.login("alice@kitchen.example", "s3cr3t!").await?;
    drop(first);

    let resumed = ApiClient::new(&config)?;
    assert!(resumed.session().is_authenticated(), "reload must survive via the vault");
    assert_eq!(resumed.session().access_token().as_deref(), Some(FIRST_ACCESS));
    assert_eq!(resumed.session().user().map(|u| u.name), Some("Alice".to_string()));
    Ok(())
}

#[tokio::test]
async fn a_refresh_rewrites_the_persisted_access_token() -> Result<()> {
    let backend = Backend { refresh_hits: Arc::new(AtomicUsize::new(0)) };
    let base = spawn_backend(backend.clone()).await?;
    let dir = tempdir()?;
    let config = ClientConfig::new(&base)?.with_vault_dir(dir.path());
    let client = ApiClient::new(&config)?;

    client.login("alice@kitchen.example", "s3cr3t!").await?;
    // The backend only accepts the refreshed token, so this read goes
    // 401 -> refresh -> retry without surfacing an error.
    let panels = client.panels().await?;
    assert_eq!(panels.len(), 1);
    assert_eq!(backend.refresh_hits.load(Ordering::SeqCst), 1);

    let vault = vault_value(dir.path())?;
    assert_eq!(vault.get("accessToken").and_then(Value::as_str), Some(FRESH_ACCESS));
    assert_eq!(
        vault.get("refreshToken").and_then(Value::as_str),
        Some(REFRESH),
        "refresh token is unchanged by the exchange"
    );
    Ok(())
}

#[tokio::test]
async fn logout_clears_session_and_vault() -> Result<()> {
    let base = spawn_backend(Backend { refresh_hits: Arc::new(AtomicUsize::new(0)) }).await?;
    let dir = tempdir()?;
    let config = ClientConfig::new(&base)?.with_vault_dir(dir.path());
    let client = ApiClient::new(&config)?;

    client.login("alice@kitchen.example", "s3cr3t!").await?;
    assert!(dir.path().join("session.json").exists());

    client.logout().await?;
    assert!(!client.session().is_authenticated());
    assert!(client.session().user().is_none());
    assert!(!dir.path().join("session.json").exists(), "vault must be wiped on logout");
    Ok(())
}
