//! Reauthentication interceptor tests against a scripted mock backend:
//! transparent refresh-and-retry, forced logout on refresh failure, and
//! single-flight deduplication of concurrent refresh exchanges.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use enplace::{ApiClient, ClientConfig, RecipeFilter};

const GOOD_TOKEN: &str = "access-good";
const STALE_TOKEN: &str = "access-stale";
const GOOD_REFRESH: &str = "refresh-good";

#[derive(Clone)]
struct Backend {
    panel_hits: Arc<AtomicUsize>,
    recipe_hits: Arc<AtomicUsize>,
    refresh_hits: Arc<AtomicUsize>,
    panels_fail_with: Option<u16>,
}

impl Backend {
    fn new() -> Self {
        Self {
            panel_hits: Arc::new(AtomicUsize::new(0)),
            recipe_hits: Arc::new(AtomicUsize::new(0)),
            refresh_hits: Arc::new(AtomicUsize::new(0)),
            panels_fail_with: None,
        }
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

async fn panels(State(backend): State<Backend>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    backend.panel_hits.fetch_add(1, Ordering::SeqCst);
    if let Some(code) = backend.panels_fail_with {
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, Json(json!({ "message": "forced failure" })));
    }
    if bearer(&headers).as_deref() != Some(GOOD_TOKEN) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "unauthorized" })));
    }
    (
        StatusCode::OK,
        Json(json!([{ "_id": "p1", "name": "Grill", "order": 1, "recipeCount": 2 }])),
    )
}

// Kiosk-style public list: no auth required.
async fn recipes(State(backend): State<Backend>, headers: HeaderMap) -> Json<Value> {
    backend.recipe_hits.fetch_add(1, Ordering::SeqCst);
    let tag = if bearer(&headers).is_some() { "house" } else { "public" };
    Json(json!({ "data": [{
        "_id": "r1", "title": "Halibut", "method": "Poach gently.",
        "tags": [tag]
    }] }))
}

async fn refresh(State(backend): State<Backend>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    backend.refresh_hits.fetch_add(1, Ordering::SeqCst);
    if body.get("refreshToken").and_then(Value::as_str) == Some(GOOD_REFRESH) {
        (StatusCode::OK, Json(json!({ "accessToken": GOOD_TOKEN })))
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "message": "invalid refresh token" })))
    }
}

async fn spawn_backend(backend: Backend) -> Result<String> {
    let app = Router::new()
        .route("/panels", get(panels))
        .route("/recipes", get(recipes))
        .route("/auth/refresh-token", post(refresh))
        .with_state(backend);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{}", addr))
}

fn client_for(base: &str) -> Result<ApiClient> {
    Ok(ApiClient::new(&ClientConfig::new(base)?)?)
}

#[tokio::test]
async fn expired_token_is_refreshed_and_request_retried_once() -> Result<()> {
    let backend = Backend::new();
    let base = spawn_backend(backend.clone()).await?;
    let client = client_for(&base)?;
    client.session().set_credentials(None, STALE_TOKEN.into(), GOOD_REFRESH.into());

    let panels = client.panels().await?;
    assert_eq!(panels.len(), 1, "caller must see the retried response, not the 401");
    assert_eq!(backend.refresh_hits.load(Ordering::SeqCst), 1);
    assert_eq!(backend.panel_hits.load(Ordering::SeqCst), 2, "original attempt plus exactly one retry");
    assert_eq!(client.session().access_token().as_deref(), Some(GOOD_TOKEN));
    assert_eq!(
        client.session().refresh_token().as_deref(),
        Some(GOOD_REFRESH),
        "refresh token must survive the exchange"
    );
    Ok(())
}

#[tokio::test]
async fn invalid_refresh_token_clears_session_and_surfaces_the_failure() -> Result<()> {
    let backend = Backend::new();
    let base = spawn_backend(backend.clone()).await?;
    let client = client_for(&base)?;
    client.session().set_credentials(None, STALE_TOKEN.into(), "refresh-bad".into());

    let err = client.panels().await.expect_err("must fail after rejected refresh");
    assert!(err.is_session_expired(), "got: {}", err);
    assert!(!client.session().is_authenticated());
    assert!(client.session().access_token().is_none());
    assert!(client.session().refresh_token().is_none());
    assert_eq!(backend.refresh_hits.load(Ordering::SeqCst), 1);
    assert_eq!(backend.panel_hits.load(Ordering::SeqCst), 1, "no retry after failed refresh");
    Ok(())
}

#[tokio::test]
async fn missing_refresh_token_fails_without_an_exchange() -> Result<()> {
    let backend = Backend::new();
    let base = spawn_backend(backend.clone()).await?;
    let client = client_for(&base)?;
    // Access token only; there is nothing to exchange.
    client.session().bump_access_token(STALE_TOKEN.into());

    let err = client.panels().await.expect_err("must fail");
    assert!(err.is_session_expired());
    assert_eq!(backend.refresh_hits.load(Ordering::SeqCst), 0);
    assert!(!client.session().is_authenticated());
    Ok(())
}

#[tokio::test]
async fn concurrent_401s_share_a_single_refresh_exchange() -> Result<()> {
    let backend = Backend::new();
    let base = spawn_backend(backend.clone()).await?;
    let client = client_for(&base)?;
    client.session().set_credentials(None, STALE_TOKEN.into(), GOOD_REFRESH.into());

    let (a, b, c) = futures::join!(client.panels(), client.panels(), client.panels());
    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert_eq!(
        backend.refresh_hits.load(Ordering::SeqCst),
        1,
        "waiters must adopt the in-flight refresh instead of issuing their own"
    );
    Ok(())
}

#[tokio::test]
async fn non_401_failures_pass_through_without_refresh() -> Result<()> {
    let mut backend = Backend::new();
    backend.panels_fail_with = Some(500);
    let base = spawn_backend(backend.clone()).await?;
    let client = client_for(&base)?;
    client.session().set_credentials(None, GOOD_TOKEN.into(), GOOD_REFRESH.into());

    let err = client.panels().await.expect_err("500 must surface");
    assert_eq!(err.status(), Some(500));
    assert_eq!(backend.refresh_hits.load(Ordering::SeqCst), 0);
    assert!(client.session().is_authenticated(), "a 500 must not log the user out");
    Ok(())
}

#[tokio::test]
async fn validation_errors_pass_through_untouched() -> Result<()> {
    let mut backend = Backend::new();
    backend.panels_fail_with = Some(422);
    let base = spawn_backend(backend.clone()).await?;
    let client = client_for(&base)?;
    client.session().set_credentials(None, GOOD_TOKEN.into(), GOOD_REFRESH.into());

    let err = client.panels().await.expect_err("422 must surface");
    assert_eq!(err.status(), Some(422));
    assert_eq!(err.message(), "forced failure", "server message must reach the caller");
    assert_eq!(backend.refresh_hits.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn unauthenticated_requests_go_out_without_credentials() -> Result<()> {
    let backend = Backend::new();
    let base = spawn_backend(backend.clone()).await?;
    let client = client_for(&base)?;

    let recipes = client.recipes(&RecipeFilter::default()).await?;
    assert_eq!(recipes[0].tags, vec!["public".to_string()], "no bearer header expected");
    assert_eq!(backend.refresh_hits.load(Ordering::SeqCst), 0);
    Ok(())
}
