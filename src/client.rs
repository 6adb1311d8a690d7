//! HTTP core of the access layer: credential attachment, the reauthentication
//! interceptor, response classification, and the cached-query / invalidating-
//! mutation helpers the endpoint catalog is written against.
//!
//! Requests are described as builder closures so a failed request can be
//! rebuilt (bodies included) and retried once after a token refresh. Refresh
//! exchanges are single-flight: concurrent 401s queue on one gate and the
//! late arrivals find the token already replaced.

use std::future::Future;
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::{CacheStore, Tag};
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::session::SessionHandle;
use crate::wire::RawRefresh;

/// An attachment for multipart endpoints. Owns its bytes so the request can be
/// rebuilt if the first send comes back 401.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Form field name the backend expects (usually "image" or "file").
    pub field: String,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(field: impl Into<String>, file_name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { field: field.into(), file_name: file_name.into(), mime: mime.into(), bytes }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    session: SessionHandle,
    cache: Arc<CacheStore>,
    refresh_gate: Arc<Mutex<()>>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let session = match &config.vault_dir {
            Some(dir) => SessionHandle::with_vault(dir),
            None => SessionHandle::new(),
        };
        Self::with_session(config, session)
    }

    /// Builds a client around an externally owned session handle, so several
    /// clients (or tests) can share one set of credentials.
    pub fn with_session(config: &ClientConfig, session: SessionHandle) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ApiError::from)?;
        Ok(Self {
            http,
            base: config.base_url.clone(),
            session,
            cache: Arc::new(CacheStore::default()),
            refresh_gate: Arc::new(Mutex::new(())),
        })
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    fn url(&self, path: &str) -> ApiResult<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::transport(format!("invalid request path {}: {}", path, e)))
    }

    // --- reauthentication interceptor -------------------------------------

    /// Sends the request described by `build`, transparently refreshing the
    /// access token and retrying exactly once when the first attempt is 401.
    pub(crate) async fn execute<F>(&self, build: F) -> ApiResult<Response>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        let token = self.session.access_token();
        let response = self.dispatch(&build, token.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        debug!("401 from {}; attempting token refresh", response.url().path());
        let original = Self::error_for(StatusCode::UNAUTHORIZED, response).await;
        if self.refresh_access_token(token).await.is_err() {
            // Refresh impossible or rejected: the caller gets the original
            // authorization failure, not the exchange's.
            return Err(original);
        }
        let fresh = self.session.access_token();
        self.dispatch(&build, fresh.as_deref()).await
    }

    async fn dispatch<F>(&self, build: &F, token: Option<&str>) -> ApiResult<Response>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        let mut request = build(&self.http).header("x-request-id", Uuid::new_v4().to_string());
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.map_err(ApiError::from)
    }

    /// Single-flight refresh exchange. `stale` is the access token the failed
    /// request went out with; if the session already holds a different token
    /// by the time the gate is acquired, another request completed the
    /// exchange and this caller can go straight to its retry.
    pub(crate) async fn refresh_access_token(&self, stale: Option<String>) -> ApiResult<()> {
        let _gate = self.refresh_gate.lock().await;
        if self.session.access_token() != stale {
            debug!("token already refreshed by a concurrent request");
            return Ok(());
        }
        let Some(refresh_token) = self.session.refresh_token() else {
            self.session.clear();
            return Err(ApiError::session_expired("no refresh token held"));
        };
        let url = self.url("auth/refresh-token")?;
        let outcome = self
            .http
            .post(url)
            .json(&serde_json::json!({ "refreshToken": refresh_token }))
            .send()
            .await;
        let body = match outcome {
            Ok(response) if response.status().is_success() => {
                response.json::<RawRefresh>().await.ok()
            }
            _ => None,
        };
        match body {
            Some(refresh) if !refresh.access_token.is_empty() => {
                self.session.bump_access_token(refresh.access_token);
                debug!("access token refreshed");
                Ok(())
            }
            _ => {
                warn!("refresh exchange failed; clearing session");
                self.session.clear();
                Err(ApiError::session_expired("token refresh rejected"))
            }
        }
    }

    // --- response classification ------------------------------------------

    pub(crate) async fn read_json(&self, response: Response) -> ApiResult<Value> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<Value>()
                .await
                .map_err(|e| ApiError::decode(format!("unreadable json body: {}", e)));
        }
        Err(Self::error_for(status, response).await)
    }

    pub(crate) async fn expect_ok(&self, response: Response) -> ApiResult<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(Self::error_for(status, response).await)
    }

    async fn error_for(status: StatusCode, response: Response) -> ApiError {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| if body.is_empty() { status.to_string() } else { body });
        ApiError::from_status(status.as_u16(), message)
    }

    // --- transport helpers -------------------------------------------------

    pub(crate) async fn get_value(&self, path: &str, params: &[(String, String)]) -> ApiResult<Value> {
        let url = self.url(path)?;
        let params = params.to_vec();
        let response = self
            .execute(move |http| {
                let mut builder = http.get(url.clone());
                if !params.is_empty() {
                    builder = builder.query(&params);
                }
                builder
            })
            .await?;
        self.read_json(response).await
    }

    pub(crate) async fn request_json(&self, method: Method, path: &str, body: Option<Value>) -> ApiResult<Value> {
        let url = self.url(path)?;
        let response = self
            .execute(move |http| {
                let mut builder = http.request(method.clone(), url.clone());
                if let Some(body) = &body {
                    builder = builder.json(body);
                }
                builder
            })
            .await?;
        self.read_json(response).await
    }

    pub(crate) async fn request_empty(&self, method: Method, path: &str, body: Option<Value>) -> ApiResult<()> {
        let url = self.url(path)?;
        let response = self
            .execute(move |http| {
                let mut builder = http.request(method.clone(), url.clone());
                if let Some(body) = &body {
                    builder = builder.json(body);
                }
                builder
            })
            .await?;
        self.expect_ok(response).await
    }

    pub(crate) async fn multipart_value(
        &self,
        method: Method,
        path: &str,
        fields: Vec<(String, String)>,
        upload: Option<Upload>,
    ) -> ApiResult<Value> {
        let url = self.url(path)?;
        let response = self
            .execute(move |http| {
                http.request(method.clone(), url.clone())
                    .multipart(build_form(&fields, &upload))
            })
            .await?;
        self.read_json(response).await
    }

    // --- cache plumbing -----------------------------------------------------

    /// Runs a read operation through the cache: a stored result whose tags are
    /// still valid is returned without touching the network; otherwise `fetch`
    /// runs and its result is stored under the tags it provides.
    pub(crate) async fn cached<T, Fut, F>(&self, key: &str, fetch: Fut, tags_for: F) -> ApiResult<T>
    where
        T: Serialize + DeserializeOwned,
        Fut: Future<Output = ApiResult<T>>,
        F: Fn(&T) -> Vec<Tag>,
    {
        if let Some(hit) = self.cache.get::<T>(key) {
            debug!(target: "cache", "hit: {}", key);
            return Ok(hit);
        }
        let fresh = fetch.await?;
        self.cache.put(key, &fresh, tags_for(&fresh));
        debug!(target: "cache", "stored: {}", key);
        Ok(fresh)
    }

    /// Runs a write operation; the named partitions are invalidated only after
    /// the operation succeeds, so a failed mutation leaves cached state intact.
    pub(crate) async fn mutating<T, Fut>(&self, invalidates: Vec<Tag>, op: Fut) -> ApiResult<T>
    where
        Fut: Future<Output = ApiResult<T>>,
    {
        let out = op.await?;
        self.cache.invalidate(&invalidates);
        Ok(out)
    }
}

fn build_form(fields: &[(String, String)], upload: &Option<Upload>) -> Form {
    let mut form = Form::new();
    for (name, value) in fields {
        form = form.text(name.clone(), value.clone());
    }
    if let Some(upload) = upload {
        let part = Part::bytes(upload.bytes.clone()).file_name(upload.file_name.clone());
        let part = match part.mime_str(&upload.mime) {
            Ok(with_mime) => with_mime,
            Err(_) => Part::bytes(upload.bytes.clone()).file_name(upload.file_name.clone()),
        };
        form = form.part(upload.field.clone(), part);
    }
    form
}
