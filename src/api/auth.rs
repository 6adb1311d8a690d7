//! Authentication endpoints. Every successful exchange installs the returned
//! credentials on the shared session (and its vault) before the caller sees
//! the result, so the next request already goes out authenticated.

use reqwest::Method;
use serde_json::json;
use tracing::warn;

use crate::cache::{EntityKind, Tag, TagId};
use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::model::{AccessRequestReceipt, AuthSuccess, ChefRequest};
use crate::wire::{RawAccessRequestReceipt, RawAuthSuccess, RawChefRequest, SingleEnvelope};

#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

impl ApiClient {
    fn adopt(&self, auth: &AuthSuccess) {
        self.session().set_credentials(
            Some(auth.user.clone()),
            auth.access_token.clone(),
            auth.refresh_token.clone(),
        );
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthSuccess> {
        self.mutating(vec![Tag::named(EntityKind::Auth, TagId::Session)], async {
            let body = self
                .request_json(
                    Method::POST,
                    "auth/login",
                    Some(json!({ "email": email, "password": password })),
                )
                .await?;
            let auth = serde_json::from_value::<RawAuthSuccess>(body)?.normalize()?;
            self.adopt(&auth);
            Ok(auth)
        })
        .await
    }

    /// Line-chef login through the head chef's workspace.
    pub async fn login_chef(&self, head_chef_id: &str, chef_id: &str) -> ApiResult<AuthSuccess> {
        self.mutating(vec![Tag::named(EntityKind::Auth, TagId::Session)], async {
            let body = self
                .request_json(Method::POST, &format!("auth/login/{}/{}", head_chef_id, chef_id), None)
                .await?;
            let auth = serde_json::from_value::<RawAuthSuccess>(body)?.normalize()?;
            self.adopt(&auth);
            Ok(auth)
        })
        .await
    }

    /// Organization login from a scanned table QR code; the response also
    /// carries the restaurant the code belongs to.
    pub async fn qr_auth(&self, org_id: &str) -> ApiResult<AuthSuccess> {
        self.mutating(vec![Tag::named(EntityKind::Auth, TagId::Session)], async {
            let body = self
                .request_json(Method::POST, &format!("auth/qr/{}", org_id), None)
                .await?;
            let auth = serde_json::from_value::<RawAuthSuccess>(body)?.normalize()?;
            self.adopt(&auth);
            Ok(auth)
        })
        .await
    }

    pub async fn register(&self, account: &NewAccount) -> ApiResult<AuthSuccess> {
        self.mutating(vec![Tag::named(EntityKind::Auth, TagId::Session)], async {
            let mut body = json!({
                "name": account.name,
                "email": account.email,
                "password": account.password,
            });
            if let Some(role) = &account.role {
                body["role"] = json!(role);
            }
            let raw = self.request_json(Method::POST, "auth/register", Some(body)).await?;
            let auth = serde_json::from_value::<RawAuthSuccess>(raw)?.normalize()?;
            self.adopt(&auth);
            Ok(auth)
        })
        .await
    }

    /// Forces a refresh exchange now instead of waiting for the next 401.
    pub async fn refresh_session(&self) -> ApiResult<()> {
        self.mutating(
            vec![Tag::named(EntityKind::Auth, TagId::Session)],
            self.refresh_access_token(self.session().access_token()),
        )
        .await
    }

    /// Logs out locally no matter what the server says; the server call is
    /// best-effort revocation.
    pub async fn logout(&self) -> ApiResult<()> {
        let outcome = self.request_empty(Method::POST, "auth/logout", None).await;
        self.session().clear();
        self.cache().clear();
        if let Err(e) = outcome {
            warn!("server-side logout failed: {}", e);
        }
        Ok(())
    }

    pub async fn forgot_password(&self, email: &str) -> ApiResult<()> {
        self.request_empty(Method::POST, "auth/forgot-password", Some(json!({ "email": email })))
            .await
    }

    pub async fn reset_password(&self, token: &str, password: &str) -> ApiResult<()> {
        self.request_empty(
            Method::POST,
            "auth/reset-password",
            Some(json!({ "token": token, "password": password })),
        )
        .await
    }

    /// A chef asking to join a head chef's team.
    pub async fn request_chef_access(
        &self,
        head_chef_id: &str,
        first_name: &str,
        last_name: &str,
    ) -> ApiResult<AccessRequestReceipt> {
        self.mutating(vec![Tag::named(EntityKind::Chef, TagId::Requests)], async {
            let body = self
                .request_json(
                    Method::POST,
                    "chefs/request-access",
                    Some(json!({
                        "headChefId": head_chef_id,
                        "firstName": first_name,
                        "lastName": last_name,
                    })),
                )
                .await?;
            serde_json::from_value::<SingleEnvelope<RawAccessRequestReceipt>>(body)?
                .into_inner()?
                .normalize()
        })
        .await
    }

    /// Polls the state of a previously filed access request.
    pub async fn chef_request(&self, id: &str) -> ApiResult<ChefRequest> {
        let path = format!("chefs/{}", id);
        self.cached(
            &path,
            async {
                let body = self.get_value(&path, &[]).await?;
                serde_json::from_value::<SingleEnvelope<RawChefRequest>>(body)?
                    .into_inner()?
                    .normalize()
            },
            |_| vec![Tag::entity(EntityKind::Chef, id)],
        )
        .await
    }
}
