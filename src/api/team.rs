//! Team management: the head chef's member roster and the queue of chefs
//! waiting to be admitted. Pending requests live in the User family under
//! their own partition, so approving one refreshes both the queue and the
//! roster.

use reqwest::Method;
use serde::Serialize;
use serde_json::json;

use crate::cache::{collection_tags, EntityKind, Tag, TagId};
use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::model::{PendingRequest, User, UserPermissions};
use crate::wire::{normalize_list, Envelope, RawPendingRequest, RawUser, SingleEnvelope};

/// Partial update for a team member; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<UserPermissions>,
}

/// Verdict on a pending access request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Active,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Active => "active",
            RequestStatus::Rejected => "rejected",
        }
    }
}

impl ApiClient {
    pub async fn team_members(&self) -> ApiResult<Vec<User>> {
        self.cached(
            "users/team",
            async {
                let body = self.get_value("users/team", &[]).await?;
                normalize_list(serde_json::from_value::<Envelope<RawUser>>(body)?, RawUser::normalize)
            },
            |members: &Vec<User>| collection_tags(EntityKind::User, members, |u| u.id.as_str()),
        )
        .await
    }

    pub async fn update_team_member(&self, id: &str, patch: &TeamMemberPatch) -> ApiResult<User> {
        let tags = vec![Tag::entity(EntityKind::User, id), Tag::list(EntityKind::User)];
        self.mutating(tags, async {
            let body = self
                .request_json(Method::PUT, &format!("users/team/{}", id), Some(serde_json::to_value(patch)?))
                .await?;
            serde_json::from_value::<SingleEnvelope<RawUser>>(body)?
                .into_inner()?
                .normalize()
        })
        .await
    }

    pub async fn delete_team_member(&self, id: &str) -> ApiResult<()> {
        let tags = vec![Tag::entity(EntityKind::User, id), Tag::list(EntityKind::User)];
        self.mutating(tags, self.request_empty(Method::DELETE, &format!("users/team/{}", id), None))
            .await
    }

    pub async fn pending_requests(&self) -> ApiResult<Vec<PendingRequest>> {
        self.cached(
            "users/pending-chefs",
            async {
                let body = self.get_value("users/pending-chefs", &[]).await?;
                normalize_list(
                    serde_json::from_value::<Envelope<RawPendingRequest>>(body)?,
                    RawPendingRequest::normalize,
                )
            },
            |requests: &Vec<PendingRequest>| {
                let mut tags: Vec<Tag> = requests
                    .iter()
                    .map(|r| Tag::entity(EntityKind::User, r.id.as_str()))
                    .collect();
                tags.push(Tag::named(EntityKind::User, TagId::PendingList));
                tags
            },
        )
        .await
    }

    pub async fn update_pending_request(&self, id: &str, status: RequestStatus) -> ApiResult<()> {
        let tags = vec![
            Tag::entity(EntityKind::User, id),
            Tag::named(EntityKind::User, TagId::PendingList),
            Tag::list(EntityKind::User),
        ];
        self.mutating(
            tags,
            self.request_empty(
                Method::PUT,
                &format!("users/pending-chefs/{}", id),
                Some(json!({ "status": status.as_str() })),
            ),
        )
        .await
    }
}
