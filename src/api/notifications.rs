//! Notification endpoints, including the unread badge count. Read-state
//! mutations touch the Unread partition so the badge refreshes with the list.

use reqwest::Method;
use serde_json::{Map, Value};

use crate::cache::{collection_tags, EntityKind, Tag, TagId};
use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::model::Notification;
use crate::wire::{self, normalize_list, Envelope, RawNotification, SingleEnvelope};

#[derive(Debug, Clone, Default)]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    /// Recipient user ids.
    pub recipients: Vec<String>,
    /// Severity/category label; the backend defaults to "info" when absent.
    pub kind: Option<String>,
}

impl NewNotification {
    fn body(&self) -> Value {
        let mut body = Map::new();
        body.insert("title".to_string(), Value::String(self.title.clone()));
        body.insert("message".to_string(), Value::String(self.message.clone()));
        body.insert(
            "recipients".to_string(),
            Value::Array(self.recipients.iter().cloned().map(Value::String).collect()),
        );
        if let Some(kind) = &self.kind {
            body.insert("type".to_string(), Value::String(kind.clone()));
        }
        Value::Object(body)
    }
}

impl ApiClient {
    pub async fn notifications(&self) -> ApiResult<Vec<Notification>> {
        self.cached(
            "notifications",
            async {
                let body = self.get_value("notifications", &[]).await?;
                normalize_list(
                    serde_json::from_value::<Envelope<RawNotification>>(body)?,
                    RawNotification::normalize,
                )
            },
            |items: &Vec<Notification>| collection_tags(EntityKind::Notification, items, |n| n.id.as_str()),
        )
        .await
    }

    pub async fn unread_count(&self) -> ApiResult<u64> {
        self.cached(
            "notifications/unread-count",
            async {
                let body = self.get_value("notifications/unread-count", &[]).await?;
                Ok(wire::unread_count(&body))
            },
            |_| vec![Tag::named(EntityKind::Notification, TagId::Unread)],
        )
        .await
    }

    pub async fn mark_notification_read(&self, id: &str) -> ApiResult<()> {
        let tags = vec![
            Tag::entity(EntityKind::Notification, id),
            Tag::list(EntityKind::Notification),
            Tag::named(EntityKind::Notification, TagId::Unread),
        ];
        self.mutating(tags, self.request_empty(Method::PUT, &format!("notifications/{}/read", id), None))
            .await
    }

    pub async fn mark_all_notifications_read(&self) -> ApiResult<()> {
        let tags = vec![
            Tag::list(EntityKind::Notification),
            Tag::named(EntityKind::Notification, TagId::Unread),
        ];
        self.mutating(tags, self.request_empty(Method::PUT, "notifications/mark-all-read", None))
            .await
    }

    pub async fn send_notification(&self, notification: &NewNotification) -> ApiResult<Notification> {
        self.mutating(vec![Tag::list(EntityKind::Notification)], async {
            let body = self
                .request_json(Method::POST, "notifications", Some(notification.body()))
                .await?;
            serde_json::from_value::<SingleEnvelope<RawNotification>>(body)?
                .into_inner()?
                .normalize()
        })
        .await
    }

    pub async fn delete_notification(&self, id: &str) -> ApiResult<()> {
        let tags = vec![
            Tag::entity(EntityKind::Notification, id),
            Tag::list(EntityKind::Notification),
            Tag::named(EntityKind::Notification, TagId::Unread),
        ];
        self.mutating(tags, self.request_empty(Method::DELETE, &format!("notifications/{}", id), None))
            .await
    }
}
