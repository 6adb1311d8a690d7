//! Panel endpoints: the ordered station boards a kitchen's recipes hang off.

use reqwest::Method;
use serde::Serialize;
use serde_json::json;

use crate::cache::{collection_tags, EntityKind, Tag};
use crate::client::{ApiClient, Upload};
use crate::error::ApiResult;
use crate::model::Panel;
use crate::wire::{normalize_list, Envelope, RawPanel, SingleEnvelope};

#[derive(Debug, Clone, Default)]
pub struct NewPanel {
    pub name: String,
    pub order: Option<i64>,
    pub image: Option<Upload>,
}

impl NewPanel {
    fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![("name".to_string(), self.name.clone())];
        if let Some(order) = self.order {
            fields.push(("order".to_string(), order.to_string()));
        }
        fields
    }
}

/// Partial update; absent fields are left untouched server-side.
#[derive(Debug, Clone, Default)]
pub struct PanelPatch {
    pub name: Option<String>,
    pub order: Option<i64>,
    pub image: Option<Upload>,
}

impl PanelPatch {
    fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = Vec::new();
        if let Some(name) = &self.name {
            fields.push(("name".to_string(), name.clone()));
        }
        if let Some(order) = self.order {
            fields.push(("order".to_string(), order.to_string()));
        }
        fields
    }
}

/// One entry of a bulk reorder.
#[derive(Debug, Clone, Serialize)]
pub struct PanelOrder {
    pub id: String,
    pub order: i64,
}

impl ApiClient {
    pub async fn panels(&self) -> ApiResult<Vec<Panel>> {
        self.cached(
            "panels",
            async {
                let body = self.get_value("panels", &[]).await?;
                normalize_list(serde_json::from_value::<Envelope<RawPanel>>(body)?, RawPanel::normalize)
            },
            |panels: &Vec<Panel>| collection_tags(EntityKind::Panel, panels, |p| p.id.as_str()),
        )
        .await
    }

    pub async fn panel(&self, id: &str) -> ApiResult<Panel> {
        let path = format!("panels/{}", id);
        self.cached(
            &path,
            async {
                let body = self.get_value(&path, &[]).await?;
                serde_json::from_value::<SingleEnvelope<RawPanel>>(body)?
                    .into_inner()?
                    .normalize()
            },
            |_| vec![Tag::entity(EntityKind::Panel, id)],
        )
        .await
    }

    pub async fn create_panel(&self, panel: &NewPanel) -> ApiResult<Panel> {
        self.mutating(vec![Tag::list(EntityKind::Panel)], async {
            let body = self
                .multipart_value(Method::POST, "panels", panel.form_fields(), panel.image.clone())
                .await?;
            serde_json::from_value::<SingleEnvelope<RawPanel>>(body)?
                .into_inner()?
                .normalize()
        })
        .await
    }

    pub async fn update_panel(&self, id: &str, patch: &PanelPatch) -> ApiResult<Panel> {
        let tags = vec![Tag::entity(EntityKind::Panel, id), Tag::list(EntityKind::Panel)];
        self.mutating(tags, async {
            let body = self
                .multipart_value(Method::PUT, &format!("panels/{}", id), patch.form_fields(), patch.image.clone())
                .await?;
            serde_json::from_value::<SingleEnvelope<RawPanel>>(body)?
                .into_inner()?
                .normalize()
        })
        .await
    }

    pub async fn delete_panel(&self, id: &str) -> ApiResult<()> {
        let tags = vec![Tag::entity(EntityKind::Panel, id), Tag::list(EntityKind::Panel)];
        self.mutating(tags, self.request_empty(Method::DELETE, &format!("panels/{}", id), None))
            .await
    }

    /// Persists a drag-and-drop reordering of the dashboard panels.
    pub async fn reorder_panels(&self, ordering: &[PanelOrder]) -> ApiResult<()> {
        self.mutating(
            vec![Tag::list(EntityKind::Panel)],
            self.request_empty(Method::PUT, "panels/reorder", Some(json!({ "panels": ordering }))),
        )
        .await
    }
}
