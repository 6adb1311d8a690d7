//! Plate-up standards and their folders. A folder's view embeds its member
//! count, so mutations inside a folder invalidate the folder's own partition
//! as well as the plateup list.

use reqwest::Method;
use serde_json::json;

use crate::cache::{collection_tags, EntityKind, Tag};
use crate::client::{ApiClient, Upload};
use crate::error::ApiResult;
use crate::model::{Plateup, PlateupFolder};
use crate::wire::{normalize_list, Envelope, RawPlateup, RawPlateupFolder, SingleEnvelope};

use super::query_key;

#[derive(Debug, Clone, Default)]
pub struct NewPlateup {
    pub name: String,
    pub image: Option<Upload>,
}

impl NewPlateup {
    fn form_fields(&self) -> Vec<(String, String)> {
        vec![("name".to_string(), self.name.clone())]
    }
}

impl ApiClient {
    pub async fn plateups(&self) -> ApiResult<Vec<Plateup>> {
        self.cached(
            "plateups",
            async {
                let body = self.get_value("plateups", &[]).await?;
                normalize_list(serde_json::from_value::<Envelope<RawPlateup>>(body)?, RawPlateup::normalize)
            },
            |plateups: &Vec<Plateup>| collection_tags(EntityKind::Plateup, plateups, |p| p.id.as_str()),
        )
        .await
    }

    /// Plateups filed under one folder. Subscribes to the folder's partition
    /// so folder-level changes force a re-read.
    pub async fn plateups_in_folder(&self, folder_id: &str) -> ApiResult<Vec<Plateup>> {
        let params = vec![("folder".to_string(), folder_id.to_string())];
        let key = query_key("plateups", &params);
        self.cached(
            &key,
            async {
                let body = self.get_value("plateups", &params).await?;
                normalize_list(serde_json::from_value::<Envelope<RawPlateup>>(body)?, RawPlateup::normalize)
            },
            |_| vec![Tag::entity(EntityKind::PlateupFolder, folder_id), Tag::list(EntityKind::Plateup)],
        )
        .await
    }

    pub async fn create_plateup(&self, plateup: &NewPlateup) -> ApiResult<Plateup> {
        self.mutating(vec![Tag::list(EntityKind::Plateup)], async {
            let body = self
                .multipart_value(Method::POST, "plateups", plateup.form_fields(), plateup.image.clone())
                .await?;
            serde_json::from_value::<SingleEnvelope<RawPlateup>>(body)?
                .into_inner()?
                .normalize()
        })
        .await
    }

    pub async fn create_plateup_in_folder(&self, plateup: &NewPlateup, folder_id: &str) -> ApiResult<Plateup> {
        let tags = vec![Tag::list(EntityKind::Plateup), Tag::entity(EntityKind::PlateupFolder, folder_id)];
        self.mutating(tags, async {
            let mut fields = plateup.form_fields();
            fields.push(("folder".to_string(), folder_id.to_string()));
            let body = self
                .multipart_value(Method::POST, "plateups", fields, plateup.image.clone())
                .await?;
            serde_json::from_value::<SingleEnvelope<RawPlateup>>(body)?
                .into_inner()?
                .normalize()
        })
        .await
    }

    pub async fn update_plateup(&self, id: &str, name: &str) -> ApiResult<Plateup> {
        let tags = vec![Tag::entity(EntityKind::Plateup, id), Tag::list(EntityKind::Plateup)];
        self.mutating(tags, async {
            let body = self
                .request_json(Method::PATCH, &format!("plateups/{}", id), Some(json!({ "name": name })))
                .await?;
            serde_json::from_value::<SingleEnvelope<RawPlateup>>(body)?
                .into_inner()?
                .normalize()
        })
        .await
    }

    pub async fn delete_plateup(&self, id: &str) -> ApiResult<()> {
        let tags = vec![Tag::entity(EntityKind::Plateup, id), Tag::list(EntityKind::Plateup)];
        self.mutating(tags, self.request_empty(Method::DELETE, &format!("plateups/{}", id), None))
            .await
    }

    pub async fn plateup_folders(&self) -> ApiResult<Vec<PlateupFolder>> {
        self.cached(
            "plateup-folders",
            async {
                let body = self.get_value("plateup-folders", &[]).await?;
                normalize_list(
                    serde_json::from_value::<Envelope<RawPlateupFolder>>(body)?,
                    RawPlateupFolder::normalize,
                )
            },
            |folders: &Vec<PlateupFolder>| collection_tags(EntityKind::PlateupFolder, folders, |f| f.id.as_str()),
        )
        .await
    }

    pub async fn create_plateup_folder(&self, name: &str) -> ApiResult<PlateupFolder> {
        self.mutating(vec![Tag::list(EntityKind::PlateupFolder)], async {
            let body = self
                .request_json(Method::POST, "plateup-folders", Some(json!({ "name": name })))
                .await?;
            serde_json::from_value::<SingleEnvelope<RawPlateupFolder>>(body)?
                .into_inner()?
                .normalize()
        })
        .await
    }

    pub async fn update_plateup_folder(&self, id: &str, name: &str) -> ApiResult<PlateupFolder> {
        let tags = vec![
            Tag::entity(EntityKind::PlateupFolder, id),
            Tag::list(EntityKind::PlateupFolder),
        ];
        self.mutating(tags, async {
            let body = self
                .request_json(Method::PUT, &format!("plateup-folders/{}", id), Some(json!({ "name": name })))
                .await?;
            serde_json::from_value::<SingleEnvelope<RawPlateupFolder>>(body)?
                .into_inner()?
                .normalize()
        })
        .await
    }

    pub async fn delete_plateup_folder(&self, id: &str) -> ApiResult<()> {
        let tags = vec![
            Tag::entity(EntityKind::PlateupFolder, id),
            Tag::list(EntityKind::PlateupFolder),
        ];
        self.mutating(tags, self.request_empty(Method::DELETE, &format!("plateup-folders/{}", id), None))
            .await
    }
}
