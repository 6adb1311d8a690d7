//! The head chef's own restaurant record.

use crate::cache::{EntityKind, Tag, TagId};
use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::model::Restaurant;
use crate::wire::{RawRestaurant, SingleEnvelope};

impl ApiClient {
    pub async fn my_restaurant(&self) -> ApiResult<Restaurant> {
        self.cached(
            "restaurant/head-chef/my-restaurant",
            async {
                let body = self.get_value("restaurant/head-chef/my-restaurant", &[]).await?;
                Ok(serde_json::from_value::<SingleEnvelope<RawRestaurant>>(body)?
                    .into_inner()?
                    .normalize())
            },
            |_| vec![Tag::named(EntityKind::Restaurant, TagId::MyRestaurant)],
        )
        .await
    }
}
