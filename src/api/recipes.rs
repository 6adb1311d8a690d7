//! Recipe endpoints: the panel-scoped catalog, single-recipe reads, CRUD,
//! the AI ingredient scan, and per-user saved recipes.

use reqwest::Method;
use serde_json::{json, Value};

use crate::cache::{collection_tags, EntityKind, Tag, TagId};
use crate::client::{ApiClient, Upload};
use crate::error::ApiResult;
use crate::model::{Difficulty, Ingredient, Recipe};
use crate::wire::{normalize_list, Envelope, RawRecipe, SingleEnvelope};

use super::query_key;

/// Filters for the recipe list. `organization` carries the restaurant context
/// from the QR flow so unauthenticated kiosk reads land on the right tenant.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub panel: Option<String>,
    pub organization: Option<String>,
}

impl RecipeFilter {
    pub fn for_panel(panel: impl Into<String>) -> Self {
        Self { panel: Some(panel.into()), organization: None }
    }

    fn params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(panel) = &self.panel {
            params.push(("panel".to_string(), panel.clone()));
        }
        if let Some(org) = &self.organization {
            params.push(("organization".to_string(), org.clone()));
        }
        params
    }
}

/// Fields for a new recipe. The image travels as a multipart part next to the
/// text fields; ingredients are serialized as a JSON field.
#[derive(Debug, Clone, Default)]
pub struct NewRecipe {
    pub title: String,
    pub panel: String,
    pub method: String,
    pub ingredients: Vec<Ingredient>,
    pub chef_notes: Option<String>,
    pub prep_time: Option<u32>,
    pub cook_time: Option<u32>,
    pub servings: Option<u32>,
    pub difficulty: Option<Difficulty>,
    pub tags: Vec<String>,
    pub image: Option<Upload>,
}

impl NewRecipe {
    fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("title".to_string(), self.title.clone()),
            ("panel".to_string(), self.panel.clone()),
            ("method".to_string(), self.method.clone()),
        ];
        if !self.ingredients.is_empty() {
            if let Ok(serialized) = serde_json::to_string(&self.ingredients) {
                fields.push(("ingredients".to_string(), serialized));
            }
        }
        if let Some(notes) = &self.chef_notes {
            fields.push(("chefNotes".to_string(), notes.clone()));
        }
        if let Some(minutes) = self.prep_time {
            fields.push(("prepTime".to_string(), minutes.to_string()));
        }
        if let Some(minutes) = self.cook_time {
            fields.push(("cookTime".to_string(), minutes.to_string()));
        }
        if let Some(count) = self.servings {
            fields.push(("servings".to_string(), count.to_string()));
        }
        if let Some(difficulty) = self.difficulty {
            fields.push(("difficulty".to_string(), difficulty.as_str().to_string()));
        }
        if !self.tags.is_empty() {
            fields.push(("tags".to_string(), self.tags.join(",")));
        }
        fields
    }
}

impl ApiClient {
    pub async fn recipes(&self, filter: &RecipeFilter) -> ApiResult<Vec<Recipe>> {
        let params = filter.params();
        let key = query_key("recipes", &params);
        self.cached(
            &key,
            async {
                let body = self.get_value("recipes", &params).await?;
                normalize_list(serde_json::from_value::<Envelope<RawRecipe>>(body)?, RawRecipe::normalize)
            },
            |recipes: &Vec<Recipe>| collection_tags(EntityKind::Recipe, recipes, |r| r.id.as_str()),
        )
        .await
    }

    pub async fn recipe(&self, id: &str) -> ApiResult<Recipe> {
        let path = format!("recipes/{}", id);
        self.cached(
            &path,
            async {
                let body = self.get_value(&path, &[]).await?;
                serde_json::from_value::<SingleEnvelope<RawRecipe>>(body)?
                    .into_inner()?
                    .normalize()
            },
            |_| vec![Tag::entity(EntityKind::Recipe, id)],
        )
        .await
    }

    pub async fn create_recipe(&self, recipe: &NewRecipe) -> ApiResult<Recipe> {
        self.mutating(vec![Tag::list(EntityKind::Recipe)], async {
            let body = self
                .multipart_value(Method::POST, "recipes", recipe.form_fields(), recipe.image.clone())
                .await?;
            serde_json::from_value::<SingleEnvelope<RawRecipe>>(body)?
                .into_inner()?
                .normalize()
        })
        .await
    }

    pub async fn update_recipe(&self, id: &str, title: &str) -> ApiResult<Recipe> {
        let tags = vec![Tag::entity(EntityKind::Recipe, id), Tag::list(EntityKind::Recipe)];
        self.mutating(tags, async {
            let body = self
                .request_json(Method::PUT, &format!("recipes/{}", id), Some(json!({ "title": title })))
                .await?;
            serde_json::from_value::<SingleEnvelope<RawRecipe>>(body)?
                .into_inner()?
                .normalize()
        })
        .await
    }

    pub async fn delete_recipe(&self, id: &str) -> ApiResult<()> {
        let tags = vec![Tag::entity(EntityKind::Recipe, id), Tag::list(EntityKind::Recipe)];
        self.mutating(tags, self.request_empty(Method::DELETE, &format!("recipes/{}", id), None))
            .await
    }

    /// Uploads a photo of ingredients for AI extraction. The scan payload is
    /// returned as-is for the UI to interpret.
    pub async fn scan_ingredients(&self, upload: Upload) -> ApiResult<Value> {
        self.mutating(
            vec![Tag::list(EntityKind::Recipe)],
            self.multipart_value(Method::POST, "recipes/ai-scan", Vec::new(), Some(upload)),
        )
        .await
    }

    pub async fn saved_recipes(&self) -> ApiResult<Vec<Recipe>> {
        self.cached(
            "users/saved-recipes",
            async {
                let body = self.get_value("users/saved-recipes", &[]).await?;
                normalize_list(serde_json::from_value::<Envelope<RawRecipe>>(body)?, RawRecipe::normalize)
            },
            |_| vec![Tag::named(EntityKind::Recipe, TagId::Saved)],
        )
        .await
    }

    pub async fn save_recipe(&self, id: &str) -> ApiResult<()> {
        self.mutating(
            vec![Tag::named(EntityKind::Recipe, TagId::Saved)],
            self.request_empty(Method::POST, &format!("users/saved-recipes/{}", id), None),
        )
        .await
    }

    pub async fn unsave_recipe(&self, id: &str) -> ApiResult<()> {
        self.mutating(
            vec![Tag::named(EntityKind::Recipe, TagId::Saved)],
            self.request_empty(Method::DELETE, &format!("users/saved-recipes/{}", id), None),
        )
        .await
    }
}
