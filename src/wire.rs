//! Wire-format schemas and normalization.
//! Backend endpoints answer in three envelope shapes (bare value, bare array,
//! `{ "data": ... }`) and identify records by either `_id` or `id`. Everything
//! is validated here at the boundary: a payload missing a required field is a
//! `Decode` error rather than a silently coerced placeholder, and callers only
//! ever see the normalized records from `model`.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::model::{AccessRequestReceipt, AuthSuccess, ChefRequest, Difficulty, ImageRef,
    Ingredient, Notification, Panel, PendingRequest, Plateup, PlateupFolder, Recipe,
    Restaurant, User, UserPermissions};

/// Collection envelope: either a bare array or `{ "data": [...] }`.
/// An enveloped `data` of null (or a missing `data` key) normalizes to empty.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Wrapped { data: Option<Vec<T>> },
    Bare(Vec<T>),
}

impl<T> Envelope<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            Envelope::Wrapped { data } => data.unwrap_or_default(),
            Envelope::Bare(items) => items,
        }
    }
}

/// Single-record envelope: `{ "data": {...} }`, a bare object, or a
/// one-element array (some endpoints answer single reads in list form).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SingleEnvelope<T> {
    Wrapped { data: T },
    Listed(Vec<T>),
    Bare(T),
}

impl<T> SingleEnvelope<T> {
    pub fn into_inner(self) -> ApiResult<T> {
        match self {
            SingleEnvelope::Wrapped { data } => Ok(data),
            SingleEnvelope::Bare(value) => Ok(value),
            SingleEnvelope::Listed(items) => items
                .into_iter()
                .next()
                .ok_or_else(|| ApiError::decode("empty array for single-record response")),
        }
    }
}

/// Identifier as it appears on the wire. Mongo-style documents use `_id`,
/// relational-style payloads use `id`; both string and numeric forms occur.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Text(String),
    Number(i64),
}

impl WireId {
    pub fn into_string(self) -> String {
        match self {
            WireId::Text(s) => s,
            WireId::Number(n) => n.to_string(),
        }
    }
}

/// The two identifier spellings, flattened into every raw record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdFields {
    #[serde(rename = "_id", default)]
    pub mongo_id: Option<WireId>,
    #[serde(default)]
    pub id: Option<WireId>,
}

impl IdFields {
    fn into_opt_string(self) -> Option<String> {
        self.mongo_id
            .or(self.id)
            .map(WireId::into_string)
            .filter(|s| !s.is_empty())
    }
}

fn resolve_id(ids: IdFields, entity: &str) -> ApiResult<String> {
    ids.into_opt_string()
        .ok_or_else(|| ApiError::decode(format!("{} record has no usable _id/id", entity)))
}

/// Nested reference: a raw id string or an embedded document.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RefOrId {
    Id(String),
    Embedded(IdFields),
}

impl RefOrId {
    /// Extracts the referenced identifier, empty when wholly absent.
    pub fn id_or_empty(self) -> String {
        match self {
            RefOrId::Id(s) => s,
            RefOrId::Embedded(ids) => ids.into_opt_string().unwrap_or_default(),
        }
    }
}

/// Scalar the backend serves both quoted and bare (ingredient quantities).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StringOrNumber {
    Text(String),
    Number(serde_json::Number),
}

impl StringOrNumber {
    pub fn into_string(self) -> String {
        match self {
            StringOrNumber::Text(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawImage {
    url: String,
    public_id: String,
}

// An image reference is only accepted when both url and publicId are present;
// anything else normalizes to None, matching the backend's partial uploads.
fn image_ref(value: Option<Value>) -> Option<ImageRef> {
    let raw: RawImage = serde_json::from_value(value?).ok()?;
    Some(ImageRef { url: raw.url, public_id: raw.public_id })
}

fn parse_ts(value: Option<String>) -> Option<DateTime<Utc>> {
    let s = value?;
    DateTime::parse_from_rfc3339(&s).ok().map(|dt| dt.with_timezone(&Utc))
}

#[derive(Debug, Deserialize)]
pub struct RawIngredient {
    pub name: String,
    #[serde(default)]
    pub quantity: Option<StringOrNumber>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl RawIngredient {
    pub fn normalize(self) -> Ingredient {
        Ingredient {
            name: self.name,
            quantity: self.quantity.map(StringOrNumber::into_string),
            unit: self.unit,
            notes: self.notes,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecipe {
    #[serde(flatten)]
    ids: IdFields,
    title: String,
    #[serde(default)]
    panel: Option<RefOrId>,
    #[serde(default)]
    image: Option<Value>,
    #[serde(default)]
    ingredients: Vec<RawIngredient>,
    method: String,
    #[serde(default)]
    chef_notes: Option<String>,
    #[serde(default)]
    prep_time: Option<u32>,
    #[serde(default)]
    cook_time: Option<u32>,
    #[serde(default)]
    servings: Option<u32>,
    #[serde(default)]
    difficulty: Option<Difficulty>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    is_active: Option<bool>,
    #[serde(default)]
    created_by: Option<String>,
    #[serde(default)]
    updated_by: Option<String>,
    #[serde(default)]
    version: Option<u32>,
}

impl RawRecipe {
    pub fn normalize(self) -> ApiResult<Recipe> {
        Ok(Recipe {
            id: resolve_id(self.ids, "recipe")?,
            title: self.title,
            panel: self.panel.map(RefOrId::id_or_empty).unwrap_or_default(),
            image: image_ref(self.image),
            ingredients: self.ingredients.into_iter().map(RawIngredient::normalize).collect(),
            method: self.method,
            chef_notes: self.chef_notes,
            prep_time: self.prep_time,
            cook_time: self.cook_time,
            servings: self.servings,
            difficulty: self.difficulty,
            tags: self.tags,
            is_active: self.is_active,
            created_by: self.created_by,
            updated_by: self.updated_by,
            version: self.version,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPanel {
    #[serde(flatten)]
    ids: IdFields,
    name: String,
    order: i64,
    recipe_count: i64,
    #[serde(default)]
    image: Option<Value>,
    #[serde(default)]
    is_active: Option<bool>,
    #[serde(default)]
    created_by: Option<String>,
    #[serde(default)]
    updated_by: Option<String>,
}

impl RawPanel {
    pub fn normalize(self) -> ApiResult<Panel> {
        Ok(Panel {
            id: resolve_id(self.ids, "panel")?,
            name: self.name,
            order: self.order,
            recipe_count: self.recipe_count,
            image: image_ref(self.image),
            is_active: self.is_active,
            created_by: self.created_by,
            updated_by: self.updated_by,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlateup {
    #[serde(flatten)]
    ids: IdFields,
    name: String,
    #[serde(default)]
    image: Option<Value>,
    #[serde(default)]
    created_by: Option<String>,
    #[serde(default)]
    updated_by: Option<String>,
}

impl RawPlateup {
    pub fn normalize(self) -> ApiResult<Plateup> {
        Ok(Plateup {
            id: resolve_id(self.ids, "plateup")?,
            name: self.name,
            image: image_ref(self.image),
            created_by: self.created_by,
            updated_by: self.updated_by,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlateupFolder {
    #[serde(flatten)]
    ids: IdFields,
    name: String,
    #[serde(default)]
    created_by: Option<String>,
    #[serde(default)]
    updated_by: Option<String>,
}

impl RawPlateupFolder {
    pub fn normalize(self) -> ApiResult<PlateupFolder> {
        Ok(PlateupFolder {
            id: resolve_id(self.ids, "plateup folder")?,
            name: self.name,
            created_by: self.created_by,
            updated_by: self.updated_by,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNotification {
    #[serde(flatten)]
    ids: IdFields,
    title: String,
    message: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    read: Option<bool>,
}

impl RawNotification {
    pub fn normalize(self) -> ApiResult<Notification> {
        Ok(Notification {
            id: resolve_id(self.ids, "notification")?,
            title: self.title,
            message: self.message,
            kind: self.kind.unwrap_or_else(|| "info".to_string()),
            created_at: self.created_at.unwrap_or_default(),
            read: self.read.unwrap_or(false),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUser {
    #[serde(flatten)]
    ids: IdFields,
    name: String,
    email: String,
    role: String,
    status: String,
    #[serde(default)]
    organization: Option<RefOrId>,
    #[serde(default)]
    permissions: Option<UserPermissions>,
    #[serde(default)]
    avatar: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

impl RawUser {
    pub fn normalize(self) -> ApiResult<User> {
        Ok(User {
            id: resolve_id(self.ids, "user")?,
            name: self.name,
            email: self.email,
            role: self.role,
            status: self.status,
            organization: self.organization.map(RefOrId::id_or_empty).unwrap_or_default(),
            permissions: self.permissions.unwrap_or_default(),
            avatar: self.avatar,
            created_at: parse_ts(self.created_at),
            updated_at: parse_ts(self.updated_at),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RawPendingRequest {
    #[serde(flatten)]
    ids: IdFields,
    name: String,
    status: String,
}

impl RawPendingRequest {
    pub fn normalize(self) -> ApiResult<PendingRequest> {
        Ok(PendingRequest {
            id: resolve_id(self.ids, "pending request")?,
            name: self.name,
            status: self.status,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RawChefRequest {
    #[serde(flatten)]
    ids: IdFields,
    name: String,
    status: String,
}

impl RawChefRequest {
    pub fn normalize(self) -> ApiResult<ChefRequest> {
        Ok(ChefRequest {
            id: resolve_id(self.ids, "chef request")?,
            name: self.name,
            status: self.status,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAccessRequestReceipt {
    #[serde(flatten)]
    ids: IdFields,
    status: String,
    user_id: String,
}

impl RawAccessRequestReceipt {
    pub fn normalize(self) -> ApiResult<AccessRequestReceipt> {
        Ok(AccessRequestReceipt {
            id: resolve_id(self.ids, "access request")?,
            status: self.status,
            user_id: self.user_id,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRestaurant {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    organization_id: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl RawRestaurant {
    pub fn normalize(self) -> Restaurant {
        Restaurant {
            name: self.name.unwrap_or_default(),
            organization_id: self.organization_id.unwrap_or_default(),
            kind: self.kind.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAuthSuccess {
    user: RawUser,
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    restaurant: Option<Value>,
}

impl RawAuthSuccess {
    pub fn normalize(self) -> ApiResult<AuthSuccess> {
        let restaurant = self
            .restaurant
            .and_then(|v| serde_json::from_value::<RawRestaurant>(v).ok())
            .map(RawRestaurant::normalize);
        Ok(AuthSuccess {
            user: self.user.normalize()?,
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            restaurant,
        })
    }
}

/// Refresh-exchange success body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRefresh {
    #[serde(default)]
    pub access_token: String,
}

/// `/notifications/unread-count` answers `{ "count": n }`, or that object in
/// list form; anything unreadable counts as zero.
pub fn unread_count(value: &Value) -> u64 {
    let slot = match value.as_array() {
        Some(items) => items.first().cloned().unwrap_or(Value::Null),
        None => value.get("count").cloned().unwrap_or(Value::Null),
    };
    match slot {
        Value::Number(n) => n.as_u64().unwrap_or(0),
        Value::Object(map) => map.get("count").and_then(Value::as_u64).unwrap_or(0),
        _ => 0,
    }
}

/// Decode a collection payload and normalize each record.
pub fn normalize_list<R, T, F>(envelope: Envelope<R>, normalize: F) -> ApiResult<Vec<T>>
where
    F: Fn(R) -> ApiResult<T>,
{
    envelope.into_items().into_iter().map(normalize).collect()
}
