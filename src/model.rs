//! Normalized domain records handed to callers.
//! Every record carries a stable string identifier resolved at the wire
//! boundary; optional fields stay `None` when the payload omitted them so
//! callers can tell "not provided" from "explicitly empty". These types also
//! round-trip through serde for cache storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Uploaded-asset reference as stored by the backend (Cloudinary-style).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub title: String,
    /// Identifier of the owning panel; empty when the recipe is unfiled.
    pub panel: String,
    pub image: Option<ImageRef>,
    pub ingredients: Vec<Ingredient>,
    pub method: String,
    pub chef_notes: Option<String>,
    pub prep_time: Option<u32>,
    pub cook_time: Option<u32>,
    pub servings: Option<u32>,
    pub difficulty: Option<Difficulty>,
    pub tags: Vec<String>,
    pub is_active: Option<bool>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub version: Option<u32>,
}

/// A menu panel (station board) grouping recipes, ordered on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub id: String,
    pub name: String,
    pub order: i64,
    pub recipe_count: i64,
    pub image: Option<ImageRef>,
    pub is_active: Option<bool>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plateup {
    pub id: String,
    pub name: String,
    pub image: Option<ImageRef>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateupFolder {
    pub id: String,
    pub name: String,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    /// Severity/category label; the backend defaults this to "info".
    pub kind: String,
    pub created_at: String,
    pub read: bool,
}

/// Per-member capability flags. Missing on the wire means no capabilities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPermissions {
    pub can_view_recipes: bool,
    pub can_edit_recipes: bool,
    pub can_delete_recipes: bool,
    pub can_update_recipes: bool,

    pub can_view_plateups: bool,
    pub can_create_plateups: bool,
    pub can_delete_plateups: bool,
    pub can_update_plateups: bool,

    pub can_view_notifications: bool,
    pub can_create_notifications: bool,
    pub can_delete_notifications: bool,
    pub can_update_notifications: bool,

    pub can_view_panels: bool,
    pub can_create_panels: bool,
    pub can_delete_panels: bool,
    pub can_update_panels: bool,

    pub can_manage_team: bool,
    pub can_access_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub status: String,
    /// Owning organization id; empty for accounts not yet attached to one.
    pub organization: String,
    pub permissions: UserPermissions,
    pub avatar: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A chef's pending request to join a head chef's team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRequest {
    pub id: String,
    pub name: String,
    pub status: String,
}

/// State of a single access request, as polled by the waiting chef.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChefRequest {
    pub id: String,
    pub name: String,
    pub status: String,
}

/// Receipt returned when a chef asks for access to a head chef's workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequestReceipt {
    pub id: String,
    pub status: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restaurant {
    pub name: String,
    pub organization_id: String,
    pub kind: String,
    pub status: String,
}

/// Outcome of a successful authentication exchange. `restaurant` is only
/// populated by the QR flow, which logs into an organization directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSuccess {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
    pub restaurant: Option<Restaurant>,
}
