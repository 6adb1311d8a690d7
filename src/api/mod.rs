//! Endpoint catalog: typed read/write operations against the backend, one
//! submodule per entity family. Reads declare the cache partitions they
//! provide; writes declare the partitions they invalidate. Callers only ever
//! see normalized records from `model`.

mod auth;
mod notifications;
mod panels;
mod plateups;
mod recipes;
mod restaurant;
mod team;

pub use crate::client::Upload;
pub use auth::NewAccount;
pub use notifications::NewNotification;
pub use panels::{NewPanel, PanelOrder, PanelPatch};
pub use plateups::NewPlateup;
pub use recipes::{NewRecipe, RecipeFilter};
pub use team::{RequestStatus, TeamMemberPatch};

/// Canonical cache key for a read: path plus its encoded query string, so the
/// same filter always lands on the same partition entry.
pub(crate) fn query_key(path: &str, params: &[(String, String)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let pairs: Vec<String> = params
        .iter()
        .map(|(name, value)| format!("{}={}", name, urlencoding::encode(value)))
        .collect();
    format!("{}?{}", path, pairs.join("&"))
}

#[cfg(test)]
mod tests {
    use super::query_key;

    #[test]
    fn query_key_is_stable_and_encoded() {
        assert_eq!(query_key("recipes", &[]), "recipes");
        let params = vec![
            ("panel".to_string(), "p 1".to_string()),
            ("organization".to_string(), "org/9".to_string()),
        ];
        assert_eq!(query_key("recipes", &params), "recipes?panel=p%201&organization=org%2F9");
    }
}
