//! Tag-indexed response cache.
//! Each read operation stores its normalized result under a query key together
//! with the partitions (tags) it provides; each successful mutation names the
//! partitions it invalidates, and every cached query providing one of those
//! partitions is dropped so the next read goes back to the server. A failed
//! mutation invalidates nothing.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Entity families that partition the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Recipe,
    Panel,
    User,
    Chef,
    Auth,
    Notification,
    Plateup,
    PlateupFolder,
    Restaurant,
}

/// Partition name within an entity family.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagId {
    /// One specific record.
    Entity(String),
    /// The family's shared list partition.
    List,
    Unread,
    Saved,
    PendingList,
    MyRestaurant,
    Session,
    Requests,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub kind: EntityKind,
    pub id: TagId,
}

impl Tag {
    pub fn entity(kind: EntityKind, id: impl Into<String>) -> Self {
        Self { kind, id: TagId::Entity(id.into()) }
    }

    pub fn list(kind: EntityKind) -> Self {
        Self { kind, id: TagId::List }
    }

    pub fn named(kind: EntityKind, id: TagId) -> Self {
        Self { kind, id }
    }
}

/// Tags for a list read: one per returned record plus the family list tag, so
/// the query is dropped when any member changes or the membership does.
pub fn collection_tags<T, F>(kind: EntityKind, items: &[T], id_of: F) -> Vec<Tag>
where
    F: Fn(&T) -> &str,
{
    let mut tags: Vec<Tag> = items.iter().map(|item| Tag::entity(kind, id_of(item))).collect();
    tags.push(Tag::list(kind));
    tags
}

struct CachedQuery {
    value: Value,
    tags: HashSet<Tag>,
}

/// Query-result store shared by one `ApiClient`.
#[derive(Default)]
pub struct CacheStore {
    entries: RwLock<HashMap<String, CachedQuery>>,
}

impl CacheStore {
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        serde_json::from_value(entry.value.clone()).ok()
    }

    pub fn put<T: Serialize>(&self, key: &str, value: &T, tags: Vec<Tag>) {
        let Ok(value) = serde_json::to_value(value) else { return };
        let entry = CachedQuery { value, tags: tags.into_iter().collect() };
        self.entries.write().insert(key.to_string(), entry);
    }

    /// Drops every cached query providing any of the given tags.
    pub fn invalidate(&self, tags: &[Tag]) {
        if tags.is_empty() {
            return;
        }
        let victims: HashSet<&Tag> = tags.iter().collect();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.tags.iter().any(|t| victims.contains(t)));
        let dropped = before - entries.len();
        if dropped > 0 {
            debug!(target: "cache", "invalidated {} cached queries across {} tags", dropped, tags.len());
        }
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put_list(store: &CacheStore, key: &str, kind: EntityKind, ids: &[&str]) {
        let items: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
        let tags = collection_tags(kind, &items, |s| s.as_str());
        store.put(key, &items, tags);
    }

    #[test]
    fn list_tag_invalidation_drops_list_queries() {
        let store = CacheStore::default();
        put_list(&store, "recipes", EntityKind::Recipe, &["r1", "r2"]);
        put_list(&store, "panels", EntityKind::Panel, &["p1"]);

        store.invalidate(&[Tag::list(EntityKind::Recipe)]);
        assert!(store.get::<Vec<String>>("recipes").is_none());
        assert!(store.get::<Vec<String>>("panels").is_some());
    }

    #[test]
    fn entity_tag_invalidation_drops_lists_containing_it() {
        let store = CacheStore::default();
        put_list(&store, "recipes", EntityKind::Recipe, &["r1", "r2"]);
        store.put("recipes/r9", &"r9".to_string(), vec![Tag::entity(EntityKind::Recipe, "r9")]);

        store.invalidate(&[Tag::entity(EntityKind::Recipe, "r2")]);
        assert!(store.get::<Vec<String>>("recipes").is_none());
        assert!(store.get::<String>("recipes/r9").is_some());
    }

    #[test]
    fn disjoint_tags_leave_entries_alone() {
        let store = CacheStore::default();
        put_list(&store, "plateups", EntityKind::Plateup, &["pu1"]);
        store.invalidate(&[Tag::list(EntityKind::Notification), Tag::entity(EntityKind::Plateup, "other")]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn empty_invalidation_is_a_no_op() {
        let store = CacheStore::default();
        put_list(&store, "panels", EntityKind::Panel, &["p1"]);
        store.invalidate(&[]);
        assert_eq!(store.len(), 1);
    }
}
