//! In-memory repository implementations.
//!
//! [`MemoryStore`] implements every repository trait over a single mutex so
//! the workflow engine and the HTTP layer can be exercised without a
//! database. It mirrors the constraints the PostgreSQL schema enforces:
//! unique (user, image) usage rows and foreign keys from tags/usage to
//! images and from images to groups.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use labelry_core::memory::MemoryStore;
//! use labelry_core::{ImageStatus, NoopNotifier};
//!
//! let store = MemoryStore::new();
//! let group = store.add_group();
//! let image = store.add_image(group, ImageStatus::Unlabeled);
//! let engine = store.engine(Arc::new(NoopNotifier));
//! # let _ = (engine, image);
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::*;
use crate::notifier::ScoringNotifier;
use crate::traits::*;
use crate::workflow::LabelingEngine;

#[derive(Default)]
struct State {
    groups: HashSet<Uuid>,
    images: HashMap<Uuid, Image>,
    /// Insertion order is creation order.
    tags: Vec<Tag>,
    usage: Vec<LabelerUsage>,
    scores: HashMap<Uuid, Option<f64>>,
    sessions: HashMap<String, Caller>,
}

/// Shared in-memory store. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| Error::Internal("memory store lock poisoned".to_string()))
    }

    fn state(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Build an engine backed by this store.
    pub fn engine(&self, notifier: Arc<dyn ScoringNotifier>) -> LabelingEngine {
        let store = Arc::new(self.clone());
        LabelingEngine::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            notifier,
        )
    }

    // ─── Seeding helpers ──────────────────────────────────────────────────

    /// Create a group and return its ID.
    pub fn add_group(&self) -> Uuid {
        let id = Uuid::now_v7();
        self.state().groups.insert(id);
        id
    }

    /// Create an image in `group_id` with the given status.
    pub fn add_image(&self, group_id: Uuid, status: ImageStatus) -> Uuid {
        let id = Uuid::now_v7();
        let now = Utc::now();
        let mut state = self.state();
        state.groups.insert(group_id);
        state.images.insert(
            id,
            Image {
                id,
                group_id,
                filename: format!("{}.png", id),
                original_name: "upload.png".to_string(),
                url: format!("https://bucket.example/images/{}/{}.png", group_id, id),
                status,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    /// Set a user's aggregate likelihood score.
    pub fn set_likelihood_score(&self, user_id: Uuid, score: Option<f64>) {
        self.state().scores.insert(user_id, score);
    }

    /// Register a session token for a caller.
    pub fn add_session(&self, token: impl Into<String>, caller: Caller) {
        self.state().sessions.insert(token.into(), caller);
    }

    // ─── Raw access for tests ─────────────────────────────────────────────

    /// Number of usage rows stored for a pair.
    pub fn usage_rows(&self, user_id: Uuid, image_id: Uuid) -> usize {
        self.state()
            .usage
            .iter()
            .filter(|u| u.user_id == user_id && u.image_id == image_id)
            .count()
    }
}

#[async_trait]
impl ImageRepository for MemoryStore {
    async fn insert(&self, req: NewImage) -> Result<Image> {
        let mut state = self.lock()?;
        if !state.groups.contains(&req.group_id) {
            return Err(Error::NotFound(format!(
                "Group not found: {}",
                req.group_id
            )));
        }
        let now = Utc::now();
        let image = Image {
            id: Uuid::now_v7(),
            group_id: req.group_id,
            filename: req.filename,
            original_name: req.original_name,
            url: req.url,
            status: ImageStatus::Unlabeled,
            created_at: now,
            updated_at: now,
        };
        state.images.insert(image.id, image.clone());
        Ok(image)
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Image>> {
        Ok(self.lock()?.images.get(&id).cloned())
    }

    async fn set_status(&self, id: Uuid, status: ImageStatus) -> Result<Image> {
        let mut state = self.lock()?;
        let image = state.images.get_mut(&id).ok_or(Error::ImageNotFound(id))?;
        image.status = status;
        image.updated_at = Utc::now();
        Ok(image.clone())
    }

    async fn status_counts(&self, group_id: Option<Uuid>) -> Result<StatusCounts> {
        let state = self.lock()?;
        let mut counts = StatusCounts::default();
        for image in state.images.values() {
            if group_id.map_or(true, |g| image.group_id == g) {
                counts.add(image.status, 1);
            }
        }
        Ok(counts)
    }
}

#[async_trait]
impl TagRepository for MemoryStore {
    async fn insert(&self, req: NewTag) -> Result<Tag> {
        let mut state = self.lock()?;
        if !state.images.contains_key(&req.image_id) {
            return Err(Error::ImageNotFound(req.image_id));
        }
        let now = Utc::now();
        let tag = Tag {
            id: Uuid::now_v7(),
            image_id: req.image_id,
            value: req.value,
            source: req.source,
            created_by_id: req.created_by_id,
            likelihood_score: req.likelihood_score,
            created_at: now,
            updated_at: now,
        };
        state.tags.push(tag.clone());
        Ok(tag)
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Tag>> {
        Ok(self.lock()?.tags.iter().find(|t| t.id == id).cloned())
    }

    async fn update_value(&self, id: Uuid, value: &str, source: TagSource) -> Result<Tag> {
        let mut state = self.lock()?;
        let tag = state
            .tags
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(Error::TagNotFound(id))?;
        tag.value = value.to_string();
        tag.source = source;
        tag.updated_at = Utc::now();
        Ok(tag.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Tag>> {
        let mut state = self.lock()?;
        let pos = state.tags.iter().position(|t| t.id == id);
        Ok(pos.map(|pos| state.tags.remove(pos)))
    }

    async fn count_for_image(&self, image_id: Uuid) -> Result<i64> {
        let state = self.lock()?;
        Ok(state
            .tags
            .iter()
            .filter(|t| t.image_id == image_id)
            .count() as i64)
    }

    async fn list_for_image(&self, image_id: Uuid) -> Result<Vec<Tag>> {
        let state = self.lock()?;
        Ok(state
            .tags
            .iter()
            .rev()
            .filter(|t| t.image_id == image_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LabelerUsageRepository for MemoryStore {
    async fn exists(&self, user_id: Uuid, image_id: Uuid) -> Result<bool> {
        let state = self.lock()?;
        Ok(state
            .usage
            .iter()
            .any(|u| u.user_id == user_id && u.image_id == image_id))
    }

    async fn insert(&self, user_id: Uuid, image_id: Uuid) -> Result<LabelerUsage> {
        let mut state = self.lock()?;
        if !state.images.contains_key(&image_id) {
            return Err(Error::ImageNotFound(image_id));
        }
        if state
            .usage
            .iter()
            .any(|u| u.user_id == user_id && u.image_id == image_id)
        {
            return Err(Error::Conflict(format!(
                "labeler usage already exists for user {} and image {}",
                user_id, image_id
            )));
        }
        let now = Utc::now();
        let usage = LabelerUsage {
            id: Uuid::now_v7(),
            user_id,
            image_id,
            created_at: now,
            updated_at: now,
        };
        state.usage.push(usage.clone());
        Ok(usage)
    }
}

#[async_trait]
impl UserProfileRepository for MemoryStore {
    async fn likelihood_score(&self, user_id: Uuid) -> Result<Option<f64>> {
        Ok(self.lock()?.scores.get(&user_id).copied().flatten())
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn resolve_caller(&self, token: &str) -> Result<Option<Caller>> {
        Ok(self.lock()?.sessions.get(token).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_usage_insert_rejects_duplicates() {
        let store = MemoryStore::new();
        let group = store.add_group();
        let image = store.add_image(group, ImageStatus::Unlabeled);
        let user = Uuid::new_v4();

        LabelerUsageRepository::insert(&store, user, image)
            .await
            .unwrap();
        let err = LabelerUsageRepository::insert(&store, user, image)
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
        assert_eq!(store.usage_rows(user, image), 1);
    }

    #[tokio::test]
    async fn test_tag_insert_requires_image() {
        let store = MemoryStore::new();
        let err = TagRepository::insert(
            &store,
            NewTag {
                image_id: Uuid::new_v4(),
                value: "cat".to_string(),
                source: TagSource::User,
                created_by_id: Uuid::new_v4(),
                likelihood_score: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::ImageNotFound(_)));
    }

    #[tokio::test]
    async fn test_list_for_image_newest_first() {
        let store = MemoryStore::new();
        let group = store.add_group();
        let image = store.add_image(group, ImageStatus::Unlabeled);
        for value in ["first", "second", "third"] {
            TagRepository::insert(
                &store,
                NewTag {
                    image_id: image,
                    value: value.to_string(),
                    source: TagSource::User,
                    created_by_id: Uuid::new_v4(),
                    likelihood_score: None,
                },
            )
            .await
            .unwrap();
        }
        let tags = store.list_for_image(image).await.unwrap();
        let values: Vec<_> = tags.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_resolve_unknown_session() {
        let store = MemoryStore::new();
        assert!(store.resolve_caller("nope").await.unwrap().is_none());
        let caller = Caller::new(Uuid::new_v4(), false, "tok");
        store.add_session("tok", caller.clone());
        assert_eq!(store.resolve_caller("tok").await.unwrap(), Some(caller));
    }
}
