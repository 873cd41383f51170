//! Core traits for labelry abstractions.
//!
//! These traits define the store-access interfaces the workflow engine is
//! built on. The PostgreSQL implementations live in `labelry-db`; an
//! in-memory implementation lives in [`crate::memory`].

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// IMAGE REPOSITORY
// =============================================================================

/// Repository for image rows.
#[async_trait]
pub trait ImageRepository: Send + Sync {
    /// Insert a new image with status UNLABELED.
    async fn insert(&self, req: NewImage) -> Result<Image>;

    /// Fetch an image by ID, `None` if it does not exist.
    async fn fetch(&self, id: Uuid) -> Result<Option<Image>>;

    /// Overwrite the status of an image and return the updated row.
    ///
    /// Fails with `ImageNotFound` if the image does not exist.
    async fn set_status(&self, id: Uuid, status: ImageStatus) -> Result<Image>;

    /// Count images per status, optionally restricted to one group.
    async fn status_counts(&self, group_id: Option<Uuid>) -> Result<StatusCounts>;
}

// =============================================================================
// TAG REPOSITORY
// =============================================================================

/// Repository for tag rows.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Insert a tag.
    async fn insert(&self, req: NewTag) -> Result<Tag>;

    /// Fetch a tag by ID, `None` if it does not exist.
    async fn fetch(&self, id: Uuid) -> Result<Option<Tag>>;

    /// Overwrite value and source. Author, image and score are left alone.
    ///
    /// Fails with `TagNotFound` if the tag does not exist.
    async fn update_value(&self, id: Uuid, value: &str, source: TagSource) -> Result<Tag>;

    /// Delete a tag, returning the deleted row or `None` if it was absent.
    async fn delete(&self, id: Uuid) -> Result<Option<Tag>>;

    /// Count the tags currently attached to an image.
    async fn count_for_image(&self, image_id: Uuid) -> Result<i64>;

    /// List the tags of an image, newest first.
    async fn list_for_image(&self, image_id: Uuid) -> Result<Vec<Tag>>;
}

// =============================================================================
// LABELER USAGE REPOSITORY
// =============================================================================

/// Repository for AI-assist usage markers.
#[async_trait]
pub trait LabelerUsageRepository: Send + Sync {
    /// Check whether a marker exists for the pair.
    async fn exists(&self, user_id: Uuid, image_id: Uuid) -> Result<bool>;

    /// Insert a marker for the pair.
    ///
    /// Implementations must surface a duplicate as an error for which
    /// [`crate::Error::is_unique_violation`] is true.
    async fn insert(&self, user_id: Uuid, image_id: Uuid) -> Result<LabelerUsage>;
}

// =============================================================================
// USER PROFILE REPOSITORY
// =============================================================================

/// Read-only view of externally managed user profiles.
#[async_trait]
pub trait UserProfileRepository: Send + Sync {
    /// Current aggregate likelihood score of a user, `None` when unknown.
    async fn likelihood_score(&self, user_id: Uuid) -> Result<Option<f64>>;
}

// =============================================================================
// SESSION REPOSITORY
// =============================================================================

/// Resolves session tokens issued by the authentication provider.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Resolve a session token into a caller.
    ///
    /// Returns `None` for unknown or expired sessions.
    async fn resolve_caller(&self, token: &str) -> Result<Option<Caller>>;
}
