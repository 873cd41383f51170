//! The labeling workflow engine.
//!
//! [`LabelingEngine`] owns the rules for how tags are created, edited,
//! approved and removed, how each of those events moves the owning image's
//! status, and the one-shot AI-assist gate per (user, image).
//!
//! The engine holds no state of its own: every operation is a short
//! read-modify-write against the injected repositories. The tag write and
//! the follow-up status write are separate store calls, so two concurrent
//! operations on the same image can leave its status out of step with its
//! tag count. Callers that need strict consistency must serialize writes
//! per image.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::logging::SUBSYSTEM_WORKFLOW;
use crate::models::*;
use crate::notifier::{ScoreEndpoint, ScoreNotice, ScoringNotifier};
use crate::status;
use crate::traits::*;

/// Default upper bound on tag value length, in characters.
pub const DEFAULT_MAX_TAG_LENGTH: usize = 32;

/// Labeling workflow engine.
#[derive(Clone)]
pub struct LabelingEngine {
    images: Arc<dyn ImageRepository>,
    tags: Arc<dyn TagRepository>,
    usage: Arc<dyn LabelerUsageRepository>,
    users: Arc<dyn UserProfileRepository>,
    notifier: Arc<dyn ScoringNotifier>,
    max_tag_length: usize,
}

impl LabelingEngine {
    /// Create an engine over the given repositories and notifier.
    pub fn new(
        images: Arc<dyn ImageRepository>,
        tags: Arc<dyn TagRepository>,
        usage: Arc<dyn LabelerUsageRepository>,
        users: Arc<dyn UserProfileRepository>,
        notifier: Arc<dyn ScoringNotifier>,
    ) -> Self {
        Self {
            images,
            tags,
            usage,
            users,
            notifier,
            max_tag_length: DEFAULT_MAX_TAG_LENGTH,
        }
    }

    /// Override the maximum tag value length.
    pub fn with_max_tag_length(mut self, max: usize) -> Self {
        self.max_tag_length = max.max(1);
        self
    }

    pub fn max_tag_length(&self) -> usize {
        self.max_tag_length
    }

    /// Validate and normalize a tag value.
    ///
    /// Surrounding whitespace is trimmed; the result must be non-empty and
    /// at most `max_tag_length` characters.
    pub fn validate_tag_value(&self, value: &str) -> Result<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("Tag value cannot be empty".to_string()));
        }
        let len = trimmed.chars().count();
        if len > self.max_tag_length {
            return Err(Error::InvalidInput(format!(
                "Tag value must be {} characters or less (got {})",
                self.max_tag_length, len
            )));
        }
        Ok(trimmed.to_string())
    }

    // =========================================================================
    // TAG LIFECYCLE
    // =========================================================================

    /// Attach a new tag authored by `caller` to an image.
    ///
    /// The tag carries the author's current likelihood score. The image moves
    /// to LABELED unless it is already REVIEWED. The author is queued for
    /// rescoring.
    pub async fn add_tag(
        &self,
        caller: &Caller,
        image_id: Uuid,
        value: &str,
        source: TagSource,
    ) -> Result<Tag> {
        let start = Instant::now();
        if source == TagSource::Admin {
            caller.require_admin()?;
        }
        let value = self.validate_tag_value(value)?;

        let image = self
            .images
            .fetch(image_id)
            .await?
            .ok_or(Error::ImageNotFound(image_id))?;

        let likelihood_score = self.users.likelihood_score(caller.user_id).await?;

        let tag = self
            .tags
            .insert(NewTag {
                image_id,
                value,
                source,
                created_by_id: caller.user_id,
                likelihood_score,
            })
            .await?;
        self.notify(ScoreEndpoint::User, &tag, caller);

        let next = status::on_tag_added(image.status);
        if next != image.status {
            self.images.set_status(image_id, next).await?;
        }

        info!(
            subsystem = SUBSYSTEM_WORKFLOW,
            component = "tag_lifecycle",
            op = "add_tag",
            image_id = %image_id,
            tag_id = %tag.id,
            user_id = %caller.user_id,
            source = %source,
            status = %next,
            duration_ms = start.elapsed().as_millis() as u64,
            "Tag added"
        );
        Ok(tag)
    }

    /// Overwrite a tag's value and source.
    ///
    /// Author and likelihood score never change. Labelers may only edit
    /// their own tags, and only until an administrator approves them; an
    /// ADMIN source requires an administrator.
    pub async fn update_tag(
        &self,
        caller: &Caller,
        tag_id: Uuid,
        value: &str,
        source: TagSource,
    ) -> Result<Tag> {
        let start = Instant::now();
        if source == TagSource::Admin {
            caller.require_admin()?;
        }
        let value = self.validate_tag_value(value)?;

        let existing = self
            .tags
            .fetch(tag_id)
            .await?
            .ok_or(Error::TagNotFound(tag_id))?;
        ensure_can_modify(caller, &existing)?;

        let tag = self.tags.update_value(tag_id, &value, source).await?;

        let endpoint = match source {
            TagSource::Admin => ScoreEndpoint::Admin,
            TagSource::User | TagSource::Ai => ScoreEndpoint::User,
        };
        self.notify(endpoint, &tag, caller);

        info!(
            subsystem = SUBSYSTEM_WORKFLOW,
            component = "tag_lifecycle",
            op = "update_tag",
            tag_id = %tag_id,
            image_id = %tag.image_id,
            user_id = %caller.user_id,
            source = %source,
            duration_ms = start.elapsed().as_millis() as u64,
            "Tag updated"
        );
        Ok(tag)
    }

    /// Approve a tag as an administrator, replacing its value.
    pub async fn approve_tag(&self, caller: &Caller, tag_id: Uuid, value: &str) -> Result<Tag> {
        caller.require_admin()?;
        self.update_tag(caller, tag_id, value, TagSource::Admin).await
    }

    /// Delete a tag and re-derive the owning image's status.
    ///
    /// The image is looked up by the tag's recorded `image_id`. It returns to
    /// UNLABELED when no tags remain; otherwise its status is left alone.
    pub async fn remove_tag(&self, caller: &Caller, tag_id: Uuid) -> Result<()> {
        let start = Instant::now();
        let existing = self
            .tags
            .fetch(tag_id)
            .await?
            .ok_or(Error::TagNotFound(tag_id))?;
        ensure_can_modify(caller, &existing)?;

        let removed = self
            .tags
            .delete(tag_id)
            .await?
            .ok_or(Error::TagNotFound(tag_id))?;
        let image_id = removed.image_id;

        let remaining = self.tags.count_for_image(image_id).await?;
        let Some(image) = self.images.fetch(image_id).await? else {
            debug!(
                subsystem = SUBSYSTEM_WORKFLOW,
                component = "status",
                image_id = %image_id,
                "Owning image vanished before status re-derivation"
            );
            return Ok(());
        };

        let next = status::on_tag_removed(image.status, remaining);
        if next != image.status {
            self.images.set_status(image_id, next).await?;
        }

        info!(
            subsystem = SUBSYSTEM_WORKFLOW,
            component = "tag_lifecycle",
            op = "remove_tag",
            tag_id = %tag_id,
            image_id = %image_id,
            user_id = %caller.user_id,
            remaining_tags = remaining,
            status = %next,
            duration_ms = start.elapsed().as_millis() as u64,
            "Tag removed"
        );
        Ok(())
    }

    // =========================================================================
    // IMAGE STATUS
    // =========================================================================

    /// Force an image into any status, regardless of its tags.
    pub async fn set_image_status(
        &self,
        caller: &Caller,
        image_id: Uuid,
        status: ImageStatus,
    ) -> Result<Image> {
        caller.require_admin()?;
        let image = self.images.set_status(image_id, status).await?;
        info!(
            subsystem = SUBSYSTEM_WORKFLOW,
            component = "status",
            op = "set_image_status",
            image_id = %image_id,
            user_id = %caller.user_id,
            status = %status,
            "Image status overridden"
        );
        Ok(image)
    }

    /// Register an uploaded image. New images start UNLABELED.
    pub async fn register_image(&self, caller: &Caller, req: NewImage) -> Result<Image> {
        caller.require_admin()?;
        for (field, value) in [
            ("filename", &req.filename),
            ("original_name", &req.original_name),
            ("url", &req.url),
        ] {
            if value.trim().is_empty() {
                return Err(Error::InvalidInput(format!("{} cannot be empty", field)));
            }
        }

        let group_id = req.group_id;
        let image = self.images.insert(req).await.map_err(|e| {
            if e.is_foreign_key_violation() {
                Error::NotFound(format!("Group not found: {}", group_id))
            } else {
                e
            }
        })?;
        info!(
            subsystem = SUBSYSTEM_WORKFLOW,
            op = "register_image",
            image_id = %image.id,
            group_id = %group_id,
            "Image registered"
        );
        Ok(image)
    }

    /// Fetch an image together with its tags.
    pub async fn get_image(&self, image_id: Uuid) -> Result<ImageWithTags> {
        let image = self
            .images
            .fetch(image_id)
            .await?
            .ok_or(Error::ImageNotFound(image_id))?;
        let tags = self.tags.list_for_image(image_id).await?;
        Ok(ImageWithTags { image, tags })
    }

    /// List the tags on an image, newest first.
    pub async fn list_tags(&self, image_id: Uuid) -> Result<Vec<Tag>> {
        if self.images.fetch(image_id).await?.is_none() {
            return Err(Error::ImageNotFound(image_id));
        }
        self.tags.list_for_image(image_id).await
    }

    /// Count images per status, optionally within one group.
    pub async fn status_counts(
        &self,
        caller: &Caller,
        group_id: Option<Uuid>,
    ) -> Result<StatusCounts> {
        caller.require_admin()?;
        self.images.status_counts(group_id).await
    }

    // =========================================================================
    // AI-ASSIST USAGE GUARD
    // =========================================================================

    /// Whether `user_id` has already consumed AI suggestions on `image_id`.
    pub async fn has_used_ai(&self, user_id: Uuid, image_id: Uuid) -> Result<bool> {
        self.usage.exists(user_id, image_id).await
    }

    /// Mark AI suggestions as consumed. Repeating the call is a no-op.
    pub async fn record_ai_usage(&self, user_id: Uuid, image_id: Uuid) -> Result<()> {
        match self.usage.insert(user_id, image_id).await {
            Ok(usage) => {
                info!(
                    subsystem = SUBSYSTEM_WORKFLOW,
                    component = "usage_guard",
                    op = "record_ai_usage",
                    user_id = %user_id,
                    image_id = %image_id,
                    usage_id = %usage.id,
                    "AI usage recorded"
                );
                Ok(())
            }
            Err(e) if e.is_unique_violation() => {
                debug!(
                    subsystem = SUBSYSTEM_WORKFLOW,
                    component = "usage_guard",
                    op = "record_ai_usage",
                    user_id = %user_id,
                    image_id = %image_id,
                    error = %e,
                    "AI usage already recorded"
                );
                Ok(())
            }
            Err(e) if e.is_foreign_key_violation() => {
                if self.images.fetch(image_id).await?.is_none() {
                    Err(Error::ImageNotFound(image_id))
                } else {
                    Err(Error::NotFound(format!("User not found: {}", user_id)))
                }
            }
            Err(e) => Err(e),
        }
    }

    fn notify(&self, endpoint: ScoreEndpoint, tag: &Tag, caller: &Caller) {
        self.notifier.notify(ScoreNotice {
            endpoint,
            tag_id: tag.id,
            label: tag.value.clone(),
            auth_token: caller.auth_token.clone(),
        });
    }
}

/// Labelers may only touch their own unapproved tags; administrators may
/// touch any.
fn ensure_can_modify(caller: &Caller, tag: &Tag) -> Result<()> {
    if caller.admin {
        return Ok(());
    }
    if tag.source == TagSource::Admin {
        return Err(Error::Forbidden(format!(
            "Tag {} has been approved by an administrator",
            tag.id
        )));
    }
    if tag.created_by_id != caller.user_id {
        return Err(Error::Forbidden(format!(
            "Tag {} belongs to another user",
            tag.id
        )));
    }
    Ok(())
}
