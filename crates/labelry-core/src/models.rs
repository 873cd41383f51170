//! Core data models for labelry.
//!
//! These types are shared across all labelry crates and represent
//! the labeling domain entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// ENUMS
// =============================================================================

/// Labeling status of an image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImageStatus {
    /// No tags attached
    #[default]
    Unlabeled,
    /// At least one tag attached
    Labeled,
    /// Audited by an administrator
    Reviewed,
}

impl ImageStatus {
    pub const ALL: [ImageStatus; 3] = [Self::Unlabeled, Self::Labeled, Self::Reviewed];

    /// Stored/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unlabeled => "UNLABELED",
            Self::Labeled => "LABELED",
            Self::Reviewed => "REVIEWED",
        }
    }
}

impl std::fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ImageStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "UNLABELED" => Ok(Self::Unlabeled),
            "LABELED" => Ok(Self::Labeled),
            "REVIEWED" => Ok(Self::Reviewed),
            _ => Err(format!("Invalid image status: {}", s)),
        }
    }
}

/// Provenance of a tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum TagSource {
    /// Submitted by a human labeler
    #[default]
    User,
    /// Suggested by the inference service
    Ai,
    /// Authored or approved by an administrator
    Admin,
}

impl TagSource {
    /// Stored/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Ai => "AI",
            Self::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for TagSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TagSource {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USER" => Ok(Self::User),
            "AI" => Ok(Self::Ai),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(format!("Invalid tag source: {}", s)),
        }
    }
}

// =============================================================================
// ENTITIES
// =============================================================================

/// An image stored in blob storage and tracked for labeling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Image {
    pub id: Uuid,
    pub group_id: Uuid,
    pub filename: String,
    pub original_name: String,
    pub url: String,
    pub status: ImageStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A label attached to an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Tag {
    pub id: Uuid,
    /// Owning image. Immutable after creation.
    pub image_id: Uuid,
    pub value: String,
    pub source: TagSource,
    /// Author of the tag. Immutable after creation.
    pub created_by_id: Uuid,
    /// Author's score at creation time. Never recomputed here.
    pub likelihood_score: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Marker that a user has consumed AI suggestions for an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LabelerUsage {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Image together with its tags, newest tag first.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ImageWithTags {
    #[serde(flatten)]
    pub image: Image,
    pub tags: Vec<Tag>,
}

/// Number of images in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct StatusCounts {
    pub unlabeled: i64,
    pub labeled: i64,
    pub reviewed: i64,
}

impl StatusCounts {
    pub fn total(&self) -> i64 {
        self.unlabeled + self.labeled + self.reviewed
    }

    /// Add `n` images to the bucket for `status`.
    pub fn add(&mut self, status: ImageStatus, n: i64) {
        match status {
            ImageStatus::Unlabeled => self.unlabeled += n,
            ImageStatus::Labeled => self.labeled += n,
            ImageStatus::Reviewed => self.reviewed += n,
        }
    }
}

// =============================================================================
// CALLER IDENTITY
// =============================================================================

/// Resolved identity of whoever invoked an operation.
///
/// Produced by the authentication collaborator and trusted as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub admin: bool,
    /// Session token forwarded to the scoring service.
    pub auth_token: String,
}

impl Caller {
    pub fn new(user_id: Uuid, admin: bool, auth_token: impl Into<String>) -> Self {
        Self {
            user_id,
            admin,
            auth_token: auth_token.into(),
        }
    }

    /// Fail with `Forbidden` unless the caller is an administrator.
    pub fn require_admin(&self) -> crate::Result<()> {
        if self.admin {
            Ok(())
        } else {
            Err(crate::Error::Forbidden(
                "administrator privileges required".to_string(),
            ))
        }
    }
}

// =============================================================================
// REQUESTS
// =============================================================================

/// Request for registering an uploaded image.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct NewImage {
    pub group_id: Uuid,
    pub filename: String,
    pub original_name: String,
    pub url: String,
}

/// Insert payload for a tag row.
#[derive(Debug, Clone)]
pub struct NewTag {
    pub image_id: Uuid,
    pub value: String,
    pub source: TagSource,
    pub created_by_id: Uuid,
    pub likelihood_score: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_status_round_trips_through_str() {
        for status in ImageStatus::ALL {
            assert_eq!(status.as_str().parse::<ImageStatus>().unwrap(), status);
        }
        assert_eq!("reviewed".parse::<ImageStatus>().unwrap(), ImageStatus::Reviewed);
        assert!("ARCHIVED".parse::<ImageStatus>().is_err());
    }

    #[test]
    fn test_tag_source_serializes_uppercase() {
        let json = serde_json::to_string(&TagSource::Ai).unwrap();
        assert_eq!(json, "\"AI\"");
        let parsed: TagSource = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(parsed, TagSource::Admin);
    }

    #[test]
    fn test_default_status_is_unlabeled() {
        assert_eq!(ImageStatus::default(), ImageStatus::Unlabeled);
    }

    #[test]
    fn test_status_counts_add_and_total() {
        let mut counts = StatusCounts::default();
        counts.add(ImageStatus::Labeled, 3);
        counts.add(ImageStatus::Reviewed, 1);
        assert_eq!(counts.labeled, 3);
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn test_require_admin() {
        let admin = Caller::new(Uuid::new_v4(), true, "t");
        let labeler = Caller::new(Uuid::new_v4(), false, "t");
        assert!(admin.require_admin().is_ok());
        assert!(matches!(
            labeler.require_admin(),
            Err(crate::Error::Forbidden(_))
        ));
    }

    #[test]
    fn test_image_with_tags_flattens_image_fields() {
        let now = Utc::now();
        let image = Image {
            id: Uuid::nil(),
            group_id: Uuid::nil(),
            filename: "a.png".to_string(),
            original_name: "cat.png".to_string(),
            url: "https://bucket/a.png".to_string(),
            status: ImageStatus::Unlabeled,
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(ImageWithTags {
            image,
            tags: vec![],
        })
        .unwrap();
        assert_eq!(value["status"], "UNLABELED");
        assert_eq!(value["original_name"], "cat.png");
        assert!(value["tags"].as_array().unwrap().is_empty());
    }
}
