//! Image status derivation rules.
//!
//! Status follows tag events:
//!
//! | Event | Current status | New status |
//! |-------|----------------|------------|
//! | tag added | UNLABELED / LABELED | LABELED |
//! | tag added | REVIEWED | REVIEWED |
//! | tag removed, 0 remaining | any | UNLABELED |
//! | tag removed, ≥1 remaining | any | unchanged |
//!
//! REVIEWED is only reachable through the manual override.

use crate::models::ImageStatus;

/// Status after a tag has been attached to an image.
pub fn on_tag_added(current: ImageStatus) -> ImageStatus {
    match current {
        ImageStatus::Reviewed => ImageStatus::Reviewed,
        ImageStatus::Unlabeled | ImageStatus::Labeled => ImageStatus::Labeled,
    }
}

/// Status after a tag has been removed, given how many tags remain.
pub fn on_tag_removed(current: ImageStatus, remaining_tags: i64) -> ImageStatus {
    if remaining_tags <= 0 {
        ImageStatus::Unlabeled
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_added_labels_unlabeled_and_labeled() {
        assert_eq!(on_tag_added(ImageStatus::Unlabeled), ImageStatus::Labeled);
        assert_eq!(on_tag_added(ImageStatus::Labeled), ImageStatus::Labeled);
    }

    #[test]
    fn test_added_keeps_reviewed() {
        assert_eq!(on_tag_added(ImageStatus::Reviewed), ImageStatus::Reviewed);
    }

    #[test]
    fn test_removed_last_tag_unlabels() {
        for status in ImageStatus::ALL {
            assert_eq!(on_tag_removed(status, 0), ImageStatus::Unlabeled);
        }
    }

    #[test]
    fn test_removed_with_remaining_tags_is_unchanged() {
        for status in ImageStatus::ALL {
            assert_eq!(on_tag_removed(status, 1), status);
            assert_eq!(on_tag_removed(status, 7), status);
        }
    }
}
