//! Outbound scoring notifications.
//!
//! Every tag write tells the external scoring service to recompute the
//! author's likelihood score. The call is fire-and-forget: [`ScoringNotifier::notify`]
//! is synchronous and infallible, so an implementation can only hand the
//! notice off (to a queue, a detached task) and can never make the
//! caller wait on or fail because of the scoring service.

use serde::Serialize;
use uuid::Uuid;

/// Which scoring endpoint a notice targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreEndpoint {
    /// Labeler-authored change.
    User,
    /// Administrator edit or approval.
    Admin,
}

impl ScoreEndpoint {
    /// Path of the endpoint relative to the scoring service base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Self::User => "/users/update-likelihood-score",
            Self::Admin => "/admins/update-likelihood-score",
        }
    }
}

/// A request to rescore the author of a tag.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreNotice {
    pub endpoint: ScoreEndpoint,
    pub tag_id: Uuid,
    pub label: String,
    /// Bearer token of the acting user.
    pub auth_token: String,
}

/// Non-blocking sink for score notices.
pub trait ScoringNotifier: Send + Sync {
    /// Submit a notice. Must return promptly and must not panic.
    fn notify(&self, notice: ScoreNotice);
}

/// Notifier that drops every notice. Used when no scoring service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl ScoringNotifier for NoopNotifier {
    fn notify(&self, notice: ScoreNotice) {
        tracing::trace!(
            subsystem = "notifier",
            tag_id = %notice.tag_id,
            "Scoring disabled, notice dropped"
        );
    }
}

/// Notifier that records notices in memory, for assertions in tests.
#[cfg(any(test, feature = "memory"))]
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    notices: std::sync::Arc<std::sync::Mutex<Vec<ScoreNotice>>>,
}

#[cfg(any(test, feature = "memory"))]
impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every notice submitted so far.
    pub fn notices(&self) -> Vec<ScoreNotice> {
        self.notices
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }
}

#[cfg(any(test, feature = "memory"))]
impl ScoringNotifier for RecordingNotifier {
    fn notify(&self, notice: ScoreNotice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(ScoreEndpoint::User.path(), "/users/update-likelihood-score");
        assert_eq!(ScoreEndpoint::Admin.path(), "/admins/update-likelihood-score");
    }

    #[test]
    fn test_recording_notifier_keeps_order() {
        let notifier = RecordingNotifier::new();
        for label in ["cat", "dog"] {
            notifier.notify(ScoreNotice {
                endpoint: ScoreEndpoint::User,
                tag_id: Uuid::new_v4(),
                label: label.to_string(),
                auth_token: "token".to_string(),
            });
        }
        let labels: Vec<_> = notifier.notices().into_iter().map(|n| n.label).collect();
        assert_eq!(labels, vec!["cat", "dog"]);
    }
}
