//! HTTP delivery of scoring notices.
//!
//! [`HttpScoringNotifier::notify`] only enqueues. A detached worker drains
//! the bounded queue and POSTs each notice to the scoring service with the
//! caller's bearer token. Nothing is retried: a full queue drops the notice,
//! and a failed delivery is logged and forgotten.

use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use labelry_core::logging::SUBSYSTEM_NOTIFIER;
use labelry_core::{Error, Result, ScoreNotice, ScoringNotifier};

/// Queue-backed notifier that delivers over HTTP.
#[derive(Clone)]
pub struct HttpScoringNotifier {
    tx: mpsc::Sender<ScoreNotice>,
}

impl HttpScoringNotifier {
    /// Create the notifier and spawn its delivery worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(base_url: impl Into<String>, capacity: usize, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("scoring HTTP client: {}", e)))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let (tx, rx) = mpsc::channel(capacity.max(1));

        tokio::spawn(delivery_worker(client, base_url, rx));
        Ok(Self { tx })
    }
}

impl ScoringNotifier for HttpScoringNotifier {
    fn notify(&self, notice: ScoreNotice) {
        match self.tx.try_send(notice) {
            Ok(()) => {}
            Err(TrySendError::Full(notice)) => {
                warn!(
                    subsystem = SUBSYSTEM_NOTIFIER,
                    tag_id = %notice.tag_id,
                    "Scoring queue full, notice dropped"
                );
            }
            Err(TrySendError::Closed(notice)) => {
                warn!(
                    subsystem = SUBSYSTEM_NOTIFIER,
                    tag_id = %notice.tag_id,
                    "Scoring worker stopped, notice dropped"
                );
            }
        }
    }
}

async fn delivery_worker(
    client: reqwest::Client,
    base_url: String,
    mut rx: mpsc::Receiver<ScoreNotice>,
) {
    while let Some(notice) = rx.recv().await {
        deliver(&client, &base_url, &notice).await;
    }
    debug!(subsystem = SUBSYSTEM_NOTIFIER, "Scoring queue closed, worker exiting");
}

async fn deliver(client: &reqwest::Client, base_url: &str, notice: &ScoreNotice) {
    let url = format!("{}{}", base_url, notice.endpoint.path());
    let result = client
        .post(&url)
        .bearer_auth(&notice.auth_token)
        .json(&json!({
            "tag_id": notice.tag_id,
            "label": notice.label,
        }))
        .send()
        .await;

    match result {
        Ok(response) if response.status().is_success() => {
            debug!(
                subsystem = SUBSYSTEM_NOTIFIER,
                tag_id = %notice.tag_id,
                endpoint = notice.endpoint.path(),
                "Scoring notice delivered"
            );
        }
        Ok(response) => {
            warn!(
                subsystem = SUBSYSTEM_NOTIFIER,
                tag_id = %notice.tag_id,
                endpoint = notice.endpoint.path(),
                status = response.status().as_u16(),
                "Scoring service rejected notice"
            );
        }
        Err(e) => {
            warn!(
                subsystem = SUBSYSTEM_NOTIFIER,
                tag_id = %notice.tag_id,
                endpoint = notice.endpoint.path(),
                error = %e,
                "Scoring notice delivery failed"
            );
        }
    }
}
