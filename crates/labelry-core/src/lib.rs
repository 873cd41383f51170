//! # labelry-core
//!
//! Core types, traits, and abstractions for labelry.
//!
//! This crate provides the domain entities (images, tags, labeler usage),
//! the repository and notifier traits that backends implement, the image
//! status derivation rules, and the [`LabelingEngine`] that ties them together.

pub mod error;
pub mod logging;
#[cfg(any(test, feature = "memory"))]
pub mod memory;
pub mod models;
pub mod notifier;
pub mod status;
pub mod traits;
pub mod workflow;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
#[cfg(any(test, feature = "memory"))]
pub use notifier::RecordingNotifier;
pub use notifier::{NoopNotifier, ScoreEndpoint, ScoreNotice, ScoringNotifier};
pub use traits::*;
pub use workflow::{LabelingEngine, DEFAULT_MAX_TAG_LENGTH};
