//! Structured logging field name constants for labelry.
//!
//! All crates use these constants for consistent structured logging fields
//! so log aggregation can query by the same names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Store failures surfaced to a caller as a generic failure |
//! | WARN  | Recoverable issue (dropped or failed scoring notification) |
//! | INFO  | Lifecycle events, state transitions on images |
//! | DEBUG | Decision points (status unchanged, duplicate usage swallowed) |
//! | TRACE | Per-row detail |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated across a request (UUIDv7).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "workflow", "notifier"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "tag_lifecycle", "status", "usage_guard", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "add_tag", "remove_tag", "record_ai_usage"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Image UUID being operated on.
pub const IMAGE_ID: &str = "image_id";

/// Tag UUID being operated on.
pub const TAG_ID: &str = "tag_id";

/// Acting user UUID.
pub const USER_ID: &str = "user_id";

/// Image status after the operation.
pub const STATUS: &str = "status";

/// Tag provenance.
pub const SOURCE: &str = "source";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Tags remaining on an image after a removal.
pub const REMAINING_TAGS: &str = "remaining_tags";

// ─── Subsystem values ──────────────────────────────────────────────────────

pub const SUBSYSTEM_API: &str = "api";
pub const SUBSYSTEM_DB: &str = "db";
pub const SUBSYSTEM_WORKFLOW: &str = "workflow";
pub const SUBSYSTEM_NOTIFIER: &str = "notifier";
