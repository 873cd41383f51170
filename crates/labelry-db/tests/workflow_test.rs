//! Workflow engine over PostgreSQL.
//!
//! Requires a migrated database at `DATABASE_URL` (see `test_fixtures`).

use std::sync::Arc;

use chrono::Duration;
use labelry_db::test_fixtures::TestDatabase;
use labelry_db::{
    Caller, Error, ImageRepository, ImageStatus, LabelingEngine, NoopNotifier, SessionRepository,
    TagSource,
};
use uuid::Uuid;

struct Setup {
    test_db: TestDatabase,
    engine: LabelingEngine,
    labeler: Caller,
    admin: Caller,
    group: Uuid,
    image: Uuid,
}

async fn setup() -> Setup {
    let test_db = TestDatabase::new().await.expect("connect test database");
    let labeler_id = test_db.create_user(false, Some(0.75)).await.unwrap();
    let admin_id = test_db.create_user(true, None).await.unwrap();
    let group = test_db.create_group().await.unwrap();
    let image = test_db.create_image(group).await.unwrap();
    let engine = test_db.db.engine(Arc::new(NoopNotifier));
    Setup {
        engine,
        labeler: Caller::new(labeler_id, false, "labeler-token"),
        admin: Caller::new(admin_id, true, "admin-token"),
        group,
        image,
        test_db,
    }
}

async fn image_status(s: &Setup) -> ImageStatus {
    s.test_db
        .db
        .images
        .fetch(s.image)
        .await
        .unwrap()
        .expect("image exists")
        .status
}

#[tokio::test]
async fn test_tag_lifecycle_drives_status() {
    let s = setup().await;

    let first = s
        .engine
        .add_tag(&s.labeler, s.image, "cat", TagSource::User)
        .await
        .unwrap();
    assert_eq!(first.likelihood_score, Some(0.75));
    assert_eq!(image_status(&s).await, ImageStatus::Labeled);

    let second = s
        .engine
        .add_tag(&s.labeler, s.image, "  dog ", TagSource::Ai)
        .await
        .unwrap();
    assert_eq!(second.value, "dog");

    s.engine.remove_tag(&s.labeler, first.id).await.unwrap();
    assert_eq!(image_status(&s).await, ImageStatus::Labeled);

    s.engine.remove_tag(&s.labeler, second.id).await.unwrap();
    assert_eq!(image_status(&s).await, ImageStatus::Unlabeled);
}

#[tokio::test]
async fn test_reviewed_survives_additions_but_not_last_removal() {
    let s = setup().await;
    s.engine
        .set_image_status(&s.admin, s.image, ImageStatus::Reviewed)
        .await
        .unwrap();

    let tag = s
        .engine
        .add_tag(&s.labeler, s.image, "cat", TagSource::User)
        .await
        .unwrap();
    assert_eq!(image_status(&s).await, ImageStatus::Reviewed);

    s.engine.remove_tag(&s.admin, tag.id).await.unwrap();
    assert_eq!(image_status(&s).await, ImageStatus::Unlabeled);
}

#[tokio::test]
async fn test_approve_rewrites_value_and_source() {
    let s = setup().await;
    let tag = s
        .engine
        .add_tag(&s.labeler, s.image, "kitten", TagSource::User)
        .await
        .unwrap();

    let approved = s.engine.approve_tag(&s.admin, tag.id, "cat").await.unwrap();
    assert_eq!(approved.value, "cat");
    assert_eq!(approved.source, TagSource::Admin);
    assert_eq!(approved.created_by_id, s.labeler.user_id);
    assert!(approved.updated_at >= tag.updated_at);
}

#[tokio::test]
async fn test_get_image_lists_tags_newest_first() {
    let s = setup().await;
    for value in ["one", "two", "three"] {
        s.engine
            .add_tag(&s.labeler, s.image, value, TagSource::User)
            .await
            .unwrap();
    }
    let view = s.engine.get_image(s.image).await.unwrap();
    let values: Vec<_> = view.tags.iter().map(|t| t.value.as_str()).collect();
    assert_eq!(values, vec!["three", "two", "one"]);
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let s = setup().await;
    let missing = Uuid::new_v4();

    let err = s
        .engine
        .add_tag(&s.labeler, missing, "cat", TagSource::User)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ImageNotFound(id) if id == missing));

    let err = s.engine.remove_tag(&s.labeler, missing).await.unwrap_err();
    assert!(matches!(err, Error::TagNotFound(id) if id == missing));

    let err = s
        .engine
        .update_tag(&s.labeler, missing, "cat", TagSource::User)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TagNotFound(_)));
}

#[tokio::test]
async fn test_register_image_in_unknown_group() {
    let s = setup().await;
    let err = s
        .engine
        .register_image(
            &s.admin,
            labelry_db::NewImage {
                group_id: Uuid::new_v4(),
                filename: "a.png".to_string(),
                original_name: "a.png".to_string(),
                url: "https://bucket.test/a.png".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let image = s
        .engine
        .register_image(
            &s.admin,
            labelry_db::NewImage {
                group_id: s.group,
                filename: "b.png".to_string(),
                original_name: "b.png".to_string(),
                url: "https://bucket.test/b.png".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(image.status, ImageStatus::Unlabeled);
}

#[tokio::test]
async fn test_status_counts_scoped_to_group() {
    let s = setup().await;
    let second = s.test_db.create_image(s.group).await.unwrap();
    s.engine
        .add_tag(&s.labeler, second, "cat", TagSource::User)
        .await
        .unwrap();

    let counts = s.engine.status_counts(&s.admin, Some(s.group)).await.unwrap();
    assert_eq!(counts.unlabeled, 1);
    assert_eq!(counts.labeled, 1);
    assert_eq!(counts.reviewed, 0);
    assert_eq!(counts.total(), 2);
}

#[tokio::test]
async fn test_usage_guard_is_idempotent() {
    let s = setup().await;
    let user = s.labeler.user_id;

    assert!(!s.engine.has_used_ai(user, s.image).await.unwrap());
    s.engine.record_ai_usage(user, s.image).await.unwrap();
    s.engine.record_ai_usage(user, s.image).await.unwrap();
    assert!(s.engine.has_used_ai(user, s.image).await.unwrap());

    let rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM labeler_usage WHERE user_id = $1 AND image_id = $2",
    )
    .bind(user)
    .bind(s.image)
    .fetch_one(s.test_db.db.pool())
    .await
    .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn test_concurrent_usage_records_leave_one_row() {
    let s = setup().await;
    let user = s.labeler.user_id;

    let attempts = (0..8).map(|_| s.engine.record_ai_usage(user, s.image));
    for result in futures::future::join_all(attempts).await {
        result.unwrap();
    }

    let rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM labeler_usage WHERE user_id = $1 AND image_id = $2",
    )
    .bind(user)
    .bind(s.image)
    .fetch_one(s.test_db.db.pool())
    .await
    .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn test_usage_for_missing_image() {
    let s = setup().await;
    let err = s
        .engine
        .record_ai_usage(s.labeler.user_id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ImageNotFound(_)));
}

#[tokio::test]
async fn test_usage_for_unknown_user() {
    let s = setup().await;
    let ghost = Uuid::new_v4();
    let err = s
        .engine
        .record_ai_usage(ghost, s.image)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(ref msg) if msg.contains(&ghost.to_string())));
    assert!(!s.engine.has_used_ai(ghost, s.image).await.unwrap());
}

#[tokio::test]
async fn test_sessions_resolve_only_while_valid() {
    let s = setup().await;
    let live = s
        .test_db
        .create_session(s.admin.user_id, Duration::hours(1))
        .await
        .unwrap();
    let expired = s
        .test_db
        .create_session(s.labeler.user_id, Duration::hours(-1))
        .await
        .unwrap();

    let caller = s
        .test_db
        .db
        .sessions
        .resolve_caller(&live)
        .await
        .unwrap()
        .expect("live session resolves");
    assert_eq!(caller.user_id, s.admin.user_id);
    assert!(caller.admin);
    assert_eq!(caller.auth_token, live);

    assert!(s
        .test_db
        .db
        .sessions
        .resolve_caller(&expired)
        .await
        .unwrap()
        .is_none());
    assert!(s
        .test_db
        .db
        .sessions
        .resolve_caller("no-such-token")
        .await
        .unwrap()
        .is_none());
}
