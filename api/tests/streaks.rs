mod common;

use api::engine::{activity, assignment};
use common::{insert_case, insert_user, setup_db};
use entity::{user_badge, volunteer_profile};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use std::sync::Arc;
use uuid::Uuid;

async fn complete_one(
    db: &Arc<DatabaseConnection>,
    volunteer: Uuid,
    coordinator: Uuid,
    title: &str,
    now: sea_orm::prelude::DateTimeWithTimeZone,
) -> api::engine::assignment::CompletionOutcome {
    let case_id = insert_case(db, title, "desc", None).await;
    let created = assignment::create_assignment(db, case_id, volunteer, coordinator, None, None, now)
        .await
        .unwrap();
    assignment::accept_assignment(db, created.id, None, now).await.unwrap();
    assignment::complete_assignment(db, created.id, None, now).await.unwrap()
}

async fn profile(db: &Arc<DatabaseConnection>, user: Uuid) -> volunteer_profile::Model {
    volunteer_profile::Entity::find_by_id(user)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn consecutive_days_extend_the_streak() {
    let db = setup_db().await;
    let volunteer = insert_user(&db, "amal@example.test", "Amal").await;
    let coordinator = insert_user(&db, "coord@example.test", "Coordinator").await;

    for (i, day) in ["2026-03-01", "2026-03-02", "2026-03-03"].iter().enumerate() {
        let now = common::at(&format!("{day}T10:00:00Z"));
        complete_one(&db, volunteer, coordinator, &format!("Case {i}"), now).await;
    }
    let p = profile(&db, volunteer).await;
    assert_eq!(p.current_streak, 3);
    assert_eq!(p.longest_streak, 3);
}

#[tokio::test]
async fn a_gap_resets_to_one_but_longest_survives() {
    let db = setup_db().await;
    let volunteer = insert_user(&db, "amal@example.test", "Amal").await;
    let coordinator = insert_user(&db, "coord@example.test", "Coordinator").await;

    for (i, day) in ["2026-03-01", "2026-03-02", "2026-03-03"].iter().enumerate() {
        let now = common::at(&format!("{day}T10:00:00Z"));
        complete_one(&db, volunteer, coordinator, &format!("Case {i}"), now).await;
    }
    // Day 4 missed; day 5 activity starts over at 1.
    let now = common::at("2026-03-05T10:00:00Z");
    complete_one(&db, volunteer, coordinator, "Case after gap", now).await;

    let p = profile(&db, volunteer).await;
    assert_eq!(p.current_streak, 1);
    assert_eq!(p.longest_streak, 3);
}

#[tokio::test]
async fn same_day_events_count_once() {
    let db = setup_db().await;
    let volunteer = insert_user(&db, "amal@example.test", "Amal").await;
    let coordinator = insert_user(&db, "coord@example.test", "Coordinator").await;

    let morning = common::at("2026-03-01T08:00:00Z");
    let evening = common::at("2026-03-01T20:00:00Z");
    complete_one(&db, volunteer, coordinator, "Morning case", morning).await;
    let outcome = complete_one(&db, volunteer, coordinator, "Evening case", evening).await;

    let update = outcome.streak.unwrap();
    assert!(!update.extended);
    let p = profile(&db, volunteer).await;
    assert_eq!(p.current_streak, 1);
    assert_eq!(p.cases_completed, 2);
}

#[tokio::test]
async fn seventh_day_grants_week_warrior_exactly_once() {
    let db = setup_db().await;
    let volunteer = insert_user(&db, "amal@example.test", "Amal").await;
    let coordinator = insert_user(&db, "coord@example.test", "Coordinator").await;

    let mut last = None;
    for day in 1..=7 {
        let now = common::at(&format!("2026-03-0{day}T10:00:00Z"));
        last = Some(complete_one(&db, volunteer, coordinator, &format!("Day {day}"), now).await);
    }
    let outcome = last.unwrap();
    assert!(outcome.awarded.slugs().contains(&"streak-7"));

    let p = profile(&db, volunteer).await;
    assert_eq!(p.current_streak, 7);

    let grants = user_badge::Entity::find()
        .filter(user_badge::Column::UserId.eq(volunteer))
        .all(db.as_ref())
        .await
        .unwrap();
    let badge_ids: Vec<_> = grants.iter().map(|g| g.badge_id).collect();
    let mut deduped = badge_ids.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(badge_ids.len(), deduped.len());
}

#[tokio::test]
async fn direct_engagement_streak_math() {
    let db = setup_db().await;
    let volunteer = insert_user(&db, "amal@example.test", "Amal").await;

    let day1 = common::at("2026-03-01T10:00:00Z");
    let update = activity::register_engagement(
        db.as_ref(),
        volunteer,
        entity::activity_log::Kind::StoryPublished,
        "published",
        activity::STORY_PUBLISH_POINTS,
        serde_json::json!({}),
        day1,
    )
    .await
    .unwrap();
    assert_eq!(update.current_streak, 1);
    assert!(update.extended);

    let day2 = common::at("2026-03-02T10:00:00Z");
    let update = activity::register_engagement(
        db.as_ref(),
        volunteer,
        entity::activity_log::Kind::CaseCompleted,
        "completed",
        activity::CASE_COMPLETION_POINTS,
        serde_json::json!({}),
        day2,
    )
    .await
    .unwrap();
    assert_eq!(update.current_streak, 2);

    let entries = entity::activity_log::Entity::find()
        .filter(entity::activity_log::Column::UserId.eq(volunteer))
        .count(db.as_ref())
        .await
        .unwrap();
    assert_eq!(entries, 2);
}
