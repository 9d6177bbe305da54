mod common;

use api::engine::{activity, assignment, stats, stories};
use common::{insert_case, insert_draft_story, insert_goal, insert_user, setup_db};
use entity::{activity_log, case_record, community_goal, email_schedule, volunteer_profile};
use platform_api::EngineError;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

#[tokio::test]
async fn full_completion_pipeline() {
    let db = setup_db().await;
    let volunteer = insert_user(&db, "amal@example.test", "Amal").await;
    let coordinator = insert_user(&db, "coord@example.test", "Coordinator").await;
    let case_id = insert_case(&db, "Food delivery", "Deliver groceries", Some(4)).await;
    insert_goal(&db, "CASES", 50, "2026-01-01", "2026-12-31").await;

    let now = common::at("2026-03-10T12:00:00Z");
    let created = assignment::create_assignment(
        &db, case_id, volunteer, coordinator, None, Some(3), now,
    )
    .await
    .unwrap();
    assert_eq!(created.status, entity::assignment::Status::Pending);

    let accepted = assignment::accept_assignment(&db, created.id, Some("glad to".into()), now)
        .await
        .unwrap();
    assert_eq!(accepted.status, entity::assignment::Status::Accepted);
    assert_eq!(accepted.accepted_at, Some(now));

    let started = assignment::start_assignment(&db, created.id, now).await.unwrap();
    assert_eq!(started.status, entity::assignment::Status::InProgress);

    let outcome = assignment::complete_assignment(&db, created.id, Some(2), now)
        .await
        .unwrap();
    assert_eq!(
        outcome.assignment.status,
        entity::assignment::Status::Completed
    );
    assert_eq!(outcome.assignment.completed_at, Some(now));
    assert_eq!(outcome.assignment.actual_hours, Some(2));
    assert_eq!(outcome.awarded.slugs(), vec!["first-case"]);

    let profile = volunteer_profile::Entity::find_by_id(volunteer)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.cases_accepted, 1);
    assert_eq!(profile.cases_completed, 1);
    assert_eq!(profile.current_streak, 1);
    // 5 acceptance + 50 completion + 2 first-case bonus
    assert_eq!(profile.total_points, 57);
    assert_eq!(profile.last_activity, Some(now));

    let case = case_record::Entity::find_by_id(case_id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(case.status, "RESOLVED");
    assert_eq!(case.resolved_at, Some(now));

    let goal = community_goal::Entity::find()
        .filter(community_goal::Column::GoalType.eq(community_goal::GoalType::Cases))
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(goal.current_value, 1);

    let notices = email_schedule::Entity::find()
        .filter(email_schedule::Column::Kind.eq(email_schedule::Kind::CompletionNotice))
        .count(db.as_ref())
        .await
        .unwrap();
    assert_eq!(notices, 1);
}

#[tokio::test]
async fn completion_is_idempotent() {
    let db = setup_db().await;
    let volunteer = insert_user(&db, "amal@example.test", "Amal").await;
    let coordinator = insert_user(&db, "coord@example.test", "Coordinator").await;
    let case_id = insert_case(&db, "Tutoring", "Weekly math tutoring", Some(3)).await;

    let now = common::at("2026-03-10T12:00:00Z");
    let created =
        assignment::create_assignment(&db, case_id, volunteer, coordinator, None, None, now)
            .await
            .unwrap();
    assignment::accept_assignment(&db, created.id, None, now).await.unwrap();
    let first = assignment::complete_assignment(&db, created.id, None, now).await.unwrap();
    assert_eq!(first.awarded.slugs(), vec!["first-case"]);

    let second = assignment::complete_assignment(&db, created.id, None, now).await.unwrap();
    assert!(second.awarded.0.is_empty());
    assert!(second.streak.is_none());

    let profile = volunteer_profile::Entity::find_by_id(volunteer)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.cases_completed, 1);
    assert_eq!(profile.total_points, 57);

    let completion_entries = activity_log::Entity::find()
        .filter(activity_log::Column::UserId.eq(volunteer))
        .filter(activity_log::Column::Kind.eq(activity_log::Kind::CaseCompleted))
        .count(db.as_ref())
        .await
        .unwrap();
    assert_eq!(completion_entries, 1);
}

#[tokio::test]
async fn duplicate_assignment_is_a_conflict() {
    let db = setup_db().await;
    let volunteer = insert_user(&db, "amal@example.test", "Amal").await;
    let coordinator = insert_user(&db, "coord@example.test", "Coordinator").await;
    let case_id = insert_case(&db, "Food delivery", "Deliver groceries", None).await;

    let now = common::at("2026-03-10T12:00:00Z");
    assignment::create_assignment(&db, case_id, volunteer, coordinator, None, None, now)
        .await
        .unwrap();
    let err = assignment::create_assignment(&db, case_id, volunteer, coordinator, None, None, now)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
}

#[tokio::test]
async fn completing_a_pending_assignment_is_rejected() {
    let db = setup_db().await;
    let volunteer = insert_user(&db, "amal@example.test", "Amal").await;
    let coordinator = insert_user(&db, "coord@example.test", "Coordinator").await;
    let case_id = insert_case(&db, "Food delivery", "Deliver groceries", None).await;

    let now = common::at("2026-03-10T12:00:00Z");
    let created =
        assignment::create_assignment(&db, case_id, volunteer, coordinator, None, None, now)
            .await
            .unwrap();
    let err = assignment::complete_assignment(&db, created.id, None, now).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition { .. }));

    let unchanged = entity::assignment::Entity::find_by_id(created.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.status, entity::assignment::Status::Pending);
}

#[tokio::test]
async fn fifth_completion_grants_helper_badge() {
    let db = setup_db().await;
    let volunteer = insert_user(&db, "amal@example.test", "Amal").await;
    let coordinator = insert_user(&db, "coord@example.test", "Coordinator").await;
    let now = common::at("2026-03-10T12:00:00Z");

    let mut last_awarded = Vec::new();
    for i in 0..5 {
        let case_id = insert_case(&db, &format!("Case {i}"), "desc", None).await;
        let created =
            assignment::create_assignment(&db, case_id, volunteer, coordinator, None, None, now)
                .await
                .unwrap();
        assignment::accept_assignment(&db, created.id, None, now).await.unwrap();
        let outcome = assignment::complete_assignment(&db, created.id, None, now).await.unwrap();
        last_awarded = outcome.awarded.slugs().iter().map(|s| s.to_string()).collect();
    }
    assert_eq!(last_awarded, vec!["helper"]);

    let profile = volunteer_profile::Entity::find_by_id(volunteer)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.cases_completed, 5);
    // Five same-day completions count as one streak day.
    assert_eq!(profile.current_streak, 1);
}

#[tokio::test]
async fn expired_goals_stop_incrementing() {
    let db = setup_db().await;
    let volunteer = insert_user(&db, "amal@example.test", "Amal").await;
    let coordinator = insert_user(&db, "coord@example.test", "Coordinator").await;
    let case_id = insert_case(&db, "Food delivery", "Deliver groceries", None).await;
    let expired = insert_goal(&db, "CASES", 50, "2025-01-01", "2025-12-31").await;

    let now = common::at("2026-03-10T12:00:00Z");
    let created =
        assignment::create_assignment(&db, case_id, volunteer, coordinator, None, None, now)
            .await
            .unwrap();
    assignment::accept_assignment(&db, created.id, None, now).await.unwrap();
    assignment::complete_assignment(&db, created.id, None, now).await.unwrap();

    let goal = community_goal::Entity::find_by_id(expired)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(goal.current_value, 0);
}

#[tokio::test]
async fn inserted_rows_round_trip_by_generated_id() {
    let db = setup_db().await;
    let volunteer = insert_user(&db, "amal@example.test", "Amal").await;
    let coordinator = insert_user(&db, "coord@example.test", "Coordinator").await;
    let case_id = insert_case(&db, "Food delivery", "Deliver groceries", None).await;
    let now = common::at("2026-03-10T12:00:00Z");

    let created =
        assignment::create_assignment(&db, case_id, volunteer, coordinator, None, None, now)
            .await
            .unwrap();
    assert!(!created.id.is_nil());
    let found = entity::assignment::Entity::find_by_id(created.id)
        .one(db.as_ref())
        .await
        .unwrap();
    assert_eq!(found.map(|a| a.id), Some(created.id));

    let entry = activity::record_activity(
        db.as_ref(),
        volunteer,
        activity_log::Kind::CaseCompleted,
        "done",
        50,
        serde_json::json!({}),
        now,
    )
    .await
    .unwrap();
    assert!(!entry.id.is_nil());
    let found = activity_log::Entity::find_by_id(entry.id)
        .one(db.as_ref())
        .await
        .unwrap();
    assert_eq!(found.map(|e| e.user_id), Some(volunteer));
}

#[tokio::test]
async fn terminal_exits_carry_no_completion_timestamp() {
    let db = setup_db().await;
    let volunteer = insert_user(&db, "amal@example.test", "Amal").await;
    let coordinator = insert_user(&db, "coord@example.test", "Coordinator").await;
    let now = common::at("2026-03-10T12:00:00Z");

    let first_case = insert_case(&db, "Food delivery", "Deliver groceries", None).await;
    let declined_target =
        assignment::create_assignment(&db, first_case, volunteer, coordinator, None, None, now)
            .await
            .unwrap();
    let declined =
        assignment::decline_assignment(&db, declined_target.id, Some("no capacity".into()))
            .await
            .unwrap();
    assert_eq!(declined.status, entity::assignment::Status::Declined);
    assert_eq!(declined.volunteer_response.as_deref(), Some("no capacity"));
    assert_eq!(declined.completed_at, None);

    let second_case = insert_case(&db, "Tutoring", "Weekly math tutoring", None).await;
    let cancel_target =
        assignment::create_assignment(&db, second_case, volunteer, coordinator, None, None, now)
            .await
            .unwrap();
    let cancelled = assignment::cancel_assignment(&db, cancel_target.id).await.unwrap();
    assert_eq!(cancelled.status, entity::assignment::Status::Cancelled);
    assert_eq!(cancelled.completed_at, None);
}

#[tokio::test]
async fn story_publish_credits_author_once() {
    let db = setup_db().await;
    let author = insert_user(&db, "amal@example.test", "Amal").await;
    let story_id = insert_draft_story(&db, author, "How we helped").await;
    insert_goal(&db, "STORIES", 20, "2026-01-01", "2026-12-31").await;

    let now = common::at("2026-03-10T12:00:00Z");
    let outcome = stories::publish_story(&db, story_id, now).await.unwrap();
    assert_eq!(outcome.story.status, entity::story::Status::Published);
    assert_eq!(outcome.story.published_at, Some(now));
    assert_eq!(outcome.awarded.slugs(), vec!["storyteller"]);

    // Re-publish is a no-op.
    let again = stories::publish_story(&db, story_id, now).await.unwrap();
    assert!(again.streak.is_none());
    assert!(again.awarded.0.is_empty());

    let profile = volunteer_profile::Entity::find_by_id(author)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    // 15 publish + 5 storyteller bonus
    assert_eq!(profile.total_points, 20);

    let goal = community_goal::Entity::find()
        .filter(community_goal::Column::GoalType.eq(community_goal::GoalType::Stories))
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(goal.current_value, 1);
}

#[tokio::test]
async fn dashboard_reflects_pipeline_output() {
    let db = setup_db().await;
    let volunteer = insert_user(&db, "amal@example.test", "Amal").await;
    let rival = insert_user(&db, "rival@example.test", "Rival").await;
    let coordinator = insert_user(&db, "coord@example.test", "Coordinator").await;
    let now = common::at("2026-03-10T12:00:00Z");

    common::set_profile_counters(&db, rival, 20, 0, None, None).await;
    activity::credit_points(db.as_ref(), rival, 1_000, now).await.unwrap();

    let case_id = insert_case(&db, "Food delivery", "Deliver groceries", None).await;
    let created =
        assignment::create_assignment(&db, case_id, volunteer, coordinator, None, None, now)
            .await
            .unwrap();
    assignment::accept_assignment(&db, created.id, None, now).await.unwrap();
    assignment::complete_assignment(&db, created.id, None, now).await.unwrap();

    let dashboard = stats::dashboard_stats(db.as_ref(), volunteer, now).await.unwrap();
    assert_eq!(dashboard.cases_completed, 1);
    assert_eq!(dashboard.current_streak, 1);
    assert_eq!(dashboard.total_points, 57);
    assert_eq!(dashboard.community_rank, 2);
    assert_eq!(dashboard.active_assignments, 0);
    assert_eq!(dashboard.recent_badges.len(), 1);
    assert!(!dashboard.recent_activities.is_empty());

    let community = stats::community_stats(db.as_ref(), now).await.unwrap();
    assert_eq!(community.total_cases_resolved, 1);
    assert_eq!(community.total_volunteers, 2);
    assert_eq!(community.top_volunteers.len(), 2);
    assert_eq!(community.top_volunteers[0].0.user_id, rival);
}
