mod common;

use api::engine::{activity, goals};
use chrono::{Duration as ChronoDuration, NaiveDate};
use common::{insert_user, setup_db};
use entity::{activity_log, community_goal};
use serde_json::json;

#[tokio::test]
async fn quiet_month_gets_the_floor_target() {
    let db = setup_db().await;
    let now = common::at("2026-03-10T12:00:00Z");

    let goal = goals::create_monthly_case_goal(db.as_ref(), 1.2, now)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(goal.goal_type, community_goal::GoalType::Cases);
    // No trailing completions at all, so the floor applies.
    assert_eq!(goal.target_value, 50);
    assert_eq!(goal.current_value, 0);
    assert_eq!(goal.start_date, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    assert_eq!(goal.end_date, NaiveDate::from_ymd_opt(2026, 3, 31).unwrap());
    assert!(goal.is_active);
    assert!(goal.is_featured);

    // One goal per month window; a second call is a no-op.
    let again = goals::create_monthly_case_goal(db.as_ref(), 1.2, now)
        .await
        .unwrap();
    assert!(again.is_none());
}

#[tokio::test]
async fn busy_month_scales_trailing_velocity() {
    let db = setup_db().await;
    let volunteer = insert_user(&db, "amal@example.test", "Amal").await;
    let now = common::at("2026-03-10T12:00:00Z");

    // 60 completions inside the trailing 30 days, 10 well outside it.
    for i in 0..60 {
        let when = now - ChronoDuration::days(i64::from(i % 25));
        activity::record_activity(
            db.as_ref(),
            volunteer,
            activity_log::Kind::CaseCompleted,
            "done",
            50,
            json!({}),
            when,
        )
        .await
        .unwrap();
    }
    for _ in 0..10 {
        activity::record_activity(
            db.as_ref(),
            volunteer,
            activity_log::Kind::CaseCompleted,
            "done",
            50,
            json!({}),
            now - ChronoDuration::days(40),
        )
        .await
        .unwrap();
    }

    // 60 in-window completions scaled by 1.2; the stale ones are ignored.
    let goal = goals::create_monthly_case_goal(db.as_ref(), 1.2, now)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(goal.target_value, 72);
}
