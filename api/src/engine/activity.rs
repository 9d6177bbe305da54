use chrono::{Duration, NaiveDate};
use entity::{activity_log, volunteer_profile};
use platform_api::EngineResult;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter,
};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Points credited when a volunteer completes a case.
pub const CASE_COMPLETION_POINTS: i32 = 50;
/// Points credited when a story is first published.
pub const STORY_PUBLISH_POINTS: i32 = 15;
/// Points credited when an assignment is accepted.
pub const ACCEPTANCE_POINTS: i32 = 5;

/// Outcome of a streak recalculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakUpdate {
    pub current_streak: i32,
    pub longest_streak: i32,
    /// False when the user already had a qualifying entry today, in which
    /// case the streak counters were left untouched.
    pub extended: bool,
}

/// Fetch the profile for `user_id`, creating a zeroed row on first contact.
/// The insert races benignly: ON CONFLICT DO NOTHING and re-read.
pub async fn ensure_profile<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    now: DateTimeWithTimeZone,
) -> EngineResult<volunteer_profile::Model> {
    if let Some(profile) = volunteer_profile::Entity::find_by_id(user_id).one(conn).await? {
        return Ok(profile);
    }
    let fresh = volunteer_profile::ActiveModel {
        user_id: Set(user_id),
        skills: Set(None),
        availability: Set(None),
        is_onboarded: Set(false),
        cases_accepted: Set(0),
        cases_completed: Set(0),
        current_streak: Set(0),
        longest_streak: Set(0),
        last_activity: Set(None),
        total_points: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    };
    volunteer_profile::Entity::insert(fresh)
        .on_conflict(
            OnConflict::column(volunteer_profile::Column::UserId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    let profile = volunteer_profile::Entity::find_by_id(user_id)
        .one(conn)
        .await?
        .ok_or(platform_api::EngineError::NotFound("volunteer profile"))?;
    Ok(profile)
}

/// Does the ledger hold any entry for `user_id` dated `day`?
pub async fn was_active_on<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    day: NaiveDate,
) -> EngineResult<bool> {
    let hits = activity_log::Entity::find()
        .filter(activity_log::Column::UserId.eq(user_id))
        .filter(activity_log::Column::ActivityDate.eq(day))
        .count(conn)
        .await?;
    Ok(hits > 0)
}

/// Did a streak-driving event (completion or publish) already land on `day`?
/// Acceptances and badge grants keep the streak alive but never bump it, so
/// they are excluded here.
async fn streak_counted_on<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    day: NaiveDate,
) -> EngineResult<bool> {
    let hits = activity_log::Entity::find()
        .filter(activity_log::Column::UserId.eq(user_id))
        .filter(activity_log::Column::ActivityDate.eq(day))
        .filter(activity_log::Column::Kind.is_in([
            activity_log::Kind::CaseCompleted,
            activity_log::Kind::StoryPublished,
        ]))
        .count(conn)
        .await?;
    Ok(hits > 0)
}

/// Append one ledger entry. The ledger is append-only; nothing edits or
/// deletes rows after this.
pub async fn record_activity<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    kind: activity_log::Kind,
    description: impl Into<String>,
    points_earned: i32,
    meta: JsonValue,
    now: DateTimeWithTimeZone,
) -> EngineResult<activity_log::Model> {
    let entry = activity_log::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        kind: Set(kind),
        description: Set(description.into()),
        points_earned: Set(points_earned),
        meta: Set(meta),
        activity_date: Set(now.date_naive()),
        created_at: Set(now),
    };
    let inserted = entry.insert(conn).await?;
    Ok(inserted)
}

/// Credit points to the profile with an atomic column expression, so
/// concurrent writers never lose an increment.
pub async fn credit_points<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    points: i32,
    now: DateTimeWithTimeZone,
) -> EngineResult<()> {
    volunteer_profile::Entity::update_many()
        .col_expr(
            volunteer_profile::Column::TotalPoints,
            Expr::col(volunteer_profile::Column::TotalPoints).add(i64::from(points)),
        )
        .col_expr(volunteer_profile::Column::UpdatedAt, Expr::value(now))
        .filter(volunteer_profile::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;
    Ok(())
}

/// Register a qualifying engagement event: append the ledger entry, credit
/// points, stamp `last_activity` and recalculate the streak.
///
/// The same-day check runs BEFORE the append, so a second event on the same
/// calendar day never inflates the streak. A gap of exactly one day extends
/// it; anything longer resets to 1.
pub async fn register_engagement<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    kind: activity_log::Kind,
    description: impl Into<String>,
    points: i32,
    meta: JsonValue,
    now: DateTimeWithTimeZone,
) -> EngineResult<StreakUpdate> {
    let profile = ensure_profile(conn, user_id, now).await?;
    let today = now.date_naive();
    let already_counted_today = streak_counted_on(conn, user_id, today).await?;

    record_activity(conn, user_id, kind, description, points, meta, now).await?;

    let update = if already_counted_today {
        StreakUpdate {
            current_streak: profile.current_streak,
            longest_streak: profile.longest_streak,
            extended: false,
        }
    } else {
        let yesterday = today - Duration::days(1);
        let active_yesterday = was_active_on(conn, user_id, yesterday).await?;
        let current = if active_yesterday {
            profile.current_streak + 1
        } else {
            1
        };
        StreakUpdate {
            current_streak: current,
            longest_streak: profile.longest_streak.max(current),
            extended: true,
        }
    };

    let mut query = volunteer_profile::Entity::update_many()
        .col_expr(
            volunteer_profile::Column::TotalPoints,
            Expr::col(volunteer_profile::Column::TotalPoints).add(i64::from(points)),
        )
        .col_expr(volunteer_profile::Column::LastActivity, Expr::value(Some(now)))
        .col_expr(volunteer_profile::Column::UpdatedAt, Expr::value(now));
    if update.extended {
        query = query
            .col_expr(
                volunteer_profile::Column::CurrentStreak,
                Expr::value(update.current_streak),
            )
            .col_expr(
                volunteer_profile::Column::LongestStreak,
                Expr::value(update.longest_streak),
            );
    }
    query
        .filter(volunteer_profile::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;

    Ok(update)
}
