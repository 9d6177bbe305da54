use entity::{activity_log, badge, user_badge};
use platform_api::{EngineError, EngineResult};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue::Set, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use serde_json::json;
use uuid::Uuid;

use super::activity;

pub const MILESTONE_THRESHOLDS: &[i32] = &[1, 5, 10, 25, 50, 100];
pub const STREAK_THRESHOLDS: &[i32] = &[3, 7, 14, 30, 100];
pub const STORY_THRESHOLDS: &[i32] = &[1, 5, 10, 25];

/// What a badge award cycle handed out.
#[derive(Debug, Clone, Default)]
pub struct AwardedBadges(pub Vec<badge::Model>);

impl AwardedBadges {
    pub fn slugs(&self) -> Vec<&str> {
        self.0.iter().map(|b| b.slug.as_str()).collect()
    }
}

async fn badge_for_threshold<C: ConnectionTrait>(
    conn: &C,
    category: badge::Category,
    column: badge::Column,
    threshold: i32,
) -> EngineResult<badge::Model> {
    badge::Entity::find()
        .filter(badge::Column::Category.eq(category))
        .filter(column.eq(threshold))
        .filter(badge::Column::IsActive.eq(true))
        .one(conn)
        .await?
        .ok_or_else(|| {
            EngineError::from(anyhow::anyhow!(
                "badge catalog has no active {:?} badge at threshold {}",
                category,
                threshold
            ))
        })
}

/// Grant `badge` to `user_id` at most once. Returns true when the grant row
/// was created in this call; the duplicate-insert branch is the idempotency
/// signal, so credit and ledger writes only happen on the created path.
pub async fn grant_badge<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    badge: &badge::Model,
    earned_for_case: Option<Uuid>,
    earned_for_story: Option<Uuid>,
    now: DateTimeWithTimeZone,
) -> EngineResult<bool> {
    let grant = user_badge::ActiveModel {
        user_id: Set(user_id),
        badge_id: Set(badge.id),
        earned_at: Set(now),
        earned_for_case: Set(earned_for_case),
        earned_for_story: Set(earned_for_story),
    };
    let inserted = user_badge::Entity::insert(grant)
        .on_conflict(
            OnConflict::columns([user_badge::Column::UserId, user_badge::Column::BadgeId])
                .do_nothing()
                .to_owned(),
        )
        .exec(conn)
        .await;
    match inserted {
        Ok(_) => {}
        Err(DbErr::RecordNotInserted) => return Ok(false),
        Err(err) => return Err(err.into()),
    }

    activity::record_activity(
        conn,
        user_id,
        activity_log::Kind::BadgeEarned,
        format!("Earned badge: {}", badge.name),
        badge.points_value,
        json!({ "badge_slug": badge.slug }),
        now,
    )
    .await?;
    activity::credit_points(conn, user_id, badge.points_value, now).await?;
    Ok(true)
}

/// Award every milestone badge whose threshold `cases_completed` has reached.
/// Awarding the whole prefix (not just the exact value) backfills users whose
/// earlier completions predate a catalog addition.
pub async fn award_case_badges<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    cases_completed: i32,
    case_id: Option<Uuid>,
    now: DateTimeWithTimeZone,
) -> EngineResult<AwardedBadges> {
    let mut awarded = AwardedBadges::default();
    for &threshold in MILESTONE_THRESHOLDS {
        if cases_completed < threshold {
            break;
        }
        let badge = badge_for_threshold(
            conn,
            badge::Category::Milestone,
            badge::Column::RequiredCases,
            threshold,
        )
        .await?;
        if grant_badge(conn, user_id, &badge, case_id, None, now).await? {
            awarded.0.push(badge);
        }
    }
    Ok(awarded)
}

pub async fn award_streak_badges<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    current_streak: i32,
    now: DateTimeWithTimeZone,
) -> EngineResult<AwardedBadges> {
    let mut awarded = AwardedBadges::default();
    for &threshold in STREAK_THRESHOLDS {
        if current_streak < threshold {
            break;
        }
        let badge = badge_for_threshold(
            conn,
            badge::Category::Streak,
            badge::Column::RequiredStreak,
            threshold,
        )
        .await?;
        if grant_badge(conn, user_id, &badge, None, None, now).await? {
            awarded.0.push(badge);
        }
    }
    Ok(awarded)
}

pub async fn award_story_badges<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    stories_published: i32,
    story_id: Option<Uuid>,
    now: DateTimeWithTimeZone,
) -> EngineResult<AwardedBadges> {
    let mut awarded = AwardedBadges::default();
    for &threshold in STORY_THRESHOLDS {
        if stories_published < threshold {
            break;
        }
        let badge = badge_for_threshold(
            conn,
            badge::Category::Community,
            badge::Column::RequiredStories,
            threshold,
        )
        .await?;
        if grant_badge(conn, user_id, &badge, None, story_id, now).await? {
            awarded.0.push(badge);
        }
    }
    Ok(awarded)
}
