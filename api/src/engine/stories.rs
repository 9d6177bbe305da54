use entity::{activity_log, community_goal, email_schedule, story};
use platform_api::{EngineError, EngineResult};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use super::{activity, badges, goals, outbox};

#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub story: story::Model,
    pub streak: Option<activity::StreakUpdate>,
    pub awarded: badges::AwardedBadges,
}

/// Publish a draft story and run the engagement pipeline for its author.
/// Re-publishing an already published story is a no-op: no second credit,
/// no badge re-evaluation.
pub async fn publish_story(
    db: &DatabaseConnection,
    story_id: Uuid,
    now: DateTimeWithTimeZone,
) -> EngineResult<PublishOutcome> {
    let txn = db.begin().await?;
    let existing = story::Entity::find_by_id(story_id)
        .one(&txn)
        .await?
        .ok_or(EngineError::NotFound("story"))?;

    if existing.status == story::Status::Published {
        txn.commit().await?;
        return Ok(PublishOutcome {
            story: existing,
            streak: None,
            awarded: badges::AwardedBadges::default(),
        });
    }

    let author_id = existing.author_id;
    let title = existing.title.clone();
    let mut active: story::ActiveModel = existing.into();
    active.status = Set(story::Status::Published);
    active.published_at = Set(Some(now));
    active.updated_at = Set(now);
    let published = active.update(&txn).await?;

    let streak = activity::register_engagement(
        &txn,
        author_id,
        activity_log::Kind::StoryPublished,
        format!("Published story: {}", title),
        activity::STORY_PUBLISH_POINTS,
        json!({ "story_id": story_id }),
        now,
    )
    .await?;

    let published_count = story::Entity::find()
        .filter(story::Column::AuthorId.eq(author_id))
        .filter(story::Column::Status.eq(story::Status::Published))
        .count(&txn)
        .await?;
    #[allow(clippy::cast_possible_truncation)]
    let published_count = published_count as i32;

    let mut awarded =
        badges::award_story_badges(&txn, author_id, published_count, Some(story_id), now).await?;
    let streak_awards =
        badges::award_streak_badges(&txn, author_id, streak.current_streak, now).await?;
    awarded.0.extend(streak_awards.0);

    goals::increment_active_goals(&txn, community_goal::GoalType::Stories, 1, now).await?;

    txn.commit().await?;

    // Notification enqueue failures never unwind a committed publish.
    if let Err(err) = outbox::enqueue(
        db,
        author_id,
        email_schedule::Kind::StoryPublished,
        now,
        false,
        None,
        json!({ "story_id": story_id, "title": published.title }),
        now,
    )
    .await
    {
        tracing::warn!(%story_id, error = %err, "story notification enqueue failed");
    }

    Ok(PublishOutcome {
        story: published,
        streak: Some(streak),
        awarded,
    })
}
