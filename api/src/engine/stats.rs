use entity::{
    activity_log, assignment, badge, case_record, community_goal, story, user, user_badge,
    volunteer_profile,
};
use platform_api::EngineResult;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use super::{activity, goals};

const RECENT_BADGES: u64 = 5;
const RECENT_ACTIVITIES: u64 = 10;
const TOP_VOLUNTEERS: u64 = 5;
const RECENT_ACHIEVEMENTS: u64 = 10;

#[derive(Debug, Clone)]
pub struct DashboardStats {
    pub cases_completed: i32,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub total_points: i64,
    pub stories_published: i32,
    pub active_assignments: i32,
    pub community_rank: i64,
    pub recent_badges: Vec<(user_badge::Model, badge::Model)>,
    pub recent_activities: Vec<activity_log::Model>,
}

#[derive(Debug, Clone)]
pub struct CommunityStats {
    pub total_cases_resolved: i64,
    pub total_volunteers: i64,
    pub total_stories: i64,
    pub active_goals: Vec<community_goal::Model>,
    pub top_volunteers: Vec<(volunteer_profile::Model, Option<user::Model>)>,
    pub recent_achievements: Vec<(user_badge::Model, Option<badge::Model>)>,
}

pub async fn dashboard_stats<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    now: DateTimeWithTimeZone,
) -> EngineResult<DashboardStats> {
    let profile = activity::ensure_profile(conn, user_id, now).await?;

    let stories_published = story::Entity::find()
        .filter(story::Column::AuthorId.eq(user_id))
        .filter(story::Column::Status.eq(story::Status::Published))
        .count(conn)
        .await?;

    let active_assignments = assignment::Entity::find()
        .filter(assignment::Column::VolunteerId.eq(user_id))
        .filter(
            assignment::Column::Status.is_in([
                assignment::Status::Accepted,
                assignment::Status::InProgress,
            ]),
        )
        .count(conn)
        .await?;

    // Rank 1 is the top profile; ties share a rank.
    let outranked = volunteer_profile::Entity::find()
        .filter(volunteer_profile::Column::TotalPoints.gt(profile.total_points))
        .count(conn)
        .await?;

    let recent_badges = user_badge::Entity::find()
        .find_also_related(badge::Entity)
        .filter(user_badge::Column::UserId.eq(user_id))
        .order_by_desc(user_badge::Column::EarnedAt)
        .limit(RECENT_BADGES)
        .all(conn)
        .await?
        .into_iter()
        .filter_map(|(grant, badge)| badge.map(|b| (grant, b)))
        .collect();

    let recent_activities = activity_log::Entity::find()
        .filter(activity_log::Column::UserId.eq(user_id))
        .order_by_desc(activity_log::Column::CreatedAt)
        .limit(RECENT_ACTIVITIES)
        .all(conn)
        .await?;

    #[allow(clippy::cast_possible_truncation)]
    let stories_published = stories_published as i32;
    #[allow(clippy::cast_possible_truncation)]
    let active_assignments = active_assignments as i32;
    #[allow(clippy::cast_possible_wrap)]
    let community_rank = outranked as i64 + 1;

    Ok(DashboardStats {
        cases_completed: profile.cases_completed,
        current_streak: profile.current_streak,
        longest_streak: profile.longest_streak,
        total_points: profile.total_points,
        stories_published,
        active_assignments,
        community_rank,
        recent_badges,
        recent_activities,
    })
}

pub async fn community_stats<C: ConnectionTrait>(
    conn: &C,
    now: DateTimeWithTimeZone,
) -> EngineResult<CommunityStats> {
    let total_cases_resolved = case_record::Entity::find()
        .filter(case_record::Column::Status.eq("RESOLVED"))
        .count(conn)
        .await?;

    let total_volunteers = volunteer_profile::Entity::find().count(conn).await?;

    let total_stories = story::Entity::find()
        .filter(story::Column::Status.eq(story::Status::Published))
        .count(conn)
        .await?;

    let active_goals = goals::active_goals(conn, now).await?;

    let top_volunteers = volunteer_profile::Entity::find()
        .find_also_related(user::Entity)
        .filter(volunteer_profile::Column::TotalPoints.gt(0))
        .order_by_desc(volunteer_profile::Column::TotalPoints)
        .limit(TOP_VOLUNTEERS)
        .all(conn)
        .await?;

    let recent_achievements = user_badge::Entity::find()
        .find_also_related(badge::Entity)
        .order_by_desc(user_badge::Column::EarnedAt)
        .limit(RECENT_ACHIEVEMENTS)
        .all(conn)
        .await?;

    #[allow(clippy::cast_possible_wrap)]
    let (total_cases_resolved, total_volunteers, total_stories) = (
        total_cases_resolved as i64,
        total_volunteers as i64,
        total_stories as i64,
    );

    Ok(CommunityStats {
        total_cases_resolved,
        total_volunteers,
        total_stories,
        active_goals,
        top_volunteers,
        recent_achievements,
    })
}
