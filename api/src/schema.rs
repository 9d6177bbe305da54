use std::{sync::Arc, time::Duration};

use async_graphql::{
    Context, EmptySubscription, Enum, Error, ErrorExtensions, Json, Object, Schema, SimpleObject,
    ID,
};
use chrono::Utc;
use entity::{activity_log, assignment, badge, community_goal, story, user, user_badge};
use platform_api::EngineError;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::engine::{self, outbox::Mailer};

#[derive(Clone)]
pub struct AppSchema(pub Schema<QueryRoot, MutationRoot, EmptySubscription>);

/// Knobs the server wires in from its config.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub send_timeout: Duration,
    pub goal_multiplier: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            send_timeout: Duration::from_secs(10),
            goal_multiplier: 1.2,
        }
    }
}

pub fn build_schema(
    db: Arc<DatabaseConnection>,
    mailer: Arc<dyn Mailer>,
    settings: EngineSettings,
) -> AppSchema {
    let schema = Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(db)
        .data(mailer)
        .data(settings)
        .finish();
    AppSchema(schema)
}

pub struct QueryRoot;
pub struct MutationRoot;

#[Object]
impl QueryRoot {
    async fn engagement(&self) -> EngagementQuery {
        EngagementQuery
    }
}

#[Object]
impl MutationRoot {
    async fn engagement(&self) -> EngagementMutation {
        EngagementMutation
    }
}

#[derive(Default)]
pub struct EngagementQuery;

#[derive(Default)]
pub struct EngagementMutation;

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum AssignmentStatus {
    #[graphql(name = "PENDING")]
    Pending,
    #[graphql(name = "ACCEPTED")]
    Accepted,
    #[graphql(name = "IN_PROGRESS")]
    InProgress,
    #[graphql(name = "COMPLETED")]
    Completed,
    #[graphql(name = "DECLINED")]
    Declined,
    #[graphql(name = "CANCELLED")]
    Cancelled,
}

impl From<assignment::Status> for AssignmentStatus {
    fn from(value: assignment::Status) -> Self {
        match value {
            assignment::Status::Pending => AssignmentStatus::Pending,
            assignment::Status::Accepted => AssignmentStatus::Accepted,
            assignment::Status::InProgress => AssignmentStatus::InProgress,
            assignment::Status::Completed => AssignmentStatus::Completed,
            assignment::Status::Declined => AssignmentStatus::Declined,
            assignment::Status::Cancelled => AssignmentStatus::Cancelled,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct AssignmentNode {
    pub id: ID,
    pub case_id: ID,
    pub volunteer_id: ID,
    pub coordinator_id: ID,
    pub status: AssignmentStatus,
    pub assignment_note: Option<String>,
    pub volunteer_response: Option<String>,
    pub estimated_hours: Option<i32>,
    pub actual_hours: Option<i32>,
    pub created_at: chrono::DateTime<Utc>,
    pub accepted_at: Option<chrono::DateTime<Utc>>,
    pub started_at: Option<chrono::DateTime<Utc>>,
    pub completed_at: Option<chrono::DateTime<Utc>>,
}

impl From<assignment::Model> for AssignmentNode {
    fn from(model: assignment::Model) -> Self {
        Self {
            id: ID::from(model.id.to_string()),
            case_id: ID::from(model.case_id.to_string()),
            volunteer_id: ID::from(model.volunteer_id.to_string()),
            coordinator_id: ID::from(model.coordinator_id.to_string()),
            status: model.status.into(),
            assignment_note: model.assignment_note,
            volunteer_response: model.volunteer_response,
            estimated_hours: model.estimated_hours,
            actual_hours: model.actual_hours,
            created_at: model.created_at.with_timezone(&Utc),
            accepted_at: model.accepted_at.map(|t| t.with_timezone(&Utc)),
            started_at: model.started_at.map(|t| t.with_timezone(&Utc)),
            completed_at: model.completed_at.map(|t| t.with_timezone(&Utc)),
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct StoryNode {
    pub id: ID,
    pub author_id: ID,
    pub title: String,
    pub status: String,
    pub published_at: Option<chrono::DateTime<Utc>>,
}

impl From<story::Model> for StoryNode {
    fn from(model: story::Model) -> Self {
        let status = match model.status {
            story::Status::Draft => "DRAFT",
            story::Status::Published => "PUBLISHED",
            story::Status::Archived => "ARCHIVED",
        };
        Self {
            id: ID::from(model.id.to_string()),
            author_id: ID::from(model.author_id.to_string()),
            title: model.title,
            status: status.to_string(),
            published_at: model.published_at.map(|t| t.with_timezone(&Utc)),
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct BadgeNode {
    pub id: ID,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: String,
    pub points_value: i32,
}

impl From<badge::Model> for BadgeNode {
    fn from(model: badge::Model) -> Self {
        let category = match model.category {
            badge::Category::Milestone => "MILESTONE",
            badge::Category::Streak => "STREAK",
            badge::Category::Community => "COMMUNITY",
            badge::Category::Special => "SPECIAL",
        };
        Self {
            id: ID::from(model.id.to_string()),
            slug: model.slug,
            name: model.name,
            description: model.description,
            icon: model.icon,
            category: category.to_string(),
            points_value: model.points_value,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct AchievementNode {
    pub user_id: ID,
    pub badge: Option<BadgeNode>,
    pub earned_at: chrono::DateTime<Utc>,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct ActivityNode {
    pub id: ID,
    pub kind: String,
    pub description: String,
    pub points_earned: i32,
    pub meta: Json<serde_json::Value>,
    pub created_at: chrono::DateTime<Utc>,
}

impl From<activity_log::Model> for ActivityNode {
    fn from(model: activity_log::Model) -> Self {
        let kind = match model.kind {
            activity_log::Kind::CaseCompleted => "CASE_COMPLETED",
            activity_log::Kind::StoryPublished => "STORY_PUBLISHED",
            activity_log::Kind::AssignmentAccepted => "ASSIGNMENT_ACCEPTED",
            activity_log::Kind::BadgeEarned => "BADGE_EARNED",
        };
        Self {
            id: ID::from(model.id.to_string()),
            kind: kind.to_string(),
            description: model.description,
            points_earned: model.points_earned,
            meta: Json(model.meta),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct CommunityGoalNode {
    pub id: ID,
    pub title: String,
    pub description: String,
    pub goal_type: String,
    pub target_value: i32,
    pub current_value: i32,
    pub progress_percentage: f64,
    pub is_completed: bool,
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
    pub is_active: bool,
    pub is_featured: bool,
}

impl From<community_goal::Model> for CommunityGoalNode {
    fn from(model: community_goal::Model) -> Self {
        let goal_type = match model.goal_type {
            community_goal::GoalType::Cases => "CASES",
            community_goal::GoalType::Stories => "STORIES",
            community_goal::GoalType::Volunteers => "VOLUNTEERS",
            community_goal::GoalType::Donations => "DONATIONS",
        };
        let progress_percentage = model.progress_percentage();
        let is_completed = model.current_value >= model.target_value;
        Self {
            id: ID::from(model.id.to_string()),
            title: model.title,
            description: model.description,
            goal_type: goal_type.to_string(),
            target_value: model.target_value,
            current_value: model.current_value,
            progress_percentage,
            is_completed,
            start_date: model.start_date,
            end_date: model.end_date,
            is_active: model.is_active,
            is_featured: model.is_featured,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct DashboardStatsNode {
    pub cases_completed: i32,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub total_points: i64,
    pub stories_published: i32,
    pub active_assignments: i32,
    pub community_rank: i64,
    pub recent_badges: Vec<AchievementNode>,
    pub recent_activities: Vec<ActivityNode>,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct TopVolunteerNode {
    pub user_id: ID,
    pub display_name: Option<String>,
    pub total_points: i64,
    pub cases_completed: i32,
    pub current_streak: i32,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct CommunityStatsNode {
    pub total_cases_resolved: i64,
    pub total_volunteers: i64,
    pub total_stories: i64,
    pub active_goals: Vec<CommunityGoalNode>,
    pub top_volunteers: Vec<TopVolunteerNode>,
    pub recent_achievements: Vec<AchievementNode>,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct RecommendationNode {
    pub case_id: ID,
    pub title: String,
    pub score: f64,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct RecommendationsPayload {
    pub greeting: String,
    pub recommendations: Vec<RecommendationNode>,
    pub nudges: Vec<String>,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct CompletionPayload {
    pub assignment: AssignmentNode,
    pub new_badges: Vec<BadgeNode>,
    pub current_streak: Option<i32>,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct SweepPayload {
    pub sent: i32,
    pub failed: i32,
}

#[Object]
impl EngagementQuery {
    async fn assignment(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<Option<AssignmentNode>> {
        let db = database(ctx)?;
        let assignment_id = parse_uuid(&id)?;
        let found = assignment::Entity::find_by_id(assignment_id)
            .one(db.as_ref())
            .await
            .map_err(db_error)?;
        Ok(found.map(AssignmentNode::from))
    }

    #[graphql(name = "dashboardStats")]
    async fn dashboard_stats(
        &self,
        ctx: &Context<'_>,
        user_id: ID,
    ) -> async_graphql::Result<DashboardStatsNode> {
        let db = database(ctx)?;
        let user_id = parse_uuid(&user_id)?;
        let stats = engine::stats::dashboard_stats(db.as_ref(), user_id, Utc::now().into())
            .await
            .map_err(engine_error)?;
        Ok(DashboardStatsNode {
            cases_completed: stats.cases_completed,
            current_streak: stats.current_streak,
            longest_streak: stats.longest_streak,
            total_points: stats.total_points,
            stories_published: stats.stories_published,
            active_assignments: stats.active_assignments,
            community_rank: stats.community_rank,
            recent_badges: stats
                .recent_badges
                .into_iter()
                .map(|(grant, badge)| AchievementNode {
                    user_id: ID::from(grant.user_id.to_string()),
                    badge: Some(badge.into()),
                    earned_at: grant.earned_at.with_timezone(&Utc),
                })
                .collect(),
            recent_activities: stats
                .recent_activities
                .into_iter()
                .map(ActivityNode::from)
                .collect(),
        })
    }

    #[graphql(name = "communityStats")]
    async fn community_stats(&self, ctx: &Context<'_>) -> async_graphql::Result<CommunityStatsNode> {
        let db = database(ctx)?;
        let stats = engine::stats::community_stats(db.as_ref(), Utc::now().into())
            .await
            .map_err(engine_error)?;
        Ok(CommunityStatsNode {
            total_cases_resolved: stats.total_cases_resolved,
            total_volunteers: stats.total_volunteers,
            total_stories: stats.total_stories,
            active_goals: stats
                .active_goals
                .into_iter()
                .map(CommunityGoalNode::from)
                .collect(),
            top_volunteers: stats
                .top_volunteers
                .into_iter()
                .map(|(profile, user)| TopVolunteerNode {
                    user_id: ID::from(profile.user_id.to_string()),
                    display_name: user.map(|u| u.display_name),
                    total_points: profile.total_points,
                    cases_completed: profile.cases_completed,
                    current_streak: profile.current_streak,
                })
                .collect(),
            recent_achievements: stats
                .recent_achievements
                .into_iter()
                .map(|(grant, badge)| AchievementNode {
                    user_id: ID::from(grant.user_id.to_string()),
                    badge: badge.map(BadgeNode::from),
                    earned_at: grant.earned_at.with_timezone(&Utc),
                })
                .collect(),
        })
    }

    async fn recommendations(
        &self,
        ctx: &Context<'_>,
        user_id: ID,
    ) -> async_graphql::Result<RecommendationsPayload> {
        let db = database(ctx)?;
        let user_id = parse_uuid(&user_id)?;
        let recipient = user::Entity::find_by_id(user_id)
            .one(db.as_ref())
            .await
            .map_err(db_error)?
            .ok_or_else(|| error_with_code("NOT_FOUND", "User not found"))?;
        let recs = engine::boba::recommendations_for(
            db.as_ref(),
            user_id,
            &recipient.display_name,
            Utc::now().into(),
        )
        .await
        .map_err(engine_error)?;
        Ok(RecommendationsPayload {
            greeting: recs.greeting,
            recommendations: recs
                .recommendations
                .into_iter()
                .map(|rec| RecommendationNode {
                    case_id: ID::from(rec.case_id.to_string()),
                    title: rec.title,
                    score: rec.score,
                })
                .collect(),
            nudges: recs.nudges,
        })
    }

    async fn badges(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<BadgeNode>> {
        let db = database(ctx)?;
        let catalog = badge::Entity::find()
            .filter(badge::Column::IsActive.eq(true))
            .order_by_asc(badge::Column::Category)
            .order_by_asc(badge::Column::PointsValue)
            .all(db.as_ref())
            .await
            .map_err(db_error)?;
        Ok(catalog.into_iter().map(BadgeNode::from).collect())
    }

    #[graphql(name = "communityGoals")]
    async fn community_goals(
        &self,
        ctx: &Context<'_>,
        active_only: Option<bool>,
    ) -> async_graphql::Result<Vec<CommunityGoalNode>> {
        let db = database(ctx)?;
        let goals = if active_only.unwrap_or(true) {
            engine::goals::active_goals(db.as_ref(), Utc::now().into())
                .await
                .map_err(engine_error)?
        } else {
            community_goal::Entity::find()
                .order_by_desc(community_goal::Column::EndDate)
                .all(db.as_ref())
                .await
                .map_err(db_error)?
        };
        Ok(goals.into_iter().map(CommunityGoalNode::from).collect())
    }

    #[graphql(name = "userBadges")]
    async fn user_badges(
        &self,
        ctx: &Context<'_>,
        user_id: ID,
    ) -> async_graphql::Result<Vec<AchievementNode>> {
        let db = database(ctx)?;
        let user_id = parse_uuid(&user_id)?;
        let grants = user_badge::Entity::find()
            .find_also_related(badge::Entity)
            .filter(user_badge::Column::UserId.eq(user_id))
            .order_by_desc(user_badge::Column::EarnedAt)
            .all(db.as_ref())
            .await
            .map_err(db_error)?;
        Ok(grants
            .into_iter()
            .map(|(grant, badge)| AchievementNode {
                user_id: ID::from(grant.user_id.to_string()),
                badge: badge.map(BadgeNode::from),
                earned_at: grant.earned_at.with_timezone(&Utc),
            })
            .collect())
    }
}

#[Object]
impl EngagementMutation {
    #[graphql(name = "createAssignment")]
    async fn create_assignment(
        &self,
        ctx: &Context<'_>,
        case_id: ID,
        volunteer_id: ID,
        coordinator_id: ID,
        note: Option<String>,
        estimated_hours: Option<i32>,
    ) -> async_graphql::Result<AssignmentNode> {
        let db = database(ctx)?;
        let created = engine::assignment::create_assignment(
            db.as_ref(),
            parse_uuid(&case_id)?,
            parse_uuid(&volunteer_id)?,
            parse_uuid(&coordinator_id)?,
            note,
            estimated_hours,
            Utc::now().into(),
        )
        .instrument(info_span!("create_assignment"))
        .await
        .map_err(engine_error)?;
        Ok(created.into())
    }

    #[graphql(name = "acceptAssignment")]
    async fn accept_assignment(
        &self,
        ctx: &Context<'_>,
        assignment_id: ID,
        response: Option<String>,
    ) -> async_graphql::Result<AssignmentNode> {
        let db = database(ctx)?;
        let updated = engine::assignment::accept_assignment(
            db.as_ref(),
            parse_uuid(&assignment_id)?,
            response,
            Utc::now().into(),
        )
        .instrument(info_span!("accept_assignment"))
        .await
        .map_err(engine_error)?;
        Ok(updated.into())
    }

    #[graphql(name = "startAssignment")]
    async fn start_assignment(
        &self,
        ctx: &Context<'_>,
        assignment_id: ID,
    ) -> async_graphql::Result<AssignmentNode> {
        let db = database(ctx)?;
        let updated = engine::assignment::start_assignment(
            db.as_ref(),
            parse_uuid(&assignment_id)?,
            Utc::now().into(),
        )
        .await
        .map_err(engine_error)?;
        Ok(updated.into())
    }

    #[graphql(name = "completeAssignment")]
    async fn complete_assignment(
        &self,
        ctx: &Context<'_>,
        assignment_id: ID,
        actual_hours: Option<i32>,
    ) -> async_graphql::Result<CompletionPayload> {
        let db = database(ctx)?;
        let outcome = engine::assignment::complete_assignment(
            db.as_ref(),
            parse_uuid(&assignment_id)?,
            actual_hours,
            Utc::now().into(),
        )
        .instrument(info_span!("complete_assignment"))
        .await
        .map_err(engine_error)?;
        Ok(CompletionPayload {
            assignment: outcome.assignment.into(),
            new_badges: outcome.awarded.0.into_iter().map(BadgeNode::from).collect(),
            current_streak: outcome.streak.map(|s| s.current_streak),
        })
    }

    #[graphql(name = "declineAssignment")]
    async fn decline_assignment(
        &self,
        ctx: &Context<'_>,
        assignment_id: ID,
        response: Option<String>,
    ) -> async_graphql::Result<AssignmentNode> {
        let db = database(ctx)?;
        let updated = engine::assignment::decline_assignment(
            db.as_ref(),
            parse_uuid(&assignment_id)?,
            response,
        )
        .await
        .map_err(engine_error)?;
        Ok(updated.into())
    }

    #[graphql(name = "cancelAssignment")]
    async fn cancel_assignment(
        &self,
        ctx: &Context<'_>,
        assignment_id: ID,
    ) -> async_graphql::Result<AssignmentNode> {
        let db = database(ctx)?;
        let updated =
            engine::assignment::cancel_assignment(db.as_ref(), parse_uuid(&assignment_id)?)
                .await
                .map_err(engine_error)?;
        Ok(updated.into())
    }

    #[graphql(name = "publishStory")]
    async fn publish_story(
        &self,
        ctx: &Context<'_>,
        story_id: ID,
    ) -> async_graphql::Result<StoryNode> {
        let db = database(ctx)?;
        let outcome = engine::stories::publish_story(
            db.as_ref(),
            parse_uuid(&story_id)?,
            Utc::now().into(),
        )
        .instrument(info_span!("publish_story"))
        .await
        .map_err(engine_error)?;
        Ok(outcome.story.into())
    }

    #[graphql(name = "startOnboarding")]
    async fn start_onboarding(
        &self,
        ctx: &Context<'_>,
        user_id: ID,
    ) -> async_graphql::Result<i32> {
        let db = database(ctx)?;
        let mailer = mailer(ctx)?;
        let settings = settings(ctx)?;
        let enqueued = engine::outbox::start_onboarding(
            db.as_ref(),
            parse_uuid(&user_id)?,
            mailer.as_ref(),
            settings.send_timeout,
            Utc::now().into(),
        )
        .instrument(info_span!("start_onboarding"))
        .await
        .map_err(engine_error)?;
        Ok(enqueued)
    }

    #[graphql(name = "runDeliverySweep")]
    async fn run_delivery_sweep(&self, ctx: &Context<'_>) -> async_graphql::Result<SweepPayload> {
        let db = database(ctx)?;
        let mailer = mailer(ctx)?;
        let settings = settings(ctx)?;
        let outcome = engine::outbox::run_delivery_sweep(
            db.as_ref(),
            mailer.as_ref(),
            settings.send_timeout,
            Utc::now().into(),
        )
        .instrument(info_span!("delivery_sweep"))
        .await
        .map_err(engine_error)?;
        #[allow(clippy::cast_possible_wrap)]
        let (sent, failed) = (outcome.sent as i32, outcome.failed as i32);
        Ok(SweepPayload { sent, failed })
    }

    #[graphql(name = "createMonthlyCaseGoal")]
    async fn create_monthly_case_goal(
        &self,
        ctx: &Context<'_>,
        multiplier: Option<f64>,
    ) -> async_graphql::Result<Option<CommunityGoalNode>> {
        let db = database(ctx)?;
        let settings = settings(ctx)?;
        let created = engine::goals::create_monthly_case_goal(
            db.as_ref(),
            multiplier.unwrap_or(settings.goal_multiplier),
            Utc::now().into(),
        )
        .await
        .map_err(engine_error)?;
        Ok(created.map(CommunityGoalNode::from))
    }
}

fn database(ctx: &Context<'_>) -> async_graphql::Result<Arc<DatabaseConnection>> {
    ctx.data::<Arc<DatabaseConnection>>()
        .cloned()
        .map_err(|_| error_with_code("INTERNAL", "Missing database connection"))
}

fn mailer(ctx: &Context<'_>) -> async_graphql::Result<Arc<dyn Mailer>> {
    ctx.data::<Arc<dyn Mailer>>()
        .cloned()
        .map_err(|_| error_with_code("INTERNAL", "Missing mailer"))
}

fn settings(ctx: &Context<'_>) -> async_graphql::Result<EngineSettings> {
    ctx.data::<EngineSettings>()
        .cloned()
        .map_err(|_| error_with_code("INTERNAL", "Missing engine settings"))
}

fn parse_uuid(id: &ID) -> async_graphql::Result<Uuid> {
    Uuid::parse_str(id.as_str()).map_err(|_| error_with_code("BAD_REQUEST", "Invalid ID"))
}

fn db_error(err: sea_orm::DbErr) -> Error {
    engine_error(EngineError::from(err))
}

fn engine_error(err: EngineError) -> Error {
    err.extend()
}

fn error_with_code(code: &'static str, message: impl Into<String>) -> Error {
    Error::new(message).extend_with(|_, e| e.set("code", code))
}
