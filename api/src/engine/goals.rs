use chrono::{Datelike, Duration, NaiveDate};
use entity::{activity_log, community_goal};
use platform_api::{EngineError, EngineResult};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};
use uuid::Uuid;

/// Floor for auto-created monthly targets. A quiet month never produces a
/// goal so small that it is met on day one.
const MONTHLY_GOAL_FLOOR: i32 = 50;

/// Bump `current_value` on every active goal of `goal_type` whose window
/// covers today. Pure column expression, safe under concurrent completions.
pub async fn increment_active_goals<C: ConnectionTrait>(
    conn: &C,
    goal_type: community_goal::GoalType,
    amount: i32,
    now: DateTimeWithTimeZone,
) -> EngineResult<u64> {
    let today = now.date_naive();
    let result = community_goal::Entity::update_many()
        .col_expr(
            community_goal::Column::CurrentValue,
            Expr::col(community_goal::Column::CurrentValue).add(amount),
        )
        .col_expr(community_goal::Column::UpdatedAt, Expr::value(now))
        .filter(community_goal::Column::GoalType.eq(goal_type))
        .filter(community_goal::Column::IsActive.eq(true))
        .filter(community_goal::Column::StartDate.lte(today))
        .filter(community_goal::Column::EndDate.gte(today))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

pub async fn active_goals<C: ConnectionTrait>(
    conn: &C,
    now: DateTimeWithTimeZone,
) -> EngineResult<Vec<community_goal::Model>> {
    let today = now.date_naive();
    let goals = community_goal::Entity::find()
        .filter(community_goal::Column::IsActive.eq(true))
        .filter(community_goal::Column::StartDate.lte(today))
        .filter(community_goal::Column::EndDate.gte(today))
        .order_by_desc(community_goal::Column::IsFeatured)
        .order_by_asc(community_goal::Column::EndDate)
        .all(conn)
        .await?;
    Ok(goals)
}

fn month_bounds(today: NaiveDate) -> EngineResult<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)
        .ok_or_else(|| EngineError::from(anyhow::anyhow!("invalid month start for {}", today)))?;
    let next_month = if today.month() == 12 {
        NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)
    }
    .ok_or_else(|| EngineError::from(anyhow::anyhow!("invalid month end for {}", today)))?;
    Ok((start, next_month - Duration::days(1)))
}

/// Create this month's case goal if one does not exist yet. The target is
/// the trailing 30-day completion count scaled by `multiplier`, floored at
/// 50, so the bar tracks recent community throughput.
pub async fn create_monthly_case_goal<C: ConnectionTrait>(
    conn: &C,
    multiplier: f64,
    now: DateTimeWithTimeZone,
) -> EngineResult<Option<community_goal::Model>> {
    let today = now.date_naive();
    let (start, end) = month_bounds(today)?;

    let existing = community_goal::Entity::find()
        .filter(community_goal::Column::GoalType.eq(community_goal::GoalType::Cases))
        .filter(community_goal::Column::StartDate.eq(start))
        .filter(community_goal::Column::EndDate.eq(end))
        .one(conn)
        .await?;
    if existing.is_some() {
        return Ok(None);
    }

    let trailing = activity_log::Entity::find()
        .filter(activity_log::Column::Kind.eq(activity_log::Kind::CaseCompleted))
        .filter(activity_log::Column::ActivityDate.gte(today - Duration::days(30)))
        .count(conn)
        .await?;
    #[allow(clippy::cast_possible_truncation)]
    let scaled = (trailing as f64 * multiplier).round() as i32;
    let target = scaled.max(MONTHLY_GOAL_FLOOR);

    let goal = community_goal::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(format!("{} Case Goal", today.format("%B"))),
        description: Set(format!(
            "Complete {} cases together in {}",
            target,
            today.format("%B %Y")
        )),
        goal_type: Set(community_goal::GoalType::Cases),
        target_value: Set(target),
        current_value: Set(0),
        start_date: Set(start),
        end_date: Set(end),
        is_active: Set(true),
        is_featured: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await?;
    Ok(Some(goal))
}
