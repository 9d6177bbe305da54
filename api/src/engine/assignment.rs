use entity::{
    activity_log, assignment, case_record, community_goal, email_schedule, volunteer_profile,
};
use platform_api::{EngineError, EngineResult};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    SqlErr, TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use super::{activity, badges, goals, outbox};

/// Legal state machine edges. DECLINED and CANCELLED are reachable from any
/// non-terminal state; everything else moves strictly forward.
fn ensure_transition(from: assignment::Status, to: assignment::Status) -> EngineResult<()> {
    use assignment::Status::{Accepted, Cancelled, Completed, Declined, InProgress, Pending};
    let legal = match (from, to) {
        (Pending, Accepted) => true,
        (Accepted, InProgress) => true,
        (Accepted | InProgress, Completed) => true,
        (_, Declined) | (_, Cancelled) => !from.is_terminal(),
        _ => false,
    };
    if legal {
        Ok(())
    } else {
        Err(EngineError::InvalidTransition {
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        })
    }
}

pub async fn create_assignment(
    db: &DatabaseConnection,
    case_id: Uuid,
    volunteer_id: Uuid,
    coordinator_id: Uuid,
    note: Option<String>,
    estimated_hours: Option<i32>,
    now: DateTimeWithTimeZone,
) -> EngineResult<assignment::Model> {
    let fresh = assignment::ActiveModel {
        id: Set(Uuid::new_v4()),
        case_id: Set(case_id),
        volunteer_id: Set(volunteer_id),
        coordinator_id: Set(coordinator_id),
        status: Set(assignment::Status::Pending),
        assignment_note: Set(note),
        volunteer_response: Set(None),
        estimated_hours: Set(estimated_hours),
        actual_hours: Set(None),
        created_at: Set(now),
        accepted_at: Set(None),
        started_at: Set(None),
        completed_at: Set(None),
    };
    let created = match fresh.insert(db).await {
        Ok(model) => model,
        Err(err) => {
            if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                return Err(EngineError::Conflict(
                    "volunteer already has an assignment for this case".to_string(),
                ));
            }
            return Err(err.into());
        }
    };

    if let Err(err) = outbox::enqueue(
        db,
        volunteer_id,
        email_schedule::Kind::AssignmentNotice,
        now,
        false,
        None,
        json!({ "assignment_id": created.id, "case_id": case_id }),
        now,
    )
    .await
    {
        tracing::warn!(assignment_id = %created.id, error = %err, "assignment notice enqueue failed");
    }
    Ok(created)
}

/// PENDING -> ACCEPTED. Stamps `accepted_at`, appends the ledger entry and
/// credits acceptance points. Streaks and badges are deliberately not
/// evaluated here; completion is the milestone event.
pub async fn accept_assignment(
    db: &DatabaseConnection,
    assignment_id: Uuid,
    response: Option<String>,
    now: DateTimeWithTimeZone,
) -> EngineResult<assignment::Model> {
    let txn = db.begin().await?;
    let existing = assignment::Entity::find_by_id(assignment_id)
        .one(&txn)
        .await?
        .ok_or(EngineError::NotFound("assignment"))?;
    ensure_transition(existing.status, assignment::Status::Accepted)?;

    let volunteer_id = existing.volunteer_id;
    let case_id = existing.case_id;
    let mut active: assignment::ActiveModel = existing.into();
    active.status = Set(assignment::Status::Accepted);
    active.accepted_at = Set(Some(now));
    if response.is_some() {
        active.volunteer_response = Set(response);
    }
    let updated = active.update(&txn).await?;

    activity::ensure_profile(&txn, volunteer_id, now).await?;
    activity::record_activity(
        &txn,
        volunteer_id,
        activity_log::Kind::AssignmentAccepted,
        "Accepted a case assignment",
        activity::ACCEPTANCE_POINTS,
        json!({ "assignment_id": assignment_id, "case_id": case_id }),
        now,
    )
    .await?;
    volunteer_profile::Entity::update_many()
        .col_expr(
            volunteer_profile::Column::CasesAccepted,
            Expr::col(volunteer_profile::Column::CasesAccepted).add(1),
        )
        .col_expr(
            volunteer_profile::Column::TotalPoints,
            Expr::col(volunteer_profile::Column::TotalPoints)
                .add(i64::from(activity::ACCEPTANCE_POINTS)),
        )
        .col_expr(volunteer_profile::Column::LastActivity, Expr::value(Some(now)))
        .col_expr(volunteer_profile::Column::UpdatedAt, Expr::value(now))
        .filter(volunteer_profile::Column::UserId.eq(volunteer_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    Ok(updated)
}

/// ACCEPTED -> IN_PROGRESS.
pub async fn start_assignment(
    db: &DatabaseConnection,
    assignment_id: Uuid,
    now: DateTimeWithTimeZone,
) -> EngineResult<assignment::Model> {
    let existing = assignment::Entity::find_by_id(assignment_id)
        .one(db)
        .await?
        .ok_or(EngineError::NotFound("assignment"))?;
    ensure_transition(existing.status, assignment::Status::InProgress)?;
    let mut active: assignment::ActiveModel = existing.into();
    active.status = Set(assignment::Status::InProgress);
    active.started_at = Set(Some(now));
    let updated = active.update(db).await?;
    Ok(updated)
}

#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    pub assignment: assignment::Model,
    pub streak: Option<activity::StreakUpdate>,
    pub awarded: badges::AwardedBadges,
}

/// Complete an assignment and run the whole engagement pipeline in one
/// transaction: stamp COMPLETED, bump `cases_completed`, append the ledger
/// entry with streak recalculation, award milestone and streak badges,
/// advance CASES goals, and mark the case resolved. Completing an already
/// completed assignment returns it unchanged.
pub async fn complete_assignment(
    db: &DatabaseConnection,
    assignment_id: Uuid,
    actual_hours: Option<i32>,
    now: DateTimeWithTimeZone,
) -> EngineResult<CompletionOutcome> {
    let txn = db.begin().await?;
    let existing = assignment::Entity::find_by_id(assignment_id)
        .one(&txn)
        .await?
        .ok_or(EngineError::NotFound("assignment"))?;

    if existing.status == assignment::Status::Completed {
        txn.commit().await?;
        return Ok(CompletionOutcome {
            assignment: existing,
            streak: None,
            awarded: badges::AwardedBadges::default(),
        });
    }
    ensure_transition(existing.status, assignment::Status::Completed)?;

    let volunteer_id = existing.volunteer_id;
    let case_id = existing.case_id;
    let mut active: assignment::ActiveModel = existing.into();
    active.status = Set(assignment::Status::Completed);
    active.completed_at = Set(Some(now));
    if actual_hours.is_some() {
        active.actual_hours = Set(actual_hours);
    }
    let completed = active.update(&txn).await?;

    activity::ensure_profile(&txn, volunteer_id, now).await?;
    volunteer_profile::Entity::update_many()
        .col_expr(
            volunteer_profile::Column::CasesCompleted,
            Expr::col(volunteer_profile::Column::CasesCompleted).add(1),
        )
        .filter(volunteer_profile::Column::UserId.eq(volunteer_id))
        .exec(&txn)
        .await?;

    let streak = activity::register_engagement(
        &txn,
        volunteer_id,
        activity_log::Kind::CaseCompleted,
        "Completed a case",
        activity::CASE_COMPLETION_POINTS,
        json!({ "assignment_id": assignment_id, "case_id": case_id }),
        now,
    )
    .await?;

    let profile = activity::ensure_profile(&txn, volunteer_id, now).await?;
    let mut awarded = badges::award_case_badges(
        &txn,
        volunteer_id,
        profile.cases_completed,
        Some(case_id),
        now,
    )
    .await?;
    let streak_awards =
        badges::award_streak_badges(&txn, volunteer_id, streak.current_streak, now).await?;
    awarded.0.extend(streak_awards.0);

    goals::increment_active_goals(&txn, community_goal::GoalType::Cases, 1, now).await?;

    if let Some(case) = case_record::Entity::find_by_id(case_id).one(&txn).await? {
        let mut case_active: case_record::ActiveModel = case.into();
        case_active.status = Set("RESOLVED".to_string());
        case_active.resolved_at = Set(Some(now));
        case_active.updated_at = Set(now);
        case_active.update(&txn).await?;
    }

    txn.commit().await?;
    tracing::info!(
        %assignment_id,
        %volunteer_id,
        streak = streak.current_streak,
        badges = awarded.0.len(),
        "assignment completed"
    );

    // Notification enqueue failures never unwind a committed completion.
    if let Err(err) = outbox::enqueue(
        db,
        volunteer_id,
        email_schedule::Kind::CompletionNotice,
        now,
        false,
        None,
        json!({ "assignment_id": assignment_id, "case_id": case_id }),
        now,
    )
    .await
    {
        tracing::warn!(%assignment_id, error = %err, "completion notice enqueue failed");
    }

    Ok(CompletionOutcome {
        assignment: completed,
        streak: Some(streak),
        awarded,
    })
}

/// Terminal exit with an optional volunteer response.
pub async fn decline_assignment(
    db: &DatabaseConnection,
    assignment_id: Uuid,
    response: Option<String>,
) -> EngineResult<assignment::Model> {
    close_assignment(db, assignment_id, assignment::Status::Declined, response).await
}

pub async fn cancel_assignment(
    db: &DatabaseConnection,
    assignment_id: Uuid,
) -> EngineResult<assignment::Model> {
    close_assignment(db, assignment_id, assignment::Status::Cancelled, None).await
}

async fn close_assignment(
    db: &DatabaseConnection,
    assignment_id: Uuid,
    terminal: assignment::Status,
    response: Option<String>,
) -> EngineResult<assignment::Model> {
    let existing = assignment::Entity::find_by_id(assignment_id)
        .one(db)
        .await?
        .ok_or(EngineError::NotFound("assignment"))?;
    ensure_transition(existing.status, terminal)?;
    let mut active: assignment::ActiveModel = existing.into();
    active.status = Set(terminal);
    if response.is_some() {
        active.volunteer_response = Set(response);
    }
    // `completed_at` marks actual completion only; declined and cancelled
    // assignments keep it unset.
    let updated = active.update(db).await?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assignment::Status;

    #[test]
    fn forward_edges_are_legal() {
        assert!(ensure_transition(Status::Pending, Status::Accepted).is_ok());
        assert!(ensure_transition(Status::Accepted, Status::InProgress).is_ok());
        assert!(ensure_transition(Status::InProgress, Status::Completed).is_ok());
        assert!(ensure_transition(Status::Accepted, Status::Completed).is_ok());
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for terminal in [Status::Completed, Status::Declined, Status::Cancelled] {
            assert!(ensure_transition(terminal, Status::Accepted).is_err());
            assert!(ensure_transition(terminal, Status::Cancelled).is_err());
        }
    }

    #[test]
    fn skipping_acceptance_is_rejected() {
        let err = ensure_transition(Status::Pending, Status::Completed).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition { .. }));
    }

    #[test]
    fn decline_and_cancel_exit_any_live_state() {
        for live in [Status::Pending, Status::Accepted, Status::InProgress] {
            assert!(ensure_transition(live, Status::Declined).is_ok());
            assert!(ensure_transition(live, Status::Cancelled).is_ok());
        }
    }
}
