use std::time::Duration;

use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use entity::{email_schedule, user, volunteer_profile};
use platform_api::{EngineError, EngineResult};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use super::activity;

/// Days after onboarding at which each sequence step goes out.
const LAYER_UP_OFFSET_DAYS: i64 = 2;
const ENGAGEMENT_OFFSET_DAYS: i64 = 5;
const WEEKLY_MOTIVATION_OFFSET_DAYS: i64 = 14;
const WEEKLY_MOTIVATION_INTERVAL_DAYS: i32 = 7;

/// Window of recent activity that keeps a profile on the weekly cadence.
const WEEKLY_MOTIVATION_ACTIVE_WINDOW_DAYS: i64 = 30;
const STREAK_REMINDER_MIN_STREAK: i32 = 3;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct MailerError(pub String);

/// Rendered message handed to the transport. Rendering itself happens on the
/// far side of the seam; the engine only supplies the template name and
/// context.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub user_id: Uuid,
    pub to: String,
    pub display_name: String,
    pub template: &'static str,
    pub context: JsonValue,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailerError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    pub sent: u32,
    pub failed: u32,
}

pub async fn enqueue<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    kind: email_schedule::Kind,
    scheduled_for: DateTimeWithTimeZone,
    recurring: bool,
    interval_days: Option<i32>,
    context: JsonValue,
    now: DateTimeWithTimeZone,
) -> EngineResult<email_schedule::Model> {
    let entry = email_schedule::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        kind: Set(kind),
        scheduled_for: Set(scheduled_for),
        sent: Set(false),
        sent_at: Set(None),
        failed: Set(false),
        error_message: Set(None),
        recurring: Set(recurring),
        interval_days: Set(interval_days),
        context: Set(context),
        created_at: Set(now),
    };
    let inserted = entry.insert(conn).await?;
    Ok(inserted)
}

/// Is there an undelivered, unfailed entry of `kind` for this user?
pub async fn has_pending<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    kind: email_schedule::Kind,
) -> EngineResult<bool> {
    let hits = email_schedule::Entity::find()
        .filter(email_schedule::Column::UserId.eq(user_id))
        .filter(email_schedule::Column::Kind.eq(kind))
        .filter(email_schedule::Column::Sent.eq(false))
        .filter(email_schedule::Column::Failed.eq(false))
        .count(conn)
        .await?;
    Ok(hits > 0)
}

/// Enqueue unless an entry of the same kind is already pending for the user.
pub async fn enqueue_once<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    kind: email_schedule::Kind,
    scheduled_for: DateTimeWithTimeZone,
    recurring: bool,
    interval_days: Option<i32>,
    context: JsonValue,
    now: DateTimeWithTimeZone,
) -> EngineResult<Option<email_schedule::Model>> {
    if has_pending(conn, user_id, kind).await? {
        return Ok(None);
    }
    let entry = enqueue(
        conn,
        user_id,
        kind,
        scheduled_for,
        recurring,
        interval_days,
        context,
        now,
    )
    .await?;
    Ok(Some(entry))
}

/// Kick off the onboarding sequence: profile creation, an immediate welcome,
/// the two follow-up nudges, and the first recurring weekly-motivation entry.
/// Returns the number of queue entries created.
pub async fn start_onboarding(
    db: &DatabaseConnection,
    user_id: Uuid,
    mailer: &dyn Mailer,
    send_timeout: Duration,
    now: DateTimeWithTimeZone,
) -> EngineResult<i32> {
    let recipient = user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(EngineError::NotFound("user"))?;

    activity::ensure_profile(db, user_id, now).await?;
    volunteer_profile::Entity::update_many()
        .col_expr(volunteer_profile::Column::IsOnboarded, Expr::value(true))
        .col_expr(volunteer_profile::Column::UpdatedAt, Expr::value(now))
        .filter(volunteer_profile::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    let mut enqueued = 0;
    let welcome = enqueue(
        db,
        user_id,
        email_schedule::Kind::Welcome,
        now,
        false,
        None,
        json!({ "display_name": recipient.display_name }),
        now,
    )
    .await?;
    enqueued += 1;
    deliver_entry(db, welcome, &recipient, mailer, send_timeout, now).await?;

    let steps = [
        (email_schedule::Kind::LayerUp, LAYER_UP_OFFSET_DAYS),
        (email_schedule::Kind::Engagement, ENGAGEMENT_OFFSET_DAYS),
    ];
    for (kind, offset) in steps {
        let when = now + ChronoDuration::days(offset);
        if enqueue_once(db, user_id, kind, when, false, None, json!({}), now)
            .await?
            .is_some()
        {
            enqueued += 1;
        }
    }

    let weekly_at = now + ChronoDuration::days(WEEKLY_MOTIVATION_OFFSET_DAYS);
    if enqueue_once(
        db,
        user_id,
        email_schedule::Kind::WeeklyMotivation,
        weekly_at,
        true,
        Some(WEEKLY_MOTIVATION_INTERVAL_DAYS),
        json!({}),
        now,
    )
    .await?
    .is_some()
    {
        enqueued += 1;
    }

    Ok(enqueued)
}

/// Periodic producer: keep recently active, onboarded profiles on the weekly
/// cadence. Skips anyone with a weekly entry already pending.
pub async fn schedule_weekly_motivation(
    db: &DatabaseConnection,
    now: DateTimeWithTimeZone,
) -> EngineResult<u32> {
    let cutoff = now - ChronoDuration::days(WEEKLY_MOTIVATION_ACTIVE_WINDOW_DAYS);
    let profiles = volunteer_profile::Entity::find()
        .filter(volunteer_profile::Column::IsOnboarded.eq(true))
        .filter(volunteer_profile::Column::LastActivity.gte(cutoff))
        .all(db)
        .await?;
    let mut created = 0;
    for profile in profiles {
        let entry = enqueue_once(
            db,
            profile.user_id,
            email_schedule::Kind::WeeklyMotivation,
            now,
            true,
            Some(WEEKLY_MOTIVATION_INTERVAL_DAYS),
            json!({}),
            now,
        )
        .await?;
        if entry.is_some() {
            created += 1;
        }
    }
    Ok(created)
}

/// Periodic producer: nudge profiles with a live streak that have not been
/// active today, before the streak lapses at midnight.
pub async fn schedule_streak_reminders(
    db: &DatabaseConnection,
    now: DateTimeWithTimeZone,
) -> EngineResult<u32> {
    let profiles = volunteer_profile::Entity::find()
        .filter(volunteer_profile::Column::CurrentStreak.gte(STREAK_REMINDER_MIN_STREAK))
        .all(db)
        .await?;
    let today = now.date_naive();
    let mut created = 0;
    for profile in profiles {
        if activity::was_active_on(db, profile.user_id, today).await? {
            continue;
        }
        let entry = enqueue_once(
            db,
            profile.user_id,
            email_schedule::Kind::StreakReminder,
            now,
            false,
            None,
            json!({ "current_streak": profile.current_streak }),
            now,
        )
        .await?;
        if entry.is_some() {
            created += 1;
        }
    }
    Ok(created)
}

/// Drain every due entry. Successes are stamped sent; recurring entries get a
/// successor row at `scheduled_for + interval_days` so the cadence never
/// drifts with sweep timing. Failures are terminal and keep the error text.
pub async fn run_delivery_sweep(
    db: &DatabaseConnection,
    mailer: &dyn Mailer,
    send_timeout: Duration,
    now: DateTimeWithTimeZone,
) -> EngineResult<SweepOutcome> {
    let due = email_schedule::Entity::find()
        .filter(email_schedule::Column::ScheduledFor.lte(now))
        .filter(email_schedule::Column::Sent.eq(false))
        .filter(email_schedule::Column::Failed.eq(false))
        .order_by_asc(email_schedule::Column::ScheduledFor)
        .all(db)
        .await?;

    let mut outcome = SweepOutcome::default();
    for entry in due {
        let recipient = user::Entity::find_by_id(entry.user_id).one(db).await?;
        let Some(recipient) = recipient else {
            mark_failed(db, entry, "recipient user no longer exists").await?;
            outcome.failed += 1;
            continue;
        };
        match deliver_entry(db, entry, &recipient, mailer, send_timeout, now).await? {
            true => outcome.sent += 1,
            false => outcome.failed += 1,
        }
    }
    tracing::info!(sent = outcome.sent, failed = outcome.failed, "delivery sweep finished");
    Ok(outcome)
}

/// Attempt transmission for one queue entry and record the result. Returns
/// true on success. Transmission problems are recorded on the row, never
/// propagated; only database errors bubble up.
async fn deliver_entry(
    db: &DatabaseConnection,
    entry: email_schedule::Model,
    recipient: &user::Model,
    mailer: &dyn Mailer,
    send_timeout: Duration,
    now: DateTimeWithTimeZone,
) -> EngineResult<bool> {
    let email = OutgoingEmail {
        user_id: entry.user_id,
        to: recipient.email.clone(),
        display_name: recipient.display_name.clone(),
        template: entry.kind.template_name(),
        context: entry.context.clone(),
    };
    let attempt = tokio::time::timeout(send_timeout, mailer.send(&email)).await;
    let result = match attempt {
        Ok(inner) => inner,
        Err(_) => Err(MailerError(format!(
            "transmission timed out after {:?}",
            send_timeout
        ))),
    };

    match result {
        Ok(()) => {
            let recurring = entry.recurring;
            let interval = entry.interval_days;
            let scheduled_for = entry.scheduled_for;
            let user_id = entry.user_id;
            let kind = entry.kind;
            let context = entry.context.clone();

            let mut active: email_schedule::ActiveModel = entry.into();
            active.sent = Set(true);
            active.sent_at = Set(Some(now));
            active.update(db).await?;

            if recurring {
                if let Some(days) = interval {
                    let next = scheduled_for + ChronoDuration::days(i64::from(days));
                    enqueue(db, user_id, kind, next, true, Some(days), context, now).await?;
                }
            }
            Ok(true)
        }
        Err(err) => {
            tracing::warn!(user_id = %entry.user_id, error = %err, "email transmission failed");
            mark_failed(db, entry, &err.to_string()).await?;
            Ok(false)
        }
    }
}

async fn mark_failed(
    db: &DatabaseConnection,
    entry: email_schedule::Model,
    reason: &str,
) -> EngineResult<()> {
    let mut active: email_schedule::ActiveModel = entry.into();
    active.failed = Set(true);
    active.error_message = Set(Some(reason.to_string()));
    active.update(db).await?;
    Ok(())
}
