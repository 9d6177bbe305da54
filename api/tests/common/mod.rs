#![allow(dead_code)]

use std::sync::Arc;

use api::engine::outbox::{Mailer, MailerError, OutgoingEmail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement, Value as DbValue,
};
use tokio::sync::Mutex;
use uuid::Uuid;

pub async fn setup_db() -> Arc<DatabaseConnection> {
    let conn = Database::connect("sqlite::memory:").await.unwrap();
    bootstrap_sqlite(&conn).await;
    seed_badges(&conn).await;
    Arc::new(conn)
}

/// Test double that records every transmission and can be flipped to fail.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    pub fail_with: Mutex<Option<String>>,
}

impl RecordingMailer {
    pub async fn sent_templates(&self) -> Vec<&'static str> {
        self.sent.lock().await.iter().map(|e| e.template).collect()
    }

    pub async fn set_failing(&self, reason: &str) {
        *self.fail_with.lock().await = Some(reason.to_string());
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailerError> {
        if let Some(reason) = self.fail_with.lock().await.clone() {
            return Err(MailerError(reason));
        }
        self.sent.lock().await.push(email.clone());
        Ok(())
    }
}

pub async fn insert_user(db: &DatabaseConnection, email: &str, display_name: &str) -> Uuid {
    let id = Uuid::new_v4();
    let now = Utc::now().to_rfc3339();
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO user (id, email, display_name, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        vec![
            id.into(),
            email.into(),
            display_name.into(),
            true.into(),
            now.clone().into(),
            now.into(),
        ],
    ))
    .await
    .unwrap();
    id
}

pub async fn insert_case(
    db: &DatabaseConnection,
    title: &str,
    description: &str,
    urgency: Option<i32>,
) -> Uuid {
    let id = Uuid::new_v4();
    let now = Utc::now().to_rfc3339();
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO case_record (id, title, description, status, urgency_score, is_public, created_at, updated_at) VALUES (?, ?, ?, 'OPEN', ?, ?, ?, ?)",
        vec![
            id.into(),
            title.into(),
            description.into(),
            DbValue::from(urgency),
            false.into(),
            now.clone().into(),
            now.into(),
        ],
    ))
    .await
    .unwrap();
    id
}

pub async fn insert_draft_story(db: &DatabaseConnection, author_id: Uuid, title: &str) -> Uuid {
    let id = Uuid::new_v4();
    let now = Utc::now().to_rfc3339();
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO story (id, author_id, title, body, status, created_at, updated_at) VALUES (?, ?, ?, ?, 'DRAFT', ?, ?)",
        vec![
            id.into(),
            author_id.into(),
            title.into(),
            "body".into(),
            now.clone().into(),
            now.into(),
        ],
    ))
    .await
    .unwrap();
    id
}

pub fn at(rfc3339: &str) -> sea_orm::prelude::DateTimeWithTimeZone {
    DateTime::parse_from_rfc3339(rfc3339).unwrap()
}

pub async fn insert_goal(
    db: &DatabaseConnection,
    goal_type: &str,
    target: i32,
    start_date: &str,
    end_date: &str,
) -> Uuid {
    let id = Uuid::new_v4();
    let now = Utc::now().to_rfc3339();
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO community_goal (id, title, description, goal_type, target_value, current_value, start_date, end_date, is_active, is_featured, created_at, updated_at) VALUES (?, ?, ?, ?, ?, 0, ?, ?, 1, 0, ?, ?)",
        vec![
            id.into(),
            "Test Goal".into(),
            "desc".into(),
            goal_type.into(),
            target.into(),
            start_date.into(),
            end_date.into(),
            now.clone().into(),
            now.into(),
        ],
    ))
    .await
    .unwrap();
    id
}

pub async fn set_profile_counters(
    db: &DatabaseConnection,
    user_id: Uuid,
    cases_completed: i32,
    current_streak: i32,
    skills: Option<&str>,
    availability: Option<&str>,
) {
    let now = Utc::now().to_rfc3339();
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO volunteer_profile (user_id, skills, availability, is_onboarded, cases_accepted, cases_completed, current_streak, longest_streak, last_activity, total_points, created_at, updated_at) \
         VALUES (?, ?, ?, 0, 0, ?, ?, ?, NULL, 0, ?, ?) \
         ON CONFLICT (user_id) DO UPDATE SET skills = excluded.skills, availability = excluded.availability, cases_completed = excluded.cases_completed, current_streak = excluded.current_streak, longest_streak = excluded.longest_streak",
        vec![
            user_id.into(),
            DbValue::from(skills.map(str::to_string)),
            DbValue::from(availability.map(str::to_string)),
            cases_completed.into(),
            current_streak.into(),
            current_streak.into(),
            now.clone().into(),
            now.into(),
        ],
    ))
    .await
    .unwrap();
}

pub async fn set_schedule_state(
    db: &DatabaseConnection,
    user_id: Uuid,
    onboarded: bool,
    last_activity: Option<&str>,
) {
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "UPDATE volunteer_profile SET is_onboarded = ?, last_activity = ? WHERE user_id = ?",
        vec![
            onboarded.into(),
            DbValue::from(last_activity.map(str::to_string)),
            user_id.into(),
        ],
    ))
    .await
    .unwrap();
}

async fn seed_badges(db: &DatabaseConnection) {
    let now = Utc::now().to_rfc3339();
    let rows: Vec<(&str, &str, &str, Option<i32>, Option<i32>, Option<i32>, i32)> = vec![
        ("first-case", "First Case", "MILESTONE", Some(1), None, None, 2),
        ("helper", "Helper", "MILESTONE", Some(5), None, None, 10),
        ("dedicated", "Dedicated", "MILESTONE", Some(10), None, None, 20),
        ("champion", "Champion", "MILESTONE", Some(25), None, None, 50),
        ("hero", "Hero", "MILESTONE", Some(50), None, None, 100),
        ("legend", "Legend", "MILESTONE", Some(100), None, None, 200),
        ("streak-3", "Getting Started", "STREAK", None, Some(3), None, 3),
        ("streak-7", "Week Warrior", "STREAK", None, Some(7), None, 7),
        ("streak-14", "Fortnight Force", "STREAK", None, Some(14), None, 14),
        ("streak-30", "Monthly Master", "STREAK", None, Some(30), None, 30),
        ("streak-100", "Centurion", "STREAK", None, Some(100), None, 100),
        ("storyteller", "Storyteller", "COMMUNITY", None, None, Some(1), 5),
        ("narrator", "Narrator", "COMMUNITY", None, None, Some(5), 25),
        ("chronicler", "Chronicler", "COMMUNITY", None, None, Some(10), 50),
        ("author", "Author", "COMMUNITY", None, None, Some(25), 125),
        ("early-adopter", "Early Adopter", "SPECIAL", None, None, None, 10),
    ];
    for (slug, name, category, cases, streak, stories, points) in rows {
        db.execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "INSERT INTO badge (id, slug, name, description, icon, category, required_cases, required_streak, required_stories, points_value, is_active, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            vec![
                Uuid::new_v4().into(),
                slug.into(),
                name.into(),
                name.into(),
                "*".into(),
                category.into(),
                DbValue::from(cases),
                DbValue::from(streak),
                DbValue::from(stories),
                points.into(),
                true.into(),
                now.clone().into(),
            ],
        ))
        .await
        .unwrap();
    }
}

async fn bootstrap_sqlite(db: &DatabaseConnection) {
    db.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        "PRAGMA foreign_keys = ON;",
    ))
    .await
    .unwrap();

    db.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        r#"
        CREATE TABLE user (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    ))
    .await
    .unwrap();

    db.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        r#"
        CREATE TABLE volunteer_profile (
            user_id TEXT PRIMARY KEY,
            skills TEXT,
            availability TEXT,
            is_onboarded INTEGER NOT NULL DEFAULT 0,
            cases_accepted INTEGER NOT NULL DEFAULT 0,
            cases_completed INTEGER NOT NULL DEFAULT 0,
            current_streak INTEGER NOT NULL DEFAULT 0,
            longest_streak INTEGER NOT NULL DEFAULT 0,
            last_activity TEXT,
            total_points INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE
        );
        "#,
    ))
    .await
    .unwrap();

    db.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        r#"
        CREATE TABLE case_record (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'OPEN',
            urgency_score INTEGER,
            is_public INTEGER NOT NULL DEFAULT 0,
            assigned_volunteer_id TEXT,
            resolved_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    ))
    .await
    .unwrap();

    db.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        r#"
        CREATE TABLE assignment (
            id TEXT PRIMARY KEY,
            case_id TEXT NOT NULL,
            volunteer_id TEXT NOT NULL,
            coordinator_id TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'PENDING',
            assignment_note TEXT,
            volunteer_response TEXT,
            estimated_hours INTEGER,
            actual_hours INTEGER,
            created_at TEXT NOT NULL,
            accepted_at TEXT,
            started_at TEXT,
            completed_at TEXT,
            UNIQUE (case_id, volunteer_id),
            FOREIGN KEY(case_id) REFERENCES case_record(id) ON DELETE CASCADE,
            FOREIGN KEY(volunteer_id) REFERENCES user(id) ON DELETE CASCADE
        );
        "#,
    ))
    .await
    .unwrap();

    db.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        r#"
        CREATE TABLE story (
            id TEXT PRIMARY KEY,
            author_id TEXT NOT NULL,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'DRAFT',
            case_id TEXT,
            assignment_id TEXT,
            published_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(author_id) REFERENCES user(id) ON DELETE CASCADE
        );
        "#,
    ))
    .await
    .unwrap();

    db.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        r#"
        CREATE TABLE activity_log (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            description TEXT NOT NULL,
            points_earned INTEGER NOT NULL DEFAULT 0,
            meta TEXT NOT NULL DEFAULT '{}',
            activity_date TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE
        );
        "#,
    ))
    .await
    .unwrap();

    db.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        r#"
        CREATE TABLE badge (
            id TEXT PRIMARY KEY,
            slug TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            icon TEXT NOT NULL,
            category TEXT NOT NULL,
            required_cases INTEGER,
            required_streak INTEGER,
            required_stories INTEGER,
            points_value INTEGER NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL
        );
        "#,
    ))
    .await
    .unwrap();

    db.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        r#"
        CREATE TABLE user_badge (
            user_id TEXT NOT NULL,
            badge_id TEXT NOT NULL,
            earned_at TEXT NOT NULL,
            earned_for_case TEXT,
            earned_for_story TEXT,
            PRIMARY KEY (user_id, badge_id),
            FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE,
            FOREIGN KEY(badge_id) REFERENCES badge(id) ON DELETE CASCADE
        );
        "#,
    ))
    .await
    .unwrap();

    db.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        r#"
        CREATE TABLE community_goal (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            goal_type TEXT NOT NULL,
            target_value INTEGER NOT NULL,
            current_value INTEGER NOT NULL DEFAULT 0,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            is_featured INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    ))
    .await
    .unwrap();

    db.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        r#"
        CREATE TABLE email_schedule (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            scheduled_for TEXT NOT NULL,
            sent INTEGER NOT NULL DEFAULT 0,
            sent_at TEXT,
            failed INTEGER NOT NULL DEFAULT 0,
            error_message TEXT,
            recurring INTEGER NOT NULL DEFAULT 0,
            interval_days INTEGER,
            context TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE
        );
        "#,
    ))
    .await
    .unwrap();
}
