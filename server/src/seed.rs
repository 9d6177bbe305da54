use anyhow::Result;
use chrono::{Datelike, Duration, Utc};
use entity::{case_record, community_goal, user};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use tracing::info;
use uuid::Uuid;

/// Insert a small demo dataset: a few volunteers, some open cases and one
/// featured monthly goal. Safe to run repeatedly; existing rows are skipped
/// by email / title lookup.
pub async fn run(db: &DatabaseConnection) -> Result<()> {
    let now = Utc::now();
    let now_tz = now.into();

    let volunteers = [
        ("amal@example.org", "Amal Haddad"),
        ("jonas@example.org", "Jonas Weber"),
        ("priya@example.org", "Priya Nair"),
    ];
    let mut users_created = 0;
    for (email, name) in volunteers {
        let exists = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(db)
            .await?
            .is_some();
        if exists {
            continue;
        }
        user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_string()),
            display_name: Set(name.to_string()),
            is_active: Set(true),
            created_at: Set(now_tz),
            updated_at: Set(now_tz),
        }
        .insert(db)
        .await?;
        users_created += 1;
    }

    let cases = [
        (
            "Translate school enrollment letters",
            "A family needs help translating enrollment paperwork from Arabic.",
            Some(3),
        ),
        (
            "Accompany hospital visit",
            "Interpretation support for a specialist appointment next week.",
            Some(6),
        ),
        (
            "Urgent housing paperwork",
            "Deadline-bound application forms; needs an experienced volunteer.",
            Some(9),
        ),
    ];
    let mut cases_created = 0;
    for (title, description, urgency) in cases {
        let exists = case_record::Entity::find()
            .filter(case_record::Column::Title.eq(title))
            .one(db)
            .await?
            .is_some();
        if exists {
            continue;
        }
        case_record::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title.to_string()),
            description: Set(description.to_string()),
            status: Set("OPEN".to_string()),
            urgency_score: Set(urgency),
            is_public: Set(true),
            assigned_volunteer_id: Set(None),
            resolved_at: Set(None),
            created_at: Set(now_tz),
            updated_at: Set(now_tz),
        }
        .insert(db)
        .await?;
        cases_created += 1;
    }

    let month_label = format!("Community goal {}-{:02}", now.year(), now.month());
    let goal_exists = community_goal::Entity::find()
        .filter(community_goal::Column::Title.eq(month_label.as_str()))
        .one(db)
        .await?
        .is_some();
    if !goal_exists {
        let today = now.date_naive();
        community_goal::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(month_label),
            description: Set("Resolve 50 cases together this month.".to_string()),
            goal_type: Set(community_goal::GoalType::Cases),
            target_value: Set(50),
            current_value: Set(0),
            start_date: Set(today),
            end_date: Set(today + Duration::days(30)),
            is_active: Set(true),
            is_featured: Set(true),
            created_at: Set(now_tz),
            updated_at: Set(now_tz),
        }
        .insert(db)
        .await?;
    }

    info!(users_created, cases_created, "seed data applied");
    Ok(())
}
