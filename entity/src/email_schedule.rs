use sea_orm::entity::prelude::*;

/// Due-queue row for scheduled email delivery. Rows are claimed by the
/// delivery sweep; `failed` is terminal, recurring rows are rescheduled
/// relative to `scheduled_for` so the cadence never drifts.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "email_schedule")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub user_id: Uuid,
    pub kind: Kind,
    pub scheduled_for: DateTimeWithTimeZone,
    pub sent: bool,
    pub sent_at: Option<DateTimeWithTimeZone>,
    pub failed: bool,
    pub error_message: Option<String>,
    pub recurring: bool,
    pub interval_days: Option<i32>,
    pub context: Json,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum Kind {
    #[sea_orm(string_value = "WELCOME")]
    Welcome,
    #[sea_orm(string_value = "LAYER_UP")]
    LayerUp,
    #[sea_orm(string_value = "ENGAGEMENT")]
    Engagement,
    #[sea_orm(string_value = "WEEKLY_MOTIVATION")]
    WeeklyMotivation,
    #[sea_orm(string_value = "STREAK_REMINDER")]
    StreakReminder,
    #[sea_orm(string_value = "COMPLETION_NOTICE")]
    CompletionNotice,
    #[sea_orm(string_value = "STORY_PUBLISHED")]
    StoryPublished,
    #[sea_orm(string_value = "ASSIGNMENT_NOTICE")]
    AssignmentNotice,
}

impl Kind {
    pub fn template_name(self) -> &'static str {
        match self {
            Kind::Welcome => "welcome",
            Kind::LayerUp => "layer_up",
            Kind::Engagement => "engagement",
            Kind::WeeklyMotivation => "weekly_motivation",
            Kind::StreakReminder => "streak_reminder",
            Kind::CompletionNotice => "completion_notice",
            Kind::StoryPublished => "story_published",
            Kind::AssignmentNotice => "assignment_notice",
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
