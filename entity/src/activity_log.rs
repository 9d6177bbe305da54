use sea_orm::entity::prelude::*;

/// Append-only engagement ledger. `activity_date` is denormalized from
/// `created_at` so streak lookups stay on an indexed equality scan.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "activity_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub user_id: Uuid,
    pub kind: Kind,
    pub description: String,
    pub points_earned: i32,
    pub meta: Json,
    pub activity_date: Date,
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
    #[sea_orm(string_value = "CASE_COMPLETED")]
    CaseCompleted,
    #[sea_orm(string_value = "STORY_PUBLISHED")]
    StoryPublished,
    #[sea_orm(string_value = "ASSIGNMENT_ACCEPTED")]
    AssignmentAccepted,
    #[sea_orm(string_value = "BADGE_EARNED")]
    BadgeEarned,
}

impl ActiveModelBehavior for ActiveModel {}
