use sea_orm::entity::prelude::*;

/// Per-user engagement counters. Created lazily on first engagement event,
/// mutated only through atomic column expressions.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "volunteer_profile")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    pub skills: Option<String>,
    pub availability: Option<String>,
    pub is_onboarded: bool,
    pub cases_accepted: i32,
    pub cases_completed: i32,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_activity: Option<DateTimeWithTimeZone>,
    pub total_points: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
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

impl ActiveModelBehavior for ActiveModel {}
