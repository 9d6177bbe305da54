use sea_orm::entity::prelude::*;

/// Badge catalog row. `slug` is the stable programmatic identity; display
/// names and descriptions are free to change without touching award logic.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "badge")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub slug: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: Category,
    pub required_cases: Option<i32>,
    pub required_streak: Option<i32>,
    pub required_stories: Option<i32>,
    pub points_value: i32,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_badge::Entity")]
    Grants,
}

impl Related<super::user_badge::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Grants.def()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum Category {
    #[sea_orm(string_value = "MILESTONE")]
    Milestone,
    #[sea_orm(string_value = "STREAK")]
    Streak,
    #[sea_orm(string_value = "COMMUNITY")]
    Community,
    #[sea_orm(string_value = "SPECIAL")]
    Special,
}

impl ActiveModelBehavior for ActiveModel {}
