use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "community_goal")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub goal_type: GoalType,
    pub target_value: i32,
    pub current_value: i32,
    pub start_date: Date,
    pub end_date: Date,
    pub is_active: bool,
    pub is_featured: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Progress toward target, clamped to 100.
    pub fn progress_percentage(&self) -> f64 {
        if self.target_value <= 0 {
            return 0.0;
        }
        (f64::from(self.current_value) / f64::from(self.target_value) * 100.0).min(100.0)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum GoalType {
    #[sea_orm(string_value = "CASES")]
    Cases,
    #[sea_orm(string_value = "STORIES")]
    Stories,
    #[sea_orm(string_value = "VOLUNTEERS")]
    Volunteers,
    #[sea_orm(string_value = "DONATIONS")]
    Donations,
}

impl ActiveModelBehavior for ActiveModel {}
