use sea_orm::entity::prelude::*;

/// A case/volunteer/coordinator work unit. One per (case, volunteer) pair.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "assignment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub case_id: Uuid,
    #[sea_orm(indexed)]
    pub volunteer_id: Uuid,
    pub coordinator_id: Uuid,
    pub status: Status,
    pub assignment_note: Option<String>,
    pub volunteer_response: Option<String>,
    pub estimated_hours: Option<i32>,
    pub actual_hours: Option<i32>,
    pub created_at: DateTimeWithTimeZone,
    pub accepted_at: Option<DateTimeWithTimeZone>,
    pub started_at: Option<DateTimeWithTimeZone>,
    pub completed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::case_record::Entity",
        from = "Column::CaseId",
        to = "super::case_record::Column::Id",
        on_delete = "Cascade"
    )]
    Case,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::VolunteerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Volunteer,
}

impl Related<super::case_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Case.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Volunteer.def()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum Status {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "ACCEPTED")]
    Accepted,
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "DECLINED")]
    Declined,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "PENDING",
            Status::Accepted => "ACCEPTED",
            Status::InProgress => "IN_PROGRESS",
            Status::Completed => "COMPLETED",
            Status::Declined => "DECLINED",
            Status::Cancelled => "CANCELLED",
        }
    }

    /// COMPLETED, DECLINED and CANCELLED admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Completed | Status::Declined | Status::Cancelled)
    }
}

impl ActiveModelBehavior for ActiveModel {}
