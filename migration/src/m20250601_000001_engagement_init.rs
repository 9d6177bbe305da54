use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
    Email,
    DisplayName,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum VolunteerProfile {
    Table,
    UserId,
    Skills,
    Availability,
    IsOnboarded,
    CasesAccepted,
    CasesCompleted,
    CurrentStreak,
    LongestStreak,
    LastActivity,
    TotalPoints,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CaseRecord {
    Table,
    Id,
    Title,
    Description,
    Status,
    UrgencyScore,
    IsPublic,
    AssignedVolunteerId,
    ResolvedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Assignment {
    Table,
    Id,
    CaseId,
    VolunteerId,
    CoordinatorId,
    Status,
    AssignmentNote,
    VolunteerResponse,
    EstimatedHours,
    ActualHours,
    CreatedAt,
    AcceptedAt,
    StartedAt,
    CompletedAt,
}

#[derive(DeriveIden)]
enum Story {
    Table,
    Id,
    AuthorId,
    Title,
    Body,
    Status,
    CaseId,
    AssignmentId,
    PublishedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ActivityLog {
    Table,
    Id,
    UserId,
    Kind,
    Description,
    PointsEarned,
    Meta,
    ActivityDate,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Badge {
    Table,
    Id,
    Slug,
    Name,
    Description,
    Icon,
    Category,
    RequiredCases,
    RequiredStreak,
    RequiredStories,
    PointsValue,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UserBadge {
    Table,
    UserId,
    BadgeId,
    EarnedAt,
    EarnedForCase,
    EarnedForStory,
}

#[derive(DeriveIden)]
enum CommunityGoal {
    Table,
    Id,
    Title,
    Description,
    GoalType,
    TargetValue,
    CurrentValue,
    StartDate,
    EndDate,
    IsActive,
    IsFeatured,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum EmailSchedule {
    Table,
    Id,
    UserId,
    Kind,
    ScheduledFor,
    Sent,
    SentAt,
    Failed,
    ErrorMessage,
    Recurring,
    IntervalDays,
    Context,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(User::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .default(Expr::cust("gen_random_uuid()")),
                    )
                    .col(ColumnDef::new(User::Email).string_len(320).not_null())
                    .col(ColumnDef::new(User::DisplayName).string_len(128).not_null())
                    .col(
                        ColumnDef::new(User::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(User::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("now()")),
                    )
                    .col(
                        ColumnDef::new(User::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("now()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_email")
                    .table(User::Table)
                    .col(User::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(VolunteerProfile::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VolunteerProfile::UserId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VolunteerProfile::Skills).text())
                    .col(ColumnDef::new(VolunteerProfile::Availability).string_len(256))
                    .col(
                        ColumnDef::new(VolunteerProfile::IsOnboarded)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(VolunteerProfile::CasesAccepted)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(VolunteerProfile::CasesCompleted)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(VolunteerProfile::CurrentStreak)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(VolunteerProfile::LongestStreak)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(VolunteerProfile::LastActivity).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(VolunteerProfile::TotalPoints)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(VolunteerProfile::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("now()")),
                    )
                    .col(
                        ColumnDef::new(VolunteerProfile::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("now()")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_profile_user")
                            .from(VolunteerProfile::Table, VolunteerProfile::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CaseRecord::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CaseRecord::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .default(Expr::cust("gen_random_uuid()")),
                    )
                    .col(ColumnDef::new(CaseRecord::Title).string_len(300).not_null())
                    .col(ColumnDef::new(CaseRecord::Description).text().not_null())
                    .col(
                        ColumnDef::new(CaseRecord::Status)
                            .string_len(32)
                            .not_null()
                            .default("OPEN"),
                    )
                    .col(ColumnDef::new(CaseRecord::UrgencyScore).integer())
                    .col(
                        ColumnDef::new(CaseRecord::IsPublic)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(CaseRecord::AssignedVolunteerId).uuid())
                    .col(ColumnDef::new(CaseRecord::ResolvedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(CaseRecord::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("now()")),
                    )
                    .col(
                        ColumnDef::new(CaseRecord::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("now()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_case_status")
                    .table(CaseRecord::Table)
                    .col(CaseRecord::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Assignment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Assignment::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .default(Expr::cust("gen_random_uuid()")),
                    )
                    .col(ColumnDef::new(Assignment::CaseId).uuid().not_null())
                    .col(ColumnDef::new(Assignment::VolunteerId).uuid().not_null())
                    .col(ColumnDef::new(Assignment::CoordinatorId).uuid().not_null())
                    .col(
                        ColumnDef::new(Assignment::Status)
                            .string_len(32)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(ColumnDef::new(Assignment::AssignmentNote).text())
                    .col(ColumnDef::new(Assignment::VolunteerResponse).text())
                    .col(ColumnDef::new(Assignment::EstimatedHours).integer())
                    .col(ColumnDef::new(Assignment::ActualHours).integer())
                    .col(
                        ColumnDef::new(Assignment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("now()")),
                    )
                    .col(ColumnDef::new(Assignment::AcceptedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Assignment::StartedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Assignment::CompletedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assignment_case")
                            .from(Assignment::Table, Assignment::CaseId)
                            .to(CaseRecord::Table, CaseRecord::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assignment_volunteer")
                            .from(Assignment::Table, Assignment::VolunteerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One live assignment per volunteer per case, enforced at the storage
        // layer so concurrent createAssignment calls cannot both land.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_assignment_case_volunteer")
                    .table(Assignment::Table)
                    .col(Assignment::CaseId)
                    .col(Assignment::VolunteerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_assignment_volunteer_status")
                    .table(Assignment::Table)
                    .col(Assignment::VolunteerId)
                    .col(Assignment::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Story::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Story::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .default(Expr::cust("gen_random_uuid()")),
                    )
                    .col(ColumnDef::new(Story::AuthorId).uuid().not_null())
                    .col(ColumnDef::new(Story::Title).string_len(300).not_null())
                    .col(ColumnDef::new(Story::Body).text().not_null())
                    .col(
                        ColumnDef::new(Story::Status)
                            .string_len(32)
                            .not_null()
                            .default("DRAFT"),
                    )
                    .col(ColumnDef::new(Story::CaseId).uuid())
                    .col(ColumnDef::new(Story::AssignmentId).uuid())
                    .col(ColumnDef::new(Story::PublishedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Story::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("now()")),
                    )
                    .col(
                        ColumnDef::new(Story::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("now()")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_story_author")
                            .from(Story::Table, Story::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_story_author_status")
                    .table(Story::Table)
                    .col(Story::AuthorId)
                    .col(Story::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ActivityLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActivityLog::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .default(Expr::cust("gen_random_uuid()")),
                    )
                    .col(ColumnDef::new(ActivityLog::UserId).uuid().not_null())
                    .col(ColumnDef::new(ActivityLog::Kind).string_len(32).not_null())
                    .col(
                        ColumnDef::new(ActivityLog::Description)
                            .string_len(512)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ActivityLog::PointsEarned)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ActivityLog::Meta)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'{}'::jsonb")),
                    )
                    .col(ColumnDef::new(ActivityLog::ActivityDate).date().not_null())
                    .col(
                        ColumnDef::new(ActivityLog::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("now()")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_user")
                            .from(ActivityLog::Table, ActivityLog::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_activity_user_date")
                    .table(ActivityLog::Table)
                    .col(ActivityLog::UserId)
                    .col(ActivityLog::ActivityDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Badge::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Badge::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .default(Expr::cust("gen_random_uuid()")),
                    )
                    .col(ColumnDef::new(Badge::Slug).string_len(64).not_null())
                    .col(ColumnDef::new(Badge::Name).string_len(128).not_null())
                    .col(ColumnDef::new(Badge::Description).string_len(512).not_null())
                    .col(ColumnDef::new(Badge::Icon).string_len(16).not_null())
                    .col(ColumnDef::new(Badge::Category).string_len(32).not_null())
                    .col(ColumnDef::new(Badge::RequiredCases).integer())
                    .col(ColumnDef::new(Badge::RequiredStreak).integer())
                    .col(ColumnDef::new(Badge::RequiredStories).integer())
                    .col(
                        ColumnDef::new(Badge::PointsValue)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Badge::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Badge::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("now()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_badge_slug")
                    .table(Badge::Table)
                    .col(Badge::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserBadge::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserBadge::UserId).uuid().not_null())
                    .col(ColumnDef::new(UserBadge::BadgeId).uuid().not_null())
                    .col(
                        ColumnDef::new(UserBadge::EarnedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("now()")),
                    )
                    .col(ColumnDef::new(UserBadge::EarnedForCase).uuid())
                    .col(ColumnDef::new(UserBadge::EarnedForStory).uuid())
                    .primary_key(
                        Index::create()
                            .col(UserBadge::UserId)
                            .col(UserBadge::BadgeId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_badge_user")
                            .from(UserBadge::Table, UserBadge::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_badge_badge")
                            .from(UserBadge::Table, UserBadge::BadgeId)
                            .to(Badge::Table, Badge::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CommunityGoal::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CommunityGoal::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .default(Expr::cust("gen_random_uuid()")),
                    )
                    .col(ColumnDef::new(CommunityGoal::Title).string_len(200).not_null())
                    .col(
                        ColumnDef::new(CommunityGoal::Description)
                            .string_len(512)
                            .not_null(),
                    )
                    .col(ColumnDef::new(CommunityGoal::GoalType).string_len(32).not_null())
                    .col(ColumnDef::new(CommunityGoal::TargetValue).integer().not_null())
                    .col(
                        ColumnDef::new(CommunityGoal::CurrentValue)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(CommunityGoal::StartDate).date().not_null())
                    .col(ColumnDef::new(CommunityGoal::EndDate).date().not_null())
                    .col(
                        ColumnDef::new(CommunityGoal::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(CommunityGoal::IsFeatured)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CommunityGoal::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("now()")),
                    )
                    .col(
                        ColumnDef::new(CommunityGoal::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("now()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_goal_active_type")
                    .table(CommunityGoal::Table)
                    .col(CommunityGoal::IsActive)
                    .col(CommunityGoal::GoalType)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EmailSchedule::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EmailSchedule::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .default(Expr::cust("gen_random_uuid()")),
                    )
                    .col(ColumnDef::new(EmailSchedule::UserId).uuid().not_null())
                    .col(ColumnDef::new(EmailSchedule::Kind).string_len(32).not_null())
                    .col(
                        ColumnDef::new(EmailSchedule::ScheduledFor)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EmailSchedule::Sent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(EmailSchedule::SentAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(EmailSchedule::Failed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(EmailSchedule::ErrorMessage).string_len(512))
                    .col(
                        ColumnDef::new(EmailSchedule::Recurring)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(EmailSchedule::IntervalDays).integer())
                    .col(
                        ColumnDef::new(EmailSchedule::Context)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'{}'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(EmailSchedule::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("now()")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_email_user")
                            .from(EmailSchedule::Table, EmailSchedule::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_email_due")
                    .table(EmailSchedule::Table)
                    .col(EmailSchedule::ScheduledFor)
                    .col(EmailSchedule::Sent)
                    .col(EmailSchedule::Failed)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_email_user_kind")
                    .table(EmailSchedule::Table)
                    .col(EmailSchedule::UserId)
                    .col(EmailSchedule::Kind)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            EmailSchedule::Table.into_table_ref(),
            CommunityGoal::Table.into_table_ref(),
            UserBadge::Table.into_table_ref(),
            Badge::Table.into_table_ref(),
            ActivityLog::Table.into_table_ref(),
            Story::Table.into_table_ref(),
            Assignment::Table.into_table_ref(),
            CaseRecord::Table.into_table_ref(),
            VolunteerProfile::Table.into_table_ref(),
            User::Table.into_table_ref(),
        ] {
            manager.drop_table(Table::drop().table(table).to_owned()).await?;
        }
        Ok(())
    }
}
