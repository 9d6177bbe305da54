use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::OnConflict;

#[derive(DeriveIden)]
enum Badge {
    Table,
    Slug,
    Name,
    Description,
    Icon,
    Category,
    RequiredCases,
    RequiredStreak,
    RequiredStories,
    PointsValue,
}

struct Row {
    slug: &'static str,
    name: &'static str,
    description: &'static str,
    icon: &'static str,
    category: &'static str,
    required_cases: Option<i32>,
    required_streak: Option<i32>,
    required_stories: Option<i32>,
    points_value: i32,
}

const fn milestone(
    slug: &'static str,
    name: &'static str,
    description: &'static str,
    icon: &'static str,
    cases: i32,
) -> Row {
    Row {
        slug,
        name,
        description,
        icon,
        category: "MILESTONE",
        required_cases: Some(cases),
        required_streak: None,
        required_stories: None,
        points_value: cases * 2,
    }
}

const fn streak(slug: &'static str, name: &'static str, icon: &'static str, days: i32) -> Row {
    Row {
        slug,
        name,
        description: "Stayed active on consecutive days",
        icon,
        category: "STREAK",
        required_cases: None,
        required_streak: Some(days),
        required_stories: None,
        points_value: days,
    }
}

const fn community(slug: &'static str, name: &'static str, icon: &'static str, stories: i32) -> Row {
    Row {
        slug,
        name,
        description: "Shared impact stories with the community",
        icon,
        category: "COMMUNITY",
        required_cases: None,
        required_streak: None,
        required_stories: Some(stories),
        points_value: stories * 5,
    }
}

const CATALOG: &[Row] = &[
    milestone("first-case", "First Case", "Completed your first case", "🌱", 1),
    milestone("helper", "Helper", "Completed 5 cases", "🤝", 5),
    milestone("dedicated", "Dedicated", "Completed 10 cases", "⭐", 10),
    milestone("champion", "Champion", "Completed 25 cases", "🏆", 25),
    milestone("hero", "Hero", "Completed 50 cases", "🦸", 50),
    milestone("legend", "Legend", "Completed 100 cases", "👑", 100),
    streak("streak-3", "Getting Started", "🔥", 3),
    streak("streak-7", "Week Warrior", "⚡", 7),
    streak("streak-14", "Fortnight Force", "💪", 14),
    streak("streak-30", "Monthly Master", "🌟", 30),
    streak("streak-100", "Centurion", "💯", 100),
    community("storyteller", "Storyteller", "📖", 1),
    community("narrator", "Narrator", "📚", 5),
    community("chronicler", "Chronicler", "✍️", 10),
    community("author", "Author", "🖋️", 25),
    Row {
        slug: "early-adopter",
        name: "Early Adopter",
        description: "Joined during the launch period",
        icon: "🚀",
        category: "SPECIAL",
        required_cases: None,
        required_streak: None,
        required_stories: None,
        points_value: 10,
    },
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for row in CATALOG {
            let insert = Query::insert()
                .into_table(Badge::Table)
                .columns([
                    Badge::Slug,
                    Badge::Name,
                    Badge::Description,
                    Badge::Icon,
                    Badge::Category,
                    Badge::RequiredCases,
                    Badge::RequiredStreak,
                    Badge::RequiredStories,
                    Badge::PointsValue,
                ])
                .values_panic([
                    row.slug.into(),
                    row.name.into(),
                    row.description.into(),
                    row.icon.into(),
                    row.category.into(),
                    row.required_cases.into(),
                    row.required_streak.into(),
                    row.required_stories.into(),
                    row.points_value.into(),
                ])
                .on_conflict(OnConflict::column(Badge::Slug).do_nothing().to_owned())
                .to_owned();
            manager.exec_stmt(insert).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let slugs: Vec<Value> = CATALOG.iter().map(|row| row.slug.into()).collect();
        manager
            .exec_stmt(
                Query::delete()
                    .from_table(Badge::Table)
                    .and_where(Expr::col(Badge::Slug).is_in(slugs))
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
