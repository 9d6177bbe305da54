use chrono::Duration;
use entity::{case_record, story, volunteer_profile};
use platform_api::EngineResult;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use super::{activity, badges};

/// How many open cases are scored per call.
const CANDIDATE_POOL: u64 = 10;
/// Minimum score for a case to be recommended at all.
const SCORE_FLOOR: f64 = 0.3;
/// How many recommendations are returned.
const TOP_N: usize = 2;

const NOVICE_MAX_URGENCY: i32 = 5;
const EXPERIENCED_MIN_CASES: i32 = 10;
const EXPERIENCED_MIN_URGENCY: i32 = 7;

#[derive(Debug, Clone)]
pub struct CaseRecommendation {
    pub case_id: Uuid,
    pub title: String,
    pub score: f64,
}

#[derive(Debug, Clone)]
pub struct Recommendations {
    pub greeting: String,
    pub recommendations: Vec<CaseRecommendation>,
    pub nudges: Vec<String>,
}

/// Score one case against a profile. Stateless; every factor is a simple
/// counter or text comparison, clamped to [0, 1] at the end.
pub fn case_match_score(
    skills: Option<&str>,
    availability: Option<&str>,
    cases_completed: i32,
    current_streak: i32,
    case_title: &str,
    case_description: &str,
    urgency: i32,
) -> f64 {
    let mut score = 0.0;
    if availability.is_some_and(|a| !a.trim().is_empty()) {
        score += 0.2;
    }

    if let Some(skills) = skills {
        let haystack = format!("{} {}", case_title, case_description).to_lowercase();
        let mut overlap = 0.0_f64;
        for word in skills
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 2)
        {
            if haystack.contains(&word.to_lowercase()) {
                overlap += 0.1;
            }
        }
        score += overlap.min(0.4);
    }

    let novice_fit = cases_completed == 0 && urgency <= NOVICE_MAX_URGENCY;
    let experienced_fit =
        cases_completed >= EXPERIENCED_MIN_CASES && urgency >= EXPERIENCED_MIN_URGENCY;
    if novice_fit || experienced_fit {
        score += 0.3;
    }

    if current_streak >= 3 && urgency >= 8 {
        score += 0.2;
    }

    score.clamp(0.0, 1.0)
}

fn greeting_for(profile: &volunteer_profile::Model, display_name: &str) -> String {
    if profile.current_streak >= 7 {
        format!(
            "Welcome back, {}! Your {}-day streak is inspiring.",
            display_name, profile.current_streak
        )
    } else if profile.cases_completed >= 5 {
        format!(
            "Good to see you, {} — the community is stronger with you in it.",
            display_name
        )
    } else if profile.cases_completed >= 1 {
        format!("Hi {}! I found some cases that fit you well.", display_name)
    } else {
        format!(
            "Welcome, {}! Here are some good first cases to get started.",
            display_name
        )
    }
}

fn next_threshold(current: i32, thresholds: &[i32]) -> Option<i32> {
    thresholds.iter().copied().find(|&t| t > current)
}

fn build_nudges(
    profile: &volunteer_profile::Model,
    stories_published: i32,
    active_today: bool,
    active_yesterday: bool,
) -> Vec<String> {
    let mut nudges = Vec::new();

    if let Some(next) = next_threshold(profile.cases_completed, badges::MILESTONE_THRESHOLDS) {
        if next - profile.cases_completed == 1 {
            nudges.push(format!(
                "You are one case away from the {}-case milestone badge!",
                next
            ));
        }
    }

    if profile.cases_completed >= 1 && stories_published == 0 {
        nudges.push("Share your first impact story — the community would love to hear it.".into());
    }

    if active_today && profile.current_streak >= 3 {
        nudges.push(format!(
            "You're on a {}-day streak — keep it going!",
            profile.current_streak
        ));
    } else if !active_today && active_yesterday && profile.current_streak >= 7 {
        nudges.push(format!(
            "Your {}-day streak ends tonight without an activity today.",
            profile.current_streak
        ));
    }

    nudges
}

/// Read path only: scores up to ten open, unassigned cases and derives the
/// greeting and nudges from counters. Nothing here writes.
pub async fn recommendations_for<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    display_name: &str,
    now: DateTimeWithTimeZone,
) -> EngineResult<Recommendations> {
    let profile = activity::ensure_profile(conn, user_id, now).await?;

    let open_cases = case_record::Entity::find()
        .filter(case_record::Column::Status.eq("OPEN"))
        .filter(case_record::Column::AssignedVolunteerId.is_null())
        .order_by_desc(case_record::Column::CreatedAt)
        .limit(CANDIDATE_POOL)
        .all(conn)
        .await?;

    let mut scored: Vec<CaseRecommendation> = open_cases
        .into_iter()
        .map(|case| {
            let score = case_match_score(
                profile.skills.as_deref(),
                profile.availability.as_deref(),
                profile.cases_completed,
                profile.current_streak,
                &case.title,
                &case.description,
                case.urgency_score.unwrap_or(0),
            );
            CaseRecommendation {
                case_id: case.id,
                title: case.title,
                score,
            }
        })
        .filter(|rec| rec.score > SCORE_FLOOR)
        .collect();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(TOP_N);

    let stories_published = story::Entity::find()
        .filter(story::Column::AuthorId.eq(user_id))
        .filter(story::Column::Status.eq(story::Status::Published))
        .count(conn)
        .await?;
    #[allow(clippy::cast_possible_truncation)]
    let stories_published = stories_published as i32;

    let today = now.date_naive();
    let active_today = activity::was_active_on(conn, user_id, today).await?;
    let active_yesterday = activity::was_active_on(conn, user_id, today - Duration::days(1)).await?;

    Ok(Recommendations {
        greeting: greeting_for(&profile, display_name),
        recommendations: scored,
        nudges: build_nudges(&profile, stories_published, active_today, active_yesterday),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(
        skills: Option<&str>,
        availability: Option<&str>,
        cases: i32,
        streak: i32,
        urgency: i32,
    ) -> f64 {
        case_match_score(
            skills,
            availability,
            cases,
            streak,
            "Translate medical documents",
            "Arabic translation needed for hospital paperwork",
            urgency,
        )
    }

    #[test]
    fn availability_adds_a_fifth() {
        let without = score(None, None, 3, 0, 6);
        let with = score(None, Some("weekends"), 3, 0, 6);
        assert!((with - without - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn keyword_overlap_is_capped() {
        let s = score(
            Some("translation arabic medical hospital documents paperwork"),
            None,
            3,
            0,
            6,
        );
        assert!((s - 0.4).abs() < 1e-9);
    }

    #[test]
    fn novices_are_steered_to_low_urgency() {
        assert!(score(None, None, 0, 0, 4) >= 0.3);
        assert!(score(None, None, 0, 0, 8) < 0.3);
    }

    #[test]
    fn veterans_are_steered_to_high_urgency() {
        assert!(score(None, None, 12, 0, 9) >= 0.3);
        assert!(score(None, None, 12, 0, 3) < 0.3);
    }

    #[test]
    fn streak_bonus_requires_urgent_case() {
        let bonus = score(None, None, 3, 5, 9);
        let no_bonus = score(None, None, 3, 5, 7);
        assert!((bonus - no_bonus - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn score_never_exceeds_one() {
        let s = score(
            Some("translation arabic medical hospital documents paperwork"),
            Some("weekdays"),
            12,
            10,
            9,
        );
        assert!(s <= 1.0);
    }

    #[test]
    fn one_away_milestone_nudge() {
        assert_eq!(next_threshold(4, badges::MILESTONE_THRESHOLDS), Some(5));
        assert_eq!(next_threshold(5, badges::MILESTONE_THRESHOLDS), Some(10));
        assert_eq!(next_threshold(100, badges::MILESTONE_THRESHOLDS), None);
    }
}
