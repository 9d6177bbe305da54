pub mod activity_log;
pub mod assignment;
pub mod badge;
pub mod case_record;
pub mod community_goal;
pub mod email_schedule;
pub mod story;
pub mod user;
pub mod user_badge;
pub mod volunteer_profile;
