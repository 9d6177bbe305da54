//! Engagement engine. Every mutation entry point takes an explicit `now`
//! so callers (and tests) control the clock; persistence happens through
//! the caller's connection, which is a transaction for multi-step flows.

pub mod activity;
pub mod assignment;
pub mod badges;
pub mod boba;
pub mod goals;
pub mod outbox;
pub mod stats;
pub mod stories;
