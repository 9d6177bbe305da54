pub mod engine;
pub mod schema;

pub use schema::{build_schema, AppSchema};
