//! Local gateway backed by SQLite
//! Uses sqlx to serve the same query contract as the hosted backend,
//! with the same uniqueness rules enforced by the schema.

mod repository;
mod schema;
mod sql;

pub use repository::Database;
