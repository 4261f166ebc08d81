//! SQLite storage gateway: schema migrations plus idempotent run
//! persistence keyed on `(character, start_time)`.

mod db;
mod error;
mod migrations;

pub use db::{insert_party, upsert_run, ConflictPolicy, Database, UpsertOutcome};
pub use error::{DatabaseError, DatabaseResult};
pub use migrations::{run_migrations, CURRENT_VERSION};
