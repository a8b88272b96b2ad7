pub mod import;
pub mod schema_gen;
pub mod sqlite;

pub use import::{import_launches, link_satellites, ImportReport, LinkOutcome, Satellite};
pub use sqlite::{batch_insert, create_tables};
