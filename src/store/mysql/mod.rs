//! MySQL bindings of the store traits. Table layout lives in `sql/schema.sql`.

mod config;
mod credit;
mod holiday;
mod request;

pub use config::MySqlConfigStore;
pub use credit::MySqlCreditStore;
pub use holiday::MySqlHolidays;
pub use request::MySqlRequestStore;

/// A primary or unique key clash. Foreign key and other integrity
/// failures are not.
fn is_duplicate_key(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
