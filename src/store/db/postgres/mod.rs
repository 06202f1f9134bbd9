use sqlx::{Error as DbError, postgres::PgRow};

mod collection;
mod database;
mod synclient;

pub use database::PostgresStore;

/// Row mapping for records fetched from postgres.
pub trait DbRow {
    fn id(&self) -> &str;
    fn from_row(row: &PgRow) -> std::result::Result<Self, DbError>
    where
        Self: Sized;
}

/// Table/index creation run once at startup.
pub trait DbInit {
    fn init(&self);
}
