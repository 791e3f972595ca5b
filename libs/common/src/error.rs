//! Error types for database setup shared by the services

use sqlx::Error as SqlxError;
use sqlx::migrate::MigrateError;
use thiserror::Error;

/// Failure while connecting to, checking, or migrating the attendance database
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The pool could not be opened
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// A statement failed
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Applying the bundled migrations failed
    #[error("Database migration error: {0}")]
    Migration(#[source] MigrateError),

    /// Invalid settings, usually a malformed URL
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;
