pub mod sqlite;
pub mod repository;

pub use sqlite::*;
pub use repository::*;

use rusqlite::ErrorCode;
use thiserror::Error;

/// SQLite extended result codes surfaced as typed errors.
const SQLITE_CONSTRAINT_FOREIGNKEY: i32 = 787;
const SQLITE_CONSTRAINT_PRIMARYKEY: i32 = 1555;
const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("Duplicate value: {0}")]
    Duplicate(String),

    #[error("Corrupt row in {table}: {reason}")]
    CorruptRow { table: &'static str, reason: String },

    #[error("Cannot create database directory {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl DatabaseError {
    pub fn not_found(entity_type: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, message) = &err {
            if code.code == ErrorCode::ConstraintViolation {
                let detail = message.clone().unwrap_or_else(|| code.to_string());
                return match code.extended_code {
                    SQLITE_CONSTRAINT_UNIQUE | SQLITE_CONSTRAINT_PRIMARYKEY => {
                        DatabaseError::Duplicate(detail)
                    }
                    SQLITE_CONSTRAINT_FOREIGNKEY => DatabaseError::ConstraintViolation(
                        "referenced record does not exist".to_string(),
                    ),
                    _ => DatabaseError::ConstraintViolation(detail),
                };
            }
        }
        DatabaseError::Sqlite(err)
    }
}
