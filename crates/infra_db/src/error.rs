//! Database error types
//!
//! This module defines the error types that can occur during database
//! operations and how they translate into the storage port's error kinds.

use thiserror::Error;

use domain_ledger::StoreError;

/// Name of the partial unique index on `(account_id, idempotency_key)`
pub const IDEMPOTENCY_INDEX: &str = "movements_account_idempotency_key";

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Unique constraint violation
    #[error("Duplicate entry on {constraint:?}: {message}")]
    DuplicateEntry {
        constraint: Option<String>,
        message: String,
    },

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Serialization failure or deadlock; the transaction can be retried
    #[error("Transaction conflict: {0}")]
    SerializationFailure(String),

    /// Migration error
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A stored row could not be turned into a domain value
    #[error("Row decoding failed: {0}")]
    Decode(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Network or socket failure
    #[error("I/O error: {0}")]
    Io(String),
}

impl DatabaseError {
    pub fn decode(entity: &str, detail: impl std::fmt::Display) -> Self {
        DatabaseError::Decode(format!("{}: {}", entity, detail))
    }

    /// True if this is a unique violation on the idempotency index
    pub fn is_idempotency_conflict(&self) -> bool {
        match self {
            DatabaseError::DuplicateEntry {
                constraint: Some(name),
                ..
            } => name == IDEMPOTENCY_INDEX,
            _ => false,
        }
    }

    /// Checks if a retry of the whole unit of work may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConnectionFailed(_)
                | DatabaseError::PoolExhausted
                | DatabaseError::SerializationFailure(_)
                | DatabaseError::Io(_)
        )
    }
}

/// Maps SQLx errors to DatabaseError variants by PostgreSQL error code
///
/// See <https://www.postgresql.org/docs/current/errcodes-appendix.html>
impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => DatabaseError::PoolExhausted,
            sqlx::Error::Io(io) => DatabaseError::Io(io.to_string()),
            sqlx::Error::Tls(tls) => DatabaseError::ConnectionFailed(tls.to_string()),
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.code().as_deref() {
                    Some("23505") => DatabaseError::DuplicateEntry {
                        constraint: db_err.constraint().map(str::to_string),
                        message,
                    },
                    Some("23503") => DatabaseError::ForeignKeyViolation(message),
                    Some("23514") => DatabaseError::ConstraintViolation(message),
                    Some("40001") | Some("40P01") => DatabaseError::SerializationFailure(message),
                    Some(code) if code.starts_with("08") => {
                        DatabaseError::ConnectionFailed(message)
                    }
                    _ => DatabaseError::QueryFailed(message),
                }
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                DatabaseError::Decode(error.to_string())
            }
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        DatabaseError::MigrationFailed(error.to_string())
    }
}

impl From<DatabaseError> for StoreError {
    fn from(error: DatabaseError) -> Self {
        if error.is_transient() {
            return StoreError::Transient(error.to_string());
        }
        match error {
            DatabaseError::DuplicateEntry { .. }
            | DatabaseError::ForeignKeyViolation(_)
            | DatabaseError::ConstraintViolation(_) => StoreError::Conflict(error.to_string()),
            other => StoreError::Backend(other.to_string()),
        }
    }
}
