use sea_orm::{DbErr, SqlErr};

/// Error type for storage operations, classified at the store boundary.
///
/// Duplicate-key violations are the only failure callers branch on; they are
/// detected through SeaORM's engine-neutral [`SqlErr`] so no database error
/// codes leak into the services.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A unique constraint rejected the write.
    #[error("duplicate key violates a unique constraint")]
    DuplicateKey,
    /// Any other storage failure.
    #[error("storage operation failed")]
    Other(#[source] DbErr),
}

impl From<DbErr> for StorageError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => StorageError::DuplicateKey,
            _ => StorageError::Other(err),
        }
    }
}
