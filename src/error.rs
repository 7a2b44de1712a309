use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error(transparent)]
    PoolError(#[from] r2d2::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("unique with more than one element")]
    NotUnique,

    #[error("result is empty")]
    EmptyResult,

    #[error("result has more than one row")]
    MoreThanOneRow,

    #[error("No rows inserted!")]
    NoRowsInserted,

    #[error("No Auto Generated Keys in Result Set!")]
    NoGeneratedKeys,

    #[error("chunkSize must be >=1, got {0}")]
    InvalidChunkSize(usize),

    #[error("unrecognized batch return code {0}")]
    UnrecognizedBatchCode(i64),

    #[error("a batch command failed but an sql exception was not raised by the driver!")]
    BatchFailedWithoutError,

    #[error(
        "batch update or delete attempted while auto commit is true; run it with transact instead"
    )]
    BatchMutationInAutocommit,

    #[error("{source}; rollback also failed: {rollback}")]
    RollbackFailed {
        source: Box<DbError>,
        rollback: Box<DbError>,
    },

    #[error("task was cancelled before completion")]
    Cancelled,

    #[error("Other database error: {0}")]
    Other(String),
}

impl DbError {
    /// True for failures raised by this crate itself because a cardinality or driver contract
    /// was broken, as opposed to errors reported by the backend or the pool.
    #[must_use]
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            DbError::NotUnique
                | DbError::EmptyResult
                | DbError::MoreThanOneRow
                | DbError::NoRowsInserted
                | DbError::NoGeneratedKeys
                | DbError::InvalidChunkSize(_)
                | DbError::UnrecognizedBatchCode(_)
                | DbError::BatchFailedWithoutError
                | DbError::BatchMutationInAutocommit
        )
    }

    /// The error that caused the failure, looking through a failed rollback.
    #[must_use]
    pub fn primary(&self) -> &DbError {
        match self {
            DbError::RollbackFailed { source, .. } => source.primary(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, DbError>;
