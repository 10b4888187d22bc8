/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("No item {time_ordered_id} in partition {partition_key}")]
    NotFound {
        partition_key: String,
        time_ordered_id: String,
    },

    #[error("Stored row is corrupt: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
