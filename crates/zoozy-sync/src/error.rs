use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid sync payload: {0}")]
    InvalidInput(String),
    #[error("sync cancelled")]
    Cancelled,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Error, PartialEq)]
pub enum RatingError {
    #[error("rating must be a finite number")]
    NotFinite,
    #[error("rating {0} is outside 0.00..=9.99")]
    OutOfRange(f64),
}
