/// Errors raised by core domain conversions.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}
