use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Timestamp out of range: {0}")]
    InvalidTimestamp(i64),
}
