use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("payload must be {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
    #[error("value {index} is not a finite number")]
    NonFinite { index: usize },
    #[error("invalid hex payload: {0}")]
    InvalidHex(String),
}
