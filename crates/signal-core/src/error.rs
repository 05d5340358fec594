use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignalError {
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Calculation error: {0}")]
    Calculation(String),

    #[error("Fetch error: {0}")]
    Fetch(String),
}
