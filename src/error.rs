use thiserror::Error;

#[derive(Error, Debug)]
pub enum SegmentError {
    #[error("Invalid input image: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to decode scan: {0}")]
    Decode(String),

    #[error("Failed to encode card: {0}")]
    Encode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SegmentError {
    /// Stable machine-readable code, used in batch reports
    pub fn code(&self) -> &'static str {
        match self {
            SegmentError::InvalidInput(_) => "INVALID_INPUT",
            SegmentError::InvalidConfig(_) => "INVALID_CONFIG",
            SegmentError::Decode(_) => "DECODE_ERROR",
            SegmentError::Encode(_) => "ENCODE_ERROR",
            SegmentError::Io(_) => "IO_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, SegmentError>;
