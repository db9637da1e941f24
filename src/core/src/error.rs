//! Error types shared by the data model and ingestion boundary

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for dataset handling
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid input/state
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// CSV decoding errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Create an invalid input error
    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        CoreError::InvalidInput(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::invalid("unknown column 'team'");
        assert_eq!(err.to_string(), "Invalid input: unknown column 'team'");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CoreError = io.into();
        assert!(matches!(err, CoreError::Io(_)));
    }
}
