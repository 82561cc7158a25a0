// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Coordinator error: {0}")]
    Coordinator(#[from] crate::domain::CoordinatorError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CoordinatorError;

    #[test]
    fn test_coordinator_error_converts() {
        fn fails() -> Result<()> {
            Err(CoordinatorError::NoRuntime)?
        }

        let err = fails().unwrap_err();
        assert!(matches!(err, AppError::Coordinator(CoordinatorError::NoRuntime)));
        assert_eq!(
            err.to_string(),
            "Coordinator error: Coordinator requires a tokio runtime"
        );
    }
}
