//! Error codes shared by every error enum in the engine.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use scene::SceneError;

/// Grepable error code and retryable flag for structured error reporting.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

impl ErrorCode for SceneError {
    fn error_code(&self) -> &'static str {
        SceneError::error_code(self)
    }
}
